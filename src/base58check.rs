//! Base58Check codec
//!
//! Wraps the base-58 integer codec with a version byte, a truncated
//! double-SHA256 checksum, and the leading-zero-byte to leading-'1'
//! convention used by address and key text forms.

use crate::constants::CHECKSUM_SIZE;
use crate::crypto;
use crate::error::{LedgerError, Result};
use crate::types::*;
use crate::base58;

/// Encode a payload with the given version byte.
///
/// The encoded buffer is `[version] ++ payload ++ checksum`, where the
/// checksum is the first four bytes of SHA256(SHA256(version ++ payload)).
/// Each leading zero byte of that buffer appears as one literal '1' in the
/// output.
pub fn encode(payload: &[u8], version: u8) -> String {
    let mut work = ByteString::with_capacity(1 + payload.len() + CHECKSUM_SIZE);
    work.push(version);
    work.extend_from_slice(payload);

    let check = crypto::double_sha256(&work);
    work.extend_from_slice(&check[..CHECKSUM_SIZE]);

    let body = base58::encode(&work);

    let leading_zeros = work.iter().take_while(|&&b| b == 0).count();
    let mut output = String::with_capacity(leading_zeros + body.len());
    for _ in 0..leading_zeros {
        output.push('1');
    }
    output.push_str(&body);
    output
}

/// Decode a Base58Check string into its payload and version byte.
///
/// Fails with `InvalidFormat` when the decoded buffer cannot hold a version
/// byte, at least one payload byte, and the checksum; fails with
/// `ChecksumMismatch` when the trailing four bytes do not match.
pub fn decode(input: &str) -> Result<(ByteString, u8)> {
    let stripped = input.trim_start_matches('1');
    let leading_ones = input.len() - stripped.len();

    let body = base58::decode(stripped)?;

    let mut work = ByteString::with_capacity(leading_ones + body.len());
    work.resize(leading_ones, 0);
    work.extend_from_slice(&body);

    if work.len() < 1 + 1 + CHECKSUM_SIZE {
        return Err(LedgerError::InvalidFormat(format!(
            "decoded length {} is too short",
            work.len()
        )));
    }

    let split = work.len() - CHECKSUM_SIZE;
    let check = crypto::double_sha256(&work[..split]);
    if check[..CHECKSUM_SIZE] != work[split..] {
        return Err(LedgerError::ChecksumMismatch);
    }

    let version = work[0];
    let payload = work[1..split].to_vec();
    Ok((payload, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAIN_NETWORK_ID, PRIVATE_KEY_VERSION};

    #[test]
    fn test_encode_all_zero_payload() {
        assert_eq!(encode(&[0u8; 20], MAIN_NETWORK_ID), "1111111111111111111114oLvT2");
    }

    #[test]
    fn test_encode_all_ff_payload() {
        assert_eq!(
            encode(&[0xffu8; 20], MAIN_NETWORK_ID),
            "1QLbz7JHiBTspS962RLKV8GndWFwi5j6Qr"
        );
    }

    #[test]
    fn test_encode_known_address_payload() {
        let payload = hex::decode("010966776006953d5567439e5e39f86a0d273bee").unwrap();
        assert_eq!(
            encode(&payload, MAIN_NETWORK_ID),
            "16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM"
        );
    }

    #[test]
    fn test_encode_private_key_payload() {
        let mut payload = [0u8; 32];
        payload[31] = 1;
        assert_eq!(
            encode(&payload, PRIVATE_KEY_VERSION),
            "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf"
        );
    }

    #[test]
    fn test_decode_restores_payload_and_version() {
        let (payload, version) = decode("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM").unwrap();
        assert_eq!(version, MAIN_NETWORK_ID);
        assert_eq!(hex::encode(payload), "010966776006953d5567439e5e39f86a0d273bee");
    }

    #[test]
    fn test_decode_too_short() {
        // Progressively longer prefixes of a valid string; everything below
        // the minimum 6-byte decoded size is rejected as malformed
        for s in ["", "1", "11", "112", "112e", "112ed", "112edB", "112edB6"] {
            assert!(decode(s).is_err(), "expected rejection of {:?}", s);
        }
        assert!(decode("112edB6q").is_ok());
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        // Last character altered
        let result = decode("16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvN");
        assert_eq!(result, Err(LedgerError::ChecksumMismatch));
    }

    #[test]
    fn test_round_trip_all_versions() {
        let payload = [0x42u8; 7];
        for version in 0..=255u8 {
            let encoded = encode(&payload, version);
            let (decoded, v) = decode(&encoded).unwrap();
            assert_eq!(v, version);
            assert_eq!(decoded, payload);
        }
    }

    #[test]
    fn test_round_trip_leading_zeros() {
        let payload = [0x00, 0x00, 0x00, 0x9a, 0x00];
        let encoded = encode(&payload, 0);
        let (decoded, version) = decode(&encoded).unwrap();
        assert_eq!(version, 0);
        assert_eq!(decoded, payload);
    }
}
