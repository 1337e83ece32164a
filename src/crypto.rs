//! Hashing and elliptic-curve capabilities backing the codec and script layers

use crate::constants::*;
use crate::error::{LedgerError, Result};
use crate::types::*;
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// SHA-256 of a byte string
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA256(SHA256(x))
pub fn double_sha256(data: &[u8]) -> Hash {
    Sha256::digest(Sha256::digest(data)).into()
}

/// RIPEMD-160 of a byte string
pub fn ripemd160(data: &[u8]) -> Digest160 {
    Ripemd160::digest(data).into()
}

/// SHA-1 of a byte string
pub fn sha1(data: &[u8]) -> Digest160 {
    Sha1::digest(data).into()
}

/// RIPEMD160(SHA256(x)), the digest used for addresses
pub fn hash160(data: &[u8]) -> Digest160 {
    ripemd160(&sha256(data))
}

/// Check that a byte string is a well-formed SEC1 public key on the curve
pub fn public_key_is_valid(bytes: &[u8]) -> bool {
    PublicKey::from_slice(bytes).is_ok()
}

/// Derive the public key for a private key.
///
/// The result is in compressed (33-byte) or uncompressed (65-byte) SEC1
/// form depending on `compressed`.
pub fn derive_public_key(private_key: &[u8; PRIVATE_KEY_SIZE], compressed: bool) -> Result<ByteString> {
    let secret = SecretKey::from_slice(private_key)
        .map_err(|e| LedgerError::KeyDerivation(e.to_string()))?;
    let secp = Secp256k1::new();
    let public = PublicKey::from_secret_key(&secp, &secret);
    if compressed {
        Ok(public.serialize().to_vec())
    } else {
        Ok(public.serialize_uncompressed().to_vec())
    }
}

/// Verify a DER-encoded ECDSA signature over a 32-byte message hash.
///
/// Any malformed key, malformed signature, or verification failure is
/// reported as `false`.
pub fn verify_signature(message_hash: &Hash, pubkey_bytes: &[u8], signature_bytes: &[u8]) -> bool {
    let pubkey = match PublicKey::from_slice(pubkey_bytes) {
        Ok(pk) => pk,
        Err(_) => return false,
    };

    let signature = match Signature::from_der(signature_bytes) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let message = match Message::from_digest_slice(message_hash) {
        Ok(m) => m,
        Err(_) => return false,
    };

    let secp = Secp256k1::new();
    secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        let hash = sha256(b"");
        assert_eq!(
            hex::encode(hash),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_double_sha256() {
        let hash = double_sha256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn test_ripemd160() {
        let hash = ripemd160(b"");
        assert_eq!(hex::encode(hash), "9c1185a5c5e9fc54612808977ee8f548b2258d31");
    }

    #[test]
    fn test_sha1() {
        let hash = sha1(b"");
        assert_eq!(hex::encode(hash), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_hash160_length() {
        assert_eq!(hash160(b"abc").len(), 20);
    }

    #[test]
    fn test_public_key_is_valid_rejects_garbage() {
        assert!(!public_key_is_valid(&[0x00]));
        assert!(!public_key_is_valid(&[0x04; 65]));
        assert!(!public_key_is_valid(&[]));
    }

    #[test]
    fn test_derive_public_key_generator() {
        // Private key 1 maps to the curve generator point
        let mut key = [0u8; 32];
        key[31] = 1;
        let public = derive_public_key(&key, true).unwrap();
        assert_eq!(
            hex::encode(&public),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );

        let uncompressed = derive_public_key(&key, false).unwrap();
        assert_eq!(uncompressed.len(), 65);
        assert_eq!(uncompressed[0], 0x04);
        assert!(public_key_is_valid(&uncompressed));
    }

    #[test]
    fn test_derive_public_key_rejects_zero() {
        let key = [0u8; 32];
        assert!(derive_public_key(&key, true).is_err());
    }

    #[test]
    fn test_verify_signature_invalid_inputs() {
        let hash = sha256(b"message");
        assert!(!verify_signature(&hash, &[0x00], &[0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00]));

        let pubkey = hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
            .unwrap();
        assert!(!verify_signature(&hash, &pubkey, &[0x00]));
    }
}
