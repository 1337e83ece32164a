//! Private and public key value types
//!
//! Both types follow the validity-flag convention: malformed input produces
//! a constructible object with `valid() == false` rather than an error, and
//! callers are expected to check the flag before using derived values.

use crate::base58check;
use crate::constants::*;
use crate::crypto;
use crate::types::*;

/// A 256-bit private key scalar.
///
/// Valid keys lie in the open range (0, secp256k1 group order). The
/// `compressed` flag records whether the derived public key should use the
/// compressed SEC1 form; it is set when parsing a WIF string with the
/// trailing compression marker and may be changed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    value: [u8; PRIVATE_KEY_SIZE],
    compressed: bool,
    valid: bool,
}

impl PrivateKey {
    /// Construct from raw scalar bytes. Any length other than 32 bytes, a
    /// zero value, or a value at or beyond the group order is invalid.
    pub fn from_bytes(bytes: &[u8]) -> PrivateKey {
        let mut key = PrivateKey {
            value: [0; PRIVATE_KEY_SIZE],
            compressed: false,
            valid: false,
        };

        if bytes.len() != PRIVATE_KEY_SIZE {
            return key;
        }

        key.value.copy_from_slice(bytes);
        key.valid = range_is_valid(&key.value);
        key
    }

    /// Construct from a text form: WIF, or the 30-character mini-key
    /// format.
    ///
    /// A mini key is exactly 30 characters, starts with 'S', and must
    /// satisfy the checksum SHA256(s ++ "?")[0] == 0; the key value is
    /// SHA256 of the string itself. Everything else is treated as WIF: a
    /// Base58Check string whose payload is the 32 scalar bytes, optionally
    /// followed by 0x01 to mark a compressed key. The version byte is
    /// discarded.
    pub fn from_text(s: &str) -> PrivateKey {
        let mut key = PrivateKey {
            value: [0; PRIVATE_KEY_SIZE],
            compressed: false,
            valid: false,
        };

        if s.len() == MINI_KEY_SIZE {
            if !s.starts_with('S') {
                return key;
            }
            let mut appended = String::from(s);
            appended.push('?');
            let check = crypto::sha256(appended.as_bytes());
            if check[0] != 0 {
                return key;
            }
            key.value = crypto::sha256(s.as_bytes());
        } else {
            let decoded = match base58check::decode(s) {
                Ok((payload, _version)) => payload,
                Err(_) => return key,
            };

            if decoded.len() == PRIVATE_KEY_SIZE + 1 && decoded[PRIVATE_KEY_SIZE] == WIF_COMPRESSED_FLAG {
                key.compressed = true;
                key.value.copy_from_slice(&decoded[..PRIVATE_KEY_SIZE]);
            } else if decoded.len() == PRIVATE_KEY_SIZE {
                key.value.copy_from_slice(&decoded);
            } else {
                return key;
            }
        }

        key.valid = range_is_valid(&key.value);
        key
    }

    /// Returns the raw scalar bytes
    pub fn value(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.value
    }

    /// Returns true if the derived public key uses the compressed form
    pub fn compressed(&self) -> bool {
        self.compressed
    }

    /// Marks the key as deriving a compressed or uncompressed public key
    pub fn set_compressed(&mut self, yes: bool) {
        self.compressed = yes;
    }

    /// Returns true if the key is in the valid scalar range
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Returns the WIF form under the given version byte, with the
    /// compression marker appended when applicable. Empty for an invalid
    /// key.
    pub fn to_wif(&self, version: u8) -> String {
        if !self.valid {
            return String::new();
        }

        if self.compressed {
            let mut extended = self.value.to_vec();
            extended.push(WIF_COMPRESSED_FLAG);
            base58check::encode(&extended, version)
        } else {
            base58check::encode(&self.value, version)
        }
    }

    /// Returns the scalar as a hex string. Empty for an invalid key.
    pub fn to_hex(&self) -> String {
        if !self.valid {
            return String::new();
        }
        hex::encode(self.value)
    }
}

// Big-endian byte arrays of equal length compare like the integers they
// represent, so the range check needs no bignum arithmetic.
fn range_is_valid(value: &[u8; PRIVATE_KEY_SIZE]) -> bool {
    if value.iter().all(|&b| b == 0) {
        return false;
    }
    *value <= MAX_PRIVATE_KEY
}

/// A SEC1 public key.
///
/// Either 33 bytes with a 02/03 leading byte (compressed) or 65 bytes with
/// an 04 leading byte (uncompressed). Validity requires the bytes to name a
/// point on the curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    value: ByteString,
    compressed: bool,
    valid: bool,
}

impl PublicKey {
    /// Construct from raw SEC1 bytes. The bytes are retained even when they
    /// do not form a valid curve point.
    pub fn from_bytes(bytes: &[u8]) -> PublicKey {
        PublicKey {
            value: bytes.to_vec(),
            compressed: !bytes.is_empty() && bytes[0] != 0x04,
            valid: crypto::public_key_is_valid(bytes),
        }
    }

    /// Derive the public key for a private key. The result uses the
    /// compressed or uncompressed form according to the private key's flag.
    /// An invalid private key yields an invalid, empty public key.
    pub fn from_private_key(key: &PrivateKey) -> PublicKey {
        if !key.valid() {
            return PublicKey {
                value: ByteString::new(),
                compressed: false,
                valid: false,
            };
        }

        match crypto::derive_public_key(key.value(), key.compressed()) {
            Ok(value) => {
                let compressed = !value.is_empty() && value[0] != 0x04;
                PublicKey {
                    value,
                    compressed,
                    valid: true,
                }
            }
            Err(_) => PublicKey {
                value: ByteString::new(),
                compressed: false,
                valid: false,
            },
        }
    }

    /// Returns the raw SEC1 bytes
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns true if the key is in compressed form
    pub fn compressed(&self) -> bool {
        self.compressed
    }

    /// Returns true if the bytes name a point on the curve
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Returns the key as a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }
}
