//! Pay-to-pubkey-hash address value type

use crate::base58check;
use crate::constants::ADDRESS_SIZE;
use crate::crypto;
use crate::keys::{PrivateKey, PublicKey};

/// A 20-byte address digest: RIPEMD160(SHA256(public key)).
///
/// Follows the validity-flag convention; text or byte input of the wrong
/// shape yields `valid() == false` rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    value: [u8; ADDRESS_SIZE],
    valid: bool,
}

impl Address {
    /// Construct from a raw 20-byte digest
    pub fn from_bytes(bytes: &[u8]) -> Address {
        let mut address = Address {
            value: [0; ADDRESS_SIZE],
            valid: false,
        };

        if bytes.len() != ADDRESS_SIZE {
            return address;
        }

        address.value.copy_from_slice(bytes);
        address.valid = true;
        address
    }

    /// Construct from a Base58Check string. The payload must be exactly the
    /// digest size; the version byte is discarded.
    pub fn from_text(s: &str) -> Address {
        match base58check::decode(s) {
            Ok((payload, _version)) => Address::from_bytes(&payload),
            Err(_) => Address {
                value: [0; ADDRESS_SIZE],
                valid: false,
            },
        }
    }

    /// Construct by hashing a public key's bytes.
    ///
    /// The bytes are hashed as supplied; the key's own validity flag is not
    /// consulted, so an address can be formed for any byte pattern.
    pub fn from_public_key(key: &PublicKey) -> Address {
        Address {
            value: crypto::hash160(key.value()),
            valid: true,
        }
    }

    /// Construct from a private key by deriving its public key first
    pub fn from_private_key(key: &PrivateKey) -> Address {
        Address::from_public_key(&PublicKey::from_private_key(key))
    }

    /// Returns the raw digest
    pub fn value(&self) -> &[u8; ADDRESS_SIZE] {
        &self.value
    }

    /// Returns true if the address holds a well-formed digest
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Returns the Base58Check text form under the given network version
    /// byte. Empty for an invalid address.
    pub fn to_string(&self, network: u8) -> String {
        if !self.valid {
            return String::new();
        }
        base58check::encode(&self.value, network)
    }
}
