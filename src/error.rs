//! Error types for codec and script decoding

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("base58 decode failed: {0}")]
    Base58Decode(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("script truncated at offset {0}")]
    TruncatedScript(usize),

    #[error("opcode {0:#04x} may not appear in a script")]
    ForbiddenOpcode(u8),

    #[error("invalid compact target: {0}")]
    InvalidTarget(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
