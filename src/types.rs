//! Core value types shared across the crate

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// 160-bit digest, the output of RIPEMD-160
pub type Digest160 = [u8; 20];

/// Byte string type
pub type ByteString = Vec<u8>;
