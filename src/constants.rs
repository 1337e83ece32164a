//! Ledger and codec constants

/// Size of a raw private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a compressed SEC1 public key in bytes
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Size of an uncompressed SEC1 public key in bytes
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;

/// Size of an address digest (RIPEMD160 output) in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Trailing byte appended to a WIF payload for a compressed key
pub const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// Length of a private key in mini-key format, including the 'S' prefix
pub const MINI_KEY_SIZE: usize = 30;

/// Number of checksum bytes appended by Base58Check
pub const CHECKSUM_SIZE: usize = 4;

/// Version byte for a main-network address
pub const MAIN_NETWORK_ID: u8 = 0x00;

/// Version byte for a main-network private key in WIF
pub const PRIVATE_KEY_VERSION: u8 = 0x80;

/// Largest valid private key value: the secp256k1 group order minus one
pub const MAX_PRIVATE_KEY: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B,
    0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x40,
];

/// Compact form of the difficulty-1 target
pub const DIFFICULTY_1_COMPACT: u32 = 0x1d00ffff;

/// Compact form of the zero target
pub const TARGET_ZERO_COMPACT: u32 = 0x0100ffff;

/// Widest numeric operand the script engine accepts, in bytes
pub const MAX_NUMERIC_OPERAND_SIZE: usize = 4;

/// Deepest IF/NOTIF nesting the script engine allows
pub const MAX_CONDITIONAL_DEPTH: usize = 100;

/// Largest key count accepted by CHECKMULTISIG
pub const MAX_MULTISIG_KEYS: i64 = 20;
