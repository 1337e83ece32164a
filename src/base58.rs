//! Base-58 codec
//!
//! Treats a byte string as a single big-endian unsigned integer and
//! converts it to and from the 58-symbol alphabet. Leading zero bytes are
//! not given any special treatment at this layer; mapping them to leading
//! '1' characters is the responsibility of the Base58Check layer.

use crate::error::{LedgerError, Result};
use crate::types::*;
use num_bigint::BigUint;
use num_traits::Zero;

/// The 58 symbols, in value order. '0', 'O', 'I', and 'l' are excluded.
pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

// Symbol values indexed by (char - '1'); -1 marks characters outside the
// alphabet. Covers the range '1' through 'z'.
const DECODE_MAP: [i8; 74] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8,                              // '1' - '9'
    -1, -1, -1, -1, -1, -1, -1,                             // ':' - '@'
    9, 10, 11, 12, 13, 14, 15, 16,                          // 'A' - 'H'
    -1,                                                     // 'I'
    17, 18, 19, 20, 21,                                     // 'J' - 'N'
    -1,                                                     // 'O'
    22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32,             // 'P' - 'Z'
    -1, -1, -1, -1, -1, -1,                                 // '[' - '`'
    33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43,             // 'a' - 'k'
    -1,                                                     // 'l'
    44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, // 'm' - 'z'
];

fn digit_value(c: char) -> Option<u8> {
    let index = (c as i32) - ('1' as i32);
    if index < 0 || index >= DECODE_MAP.len() as i32 {
        return None;
    }
    match DECODE_MAP[index as usize] {
        -1 => None,
        d => Some(d as u8),
    }
}

/// Encode a byte string interpreted as a big-endian unsigned integer.
///
/// An empty input yields an empty string. A non-empty input of all zero
/// bytes encodes the integer zero, which yields "1".
pub fn encode(input: &[u8]) -> String {
    if input.is_empty() {
        return String::new();
    }

    let value = BigUint::from_bytes_be(input);
    let digits = value.to_radix_be(58);
    digits.iter().map(|&d| ALPHABET[d as usize] as char).collect()
}

/// Decode a base-58 string into the minimal big-endian byte form of the
/// integer it represents.
///
/// An empty input decodes to an empty byte string. Any character outside
/// the alphabet is an error.
pub fn decode(input: &str) -> Result<ByteString> {
    if input.is_empty() {
        return Ok(ByteString::new());
    }

    let mut digits = Vec::with_capacity(input.len());
    for c in input.chars() {
        let d = digit_value(c)
            .ok_or_else(|| LedgerError::Base58Decode(format!("invalid character {:?}", c)))?;
        digits.push(d);
    }

    let value = BigUint::from_radix_be(&digits, 58)
        .ok_or_else(|| LedgerError::Base58Decode("radix conversion failed".to_string()))?;

    if value.is_zero() {
        Ok(ByteString::new())
    } else {
        Ok(value.to_bytes_be())
    }
}
