//! Proof-of-work target arithmetic
//!
//! A target exists in two forms: a 256-bit big-endian hash-space value and
//! a packed 32-bit compact form. The compact layout is
//! `eeeeeeee smmmmmmm mmmmmmmm mmmmmmmm`: the top byte is the exponent
//! `e`, bit 23 is a sign bit that must be clear, and the low 23 bits are
//! the mantissa `m`. The represented value is `m * 256^(e-3)`.

use crate::constants::{DIFFICULTY_1_COMPACT, TARGET_ZERO_COMPACT};
use crate::error::{LedgerError, Result};
use crate::types::Hash;
use serde::{Deserialize, Serialize};

const MANTISSA_MASK: u32 = 0x007f_ffff;
const SIGN_BIT: u32 = 0x0080_0000;
const EXPONENT_OFFSET: u32 = 24;

fn mantissa_of(compact: u32) -> u32 {
    compact & MANTISSA_MASK
}

fn exponent_of(compact: u32) -> i32 {
    ((compact >> EXPONENT_OFFSET) & 0xff) as i32
}

/// A difficulty target held in both forms at once.
///
/// The two fields stay consistent: each constructor computes one form from
/// the other, so `hash` is always the materialization of `compact` up to
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    hash: Hash,
    compact: u32,
}

impl Target {
    /// Construct from the compact form.
    ///
    /// Fails when the sign bit is set or the exponent would place mantissa
    /// bytes outside the 256-bit range. Compact values below the zero
    /// target's canonical encoding are floored to it.
    pub fn from_compact(compact: u32) -> Result<Target> {
        let hash = expand_target(compact)?;
        Ok(Target {
            hash,
            compact: compact.max(TARGET_ZERO_COMPACT),
        })
    }

    /// Construct from the hash form
    pub fn from_hash(hash: Hash) -> Target {
        Target {
            compact: compress_target(&hash),
            hash,
        }
    }

    /// Returns the 256-bit big-endian form
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Returns the compact form
    pub fn compact(&self) -> u32 {
        self.compact
    }

    /// Ratio of the difficulty-1 target to this target
    pub fn difficulty(&self) -> f64 {
        to_double(DIFFICULTY_1_COMPACT) / to_double(self.compact)
    }
}

/// Materialize a compact target into its 256-bit big-endian form.
///
/// A mantissa whose top byte is zero is renormalized one step before
/// placement. Exponents of 2 or less drop the mantissa bytes that would
/// fall below the least significant position.
pub fn expand_target(compact: u32) -> Result<Hash> {
    if compact & SIGN_BIT != 0 {
        return Err(LedgerError::InvalidTarget(format!(
            "sign bit set in {:#010x}",
            compact
        )));
    }

    let mut mantissa = mantissa_of(compact);
    let mut exponent = exponent_of(compact);

    if mantissa & 0x00ff_0000 == 0 {
        mantissa <<= 8;
        exponent -= 1;
    }

    if exponent > 32 {
        return Err(LedgerError::InvalidTarget(format!(
            "exponent {} exceeds the hash width",
            exponent
        )));
    }

    let mut out: Hash = [0; 32];
    if mantissa == 0 || exponent < 1 {
        return Ok(out);
    }

    let exponent = exponent as usize;
    if exponent >= 3 {
        out[32 - exponent] = (mantissa >> 16) as u8;
        out[33 - exponent] = (mantissa >> 8) as u8;
        out[34 - exponent] = mantissa as u8;
    } else {
        out[32 - exponent] = (mantissa >> 16) as u8;
        if exponent >= 2 {
            out[33 - exponent] = (mantissa >> 8) as u8;
        }
    }

    Ok(out)
}

/// Pack a 256-bit big-endian value into its canonical compact form.
///
/// The exponent counts the significant bytes; a mantissa at or above the
/// sign bit is shifted down one byte so the packed form stays positive.
pub fn compress_target(hash: &Hash) -> u32 {
    let zeros = hash.iter().take_while(|&&b| b == 0).count();
    if zeros == hash.len() {
        return TARGET_ZERO_COMPACT;
    }

    let byte_at = |i: usize| -> u32 {
        if i < hash.len() {
            hash[i] as u32
        } else {
            0
        }
    };

    let mut mantissa = (byte_at(zeros) << 16) | (byte_at(zeros + 1) << 8) | byte_at(zeros + 2);
    let mut exponent = (hash.len() - zeros) as u32;

    if mantissa & SIGN_BIT != 0 {
        mantissa >>= 8;
        exponent += 1;
    }

    (exponent << EXPONENT_OFFSET) | mantissa
}

fn to_double(compact: u32) -> f64 {
    let mantissa = mantissa_of(compact) as f64;
    let exponent = exponent_of(compact) - 3;
    mantissa * 256f64.powi(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_difficulty_1() {
        let hash = expand_target(DIFFICULTY_1_COMPACT).unwrap();
        let mut expected = [0u8; 32];
        expected[4] = 0xff;
        expected[5] = 0xff;
        assert_eq!(hash, expected);
    }

    #[test]
    fn test_compress_difficulty_1() {
        let mut hash = [0u8; 32];
        hash[4] = 0xff;
        hash[5] = 0xff;
        assert_eq!(compress_target(&hash), DIFFICULTY_1_COMPACT);
    }

    #[test]
    fn test_expand_rejects_sign_bit() {
        assert!(expand_target(0x1d80_0000).is_err());
    }

    #[test]
    fn test_zero_mantissa_expands_to_zero() {
        assert_eq!(expand_target(0x1d00_0000).unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_zero_hash_compresses_to_floor() {
        assert_eq!(compress_target(&[0u8; 32]), TARGET_ZERO_COMPACT);
    }

    #[test]
    fn test_compress_renormalizes_high_mantissa() {
        // A leading byte of 0x80 or more would collide with the sign bit
        let mut hash = [0u8; 32];
        hash[4] = 0x80;
        assert_eq!(compress_target(&hash), 0x1d00_8000);
    }

    #[test]
    fn test_round_trip_full_mantissa_range() {
        // Exponents that keep all three mantissa bytes inside the hash
        for exponent in 3u32..=0x1d {
            for &mantissa in &[0x010000u32, 0x123456, 0x7fffff] {
                let compact = (exponent << 24) | mantissa;
                let hash = expand_target(compact).unwrap();
                assert_eq!(compress_target(&hash), compact, "compact {:#010x}", compact);
            }
        }
    }

    #[test]
    fn test_round_trip_small_exponents() {
        // Exponents 1 and 2 truncate low mantissa bytes, so only mantissas
        // with zero low bytes survive the trip
        for &compact in &[0x0101_0000u32, 0x017f_0000, 0x027f_ff00] {
            let hash = expand_target(compact).unwrap();
            assert_eq!(compress_target(&hash), compact, "compact {:#010x}", compact);
        }
    }

    #[test]
    fn test_difficulty_of_difficulty_1_is_one() {
        let target = Target::from_compact(DIFFICULTY_1_COMPACT).unwrap();
        assert_eq!(target.difficulty(), 1.0);
    }

    #[test]
    fn test_difficulty_increases_as_target_shrinks() {
        let easy = Target::from_compact(DIFFICULTY_1_COMPACT).unwrap();
        let hard = Target::from_compact(0x1b0404cb).unwrap();
        assert!(hard.difficulty() > easy.difficulty());
    }

    #[test]
    fn test_known_difficulty_value() {
        // Historical block 100,800 difficulty for nBits 0x1b0404cb
        let target = Target::from_compact(0x1b0404cb).unwrap();
        let difficulty = target.difficulty();
        assert!((difficulty - 16307.42).abs() / 16307.42 < 1e-4);
    }

    #[test]
    fn test_from_compact_floors_to_zero_target() {
        let target = Target::from_compact(0x0000_0000).unwrap();
        assert_eq!(target.compact(), TARGET_ZERO_COMPACT);
        assert_eq!(target.hash(), &[0u8; 32]);
    }

    #[test]
    fn test_from_hash_matches_from_compact() {
        let target = Target::from_compact(0x1c7fff00).unwrap();
        let rebuilt = Target::from_hash(*target.hash());
        assert_eq!(rebuilt.compact(), 0x1c7fff00);
        assert_eq!(rebuilt.hash(), target.hash());
    }
}
