// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/difficulty.rs
// Version: 2.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file contains the difficulty arithmetic for share and block
// validation, located in the core subdirectory. It converts compact `nbits`
// to targets and difficulties, maps pool difficulty to the number of leading
// zero bits a share must carry, and measures submitted hashes.

use log::{debug, warn};
use uint::construct_uint;

const LOG_TARGET: &str = "solo_pool::core::difficulty";

construct_uint! {
    pub struct U256(4);
}

/// Difficulty-1 target, 0x00000000ffff0000...
const MAX_TARGET: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub fn max_target() -> U256 {
    U256::from_big_endian(&MAX_TARGET)
}

pub fn parse_bits(bits_hex: &str) -> Option<u32> {
    u32::from_str_radix(bits_hex, 16).ok()
}

pub fn bits_to_target(bits: u32) -> U256 {
    let exponent = ((bits >> 24) & 0xFF) as i32;
    let mantissa = bits & 0x00FFFFFF;
    if exponent <= 0 || mantissa == 0 {
        warn!(target: LOG_TARGET, "Invalid nbits: {:08x}, returning zero target", bits);
        return U256::zero();
    }
    let shift = exponent - 3;
    let target = U256::from(mantissa);
    let result = if shift >= 0 {
        if shift >= 32 {
            warn!(target: LOG_TARGET, "nbits {:08x} overflows 256 bits", bits);
            return U256::MAX;
        }
        target << (shift * 8) as usize
    } else {
        target >> ((-shift) * 8) as usize
    };
    debug!(target: LOG_TARGET, "nbits={:08x} -> target={:064x}", bits, result);
    result
}

/// Network difficulty of a compact target, relative to the difficulty-1 target.
pub fn bits_to_difficulty(bits: u32) -> f64 {
    let exponent = ((bits >> 24) & 0xFF) as i32;
    let mantissa = (bits & 0x00FFFFFF) as f64;
    if mantissa == 0.0 {
        warn!(target: LOG_TARGET, "Invalid nbits: {:08x}, zero mantissa", bits);
        return 0.0;
    }
    (0xFFFF as f64 / mantissa) * 256f64.powi(0x1d - exponent)
}

/// Leading zero bits a share needs at pool difficulty `difficulty`.
pub fn difficulty_to_zero_bits(difficulty: f64) -> u32 {
    if difficulty <= 0.0 || !difficulty.is_finite() {
        return 32;
    }
    (32.0 + difficulty.log2()).ceil().clamp(0.0, 256.0) as u32
}

pub fn zero_bits_to_difficulty(zero_bits: u32) -> f64 {
    2f64.powi(zero_bits as i32 - 32)
}

/// Counts leading zero bits, most significant byte first.
pub fn count_leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut zeros = 0;
    for &byte in bytes {
        if byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}

/// Difficulty achieved by a header hash given in display (big-endian) order.
pub fn hash_difficulty(display_hash: &[u8; 32]) -> f64 {
    let hash_value = U256::from_big_endian(display_hash);
    if hash_value.is_zero() {
        warn!(target: LOG_TARGET, "Hash is all zeros");
        return f64::MAX;
    }
    u256_to_f64(max_target()) / u256_to_f64(hash_value)
}

/// True when a display-order hash is at or below `target`.
pub fn hash_meets_target(display_hash: &[u8; 32], target: U256) -> bool {
    let hash_value = U256::from_big_endian(display_hash);
    debug!(target: LOG_TARGET,
        "Hash check: hash={:064x}, target={:064x}",
        hash_value, target
    );
    hash_value <= target
}

fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}


// Changelog:
// - v2.0.0 (2026-10-17): Reworked for pool-side share validation.
//   - Added zero-bit conversions, bits_to_difficulty and hash_difficulty.
//   - Removed the miner-side SHA3x target parsing.
// - v1.2.10 (2025-06-19): Fixed SHA-256 target calculation for share validation.
