// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/codec.rs
// Version: 1.1.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file holds the byte-level helpers shared by the job builder and the
// share validator, located in the core subdirectory: double SHA-256, byte
// reversal between display and internal order, the stratum prevhash word
// swap, BIP34 height pushes and Bitcoin varints.
//
// Tree Location:
// - src/core/codec.rs (hashing and encoding helpers)
// - Depends on: sha2, hex

use crate::core::error::PoolError;
use sha2::{Digest, Sha256};

/// Double SHA-256, used for txids, merkle nodes and block headers.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

pub fn reverse32(mut hash: [u8; 32]) -> [u8; 32] {
    hash.reverse();
    hash
}

/// Parses a display-order (RPC) hash into internal byte order.
pub fn hash_from_display_hex(display: &str) -> Result<[u8; 32], PoolError> {
    let bytes = hex::decode(display)
        .map_err(|e| PoolError::Template(format!("bad hash hex {display:?}: {e}")))?;
    let mut hash: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| PoolError::Template(format!("hash is {} bytes, expected 32", b.len())))?;
    hash.reverse();
    Ok(hash)
}

pub fn hash_to_display_hex(internal: &[u8; 32]) -> String {
    hex::encode(reverse32(*internal))
}

/// Reverses the order of the 8-character words of a hex string.
///
/// Applied to a display-order hash this yields the stratum prevhash form:
/// internal byte order with each 4-byte word byte-swapped.
pub fn swap_words(hex_str: &str) -> String {
    let chunks: Vec<&str> = hex_str
        .as_bytes()
        .chunks(8)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect();
    chunks.into_iter().rev().collect()
}

/// Parses a stratum 32-bit field sent as 8 big-endian hex characters.
pub fn parse_u32_hex(hex_str: &str) -> Option<u32> {
    if hex_str.len() != 8 {
        return None;
    }
    u32::from_str_radix(hex_str, 16).ok()
}

/// BIP34 height push for the coinbase script-sig.
///
/// Heights up to 16 are a single `0x50 + height` opcode; larger heights are
/// a length-prefixed minimal little-endian number, padded with a zero byte
/// when the top bit would otherwise read as a sign.
pub fn encode_height(height: u64) -> Vec<u8> {
    if height <= 16 {
        return vec![0x50 + height as u8];
    }
    let mut num = Vec::with_capacity(8);
    let mut h = height;
    while h > 0 {
        num.push((h & 0xff) as u8);
        h >>= 8;
    }
    if num.last().is_some_and(|b| b & 0x80 != 0) {
        num.push(0x00);
    }
    let mut push = Vec::with_capacity(num.len() + 1);
    push.push(num.len() as u8);
    push.extend_from_slice(&num);
    push
}

/// Bitcoin CompactSize encoding.
pub fn encode_varint(n: u64) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => {
            let mut v = vec![0xfd];
            v.extend_from_slice(&(n as u16).to_le_bytes());
            v
        }
        0x1_0000..=0xffff_ffff => {
            let mut v = vec![0xfe];
            v.extend_from_slice(&(n as u32).to_le_bytes());
            v
        }
        _ => {
            let mut v = vec![0xff];
            v.extend_from_slice(&n.to_le_bytes());
            v
        }
    }
}


// Changelog:
// - v1.1.0 (2026-10-17): Added word swap, height push and varint helpers.
// - v1.0.0 (2026-10-17): Reworked from the sha256d header hasher into shared codec helpers.
