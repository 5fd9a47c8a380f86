// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/job/header.rs
// Version: 1.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file assembles the 80-byte block header and the full serialized block
// submitted to the node, located in the job subdirectory.
//
// Tree Location:
// - src/job/header.rs (header and block serialization)
// - Depends on: crate::core::codec, hex

use crate::core::codec::encode_varint;

pub const HEADER_SIZE: usize = 80;

/// version ∥ prev hash ∥ merkle root ∥ time ∥ bits ∥ nonce.
///
/// Hashes are in internal byte order; numeric fields little-endian.
pub fn build_header(
    version: u32,
    prev_hash: &[u8; 32],
    merkle_root: &[u8; 32],
    ntime: u32,
    bits: u32,
    nonce: u32,
) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&version.to_le_bytes());
    header[4..36].copy_from_slice(prev_hash);
    header[36..68].copy_from_slice(merkle_root);
    header[68..72].copy_from_slice(&ntime.to_le_bytes());
    header[72..76].copy_from_slice(&bits.to_le_bytes());
    header[76..80].copy_from_slice(&nonce.to_le_bytes());
    header
}

/// Hex block for `submitblock`: header, tx count, coinbase, template transactions.
pub fn serialize_block(header: &[u8; HEADER_SIZE], coinbase: &[u8], transactions: &[String]) -> String {
    let tx_count = transactions.len() as u64 + 1;
    let capacity = (HEADER_SIZE + 9 + coinbase.len()) * 2
        + transactions.iter().map(String::len).sum::<usize>();
    let mut block = String::with_capacity(capacity);
    block.push_str(&hex::encode(header));
    block.push_str(&hex::encode(encode_varint(tx_count)));
    block.push_str(&hex::encode(coinbase));
    for tx in transactions {
        block.push_str(tx);
    }
    block
}


// Changelog:
// - v1.0.0 (2026-10-17): Initial header assembly and block serialization.
