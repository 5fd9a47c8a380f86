// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/job/builder.rs
// Version: 1.2.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file turns a block template into an immutable Job, located in the job
// subdirectory. A Job carries the two coinbase halves around the extranonce
// region and the merkle branch, and can rebuild the exact header a miner
// hashed from (extranonce1, extranonce2, ntime, nonce).
//
// Tree Location:
// - src/job/builder.rs (job construction)
// - Depends on: crate::core, crate::job::{merkle, header}

use crate::core::codec::{encode_height, encode_varint, hash_from_display_hex, sha256d};
use crate::core::difficulty::{U256, bits_to_difficulty, bits_to_target, parse_bits};
use crate::core::error::PoolError;
use crate::core::types::Template;
use crate::job::header::{HEADER_SIZE, build_header, serialize_block};
use crate::job::merkle::{merkle_branches, root_from_branches};
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};

const LOG_TARGET: &str = "solo_pool::job::builder";

pub const EXTRANONCE1_SIZE: usize = 4;
pub const EXTRANONCE2_SIZE: usize = 4;

/// Most branches advertised in `mining.notify`.
pub const MAX_NOTIFY_BRANCHES: usize = 20;

/// Miner-facing work derived from exactly one template
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,

    /// Monotonic build counter; a larger seq is always newer work
    pub seq: u64,

    pub height: u64,

    /// Display-order previous block hash
    pub prev_hash: String,
    prev_hash_internal: [u8; 32],

    /// Coinbase bytes before extranonce1
    pub coinbase1: Vec<u8>,

    /// Coinbase bytes after extranonce2
    pub coinbase2: Vec<u8>,

    /// Full sibling path of the coinbase, internal byte order
    pub merkle_branches: Vec<[u8; 32]>,

    pub version: u32,
    pub bits: u32,
    pub ntime: u32,
    pub coinbase_value: u64,
    pub network_target: U256,
    pub network_difficulty: f64,

    /// Raw transaction hex for block assembly
    transactions: Vec<String>,

    /// Set when this job starts a new tip
    pub clean: bool,
}

impl Job {
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Branch list sent to miners, capped at [`MAX_NOTIFY_BRANCHES`].
    pub fn advertised_branches(&self) -> &[[u8; 32]] {
        let len = self.merkle_branches.len().min(MAX_NOTIFY_BRANCHES);
        &self.merkle_branches[..len]
    }

    pub fn coinbase(&self, extranonce1: &[u8], extranonce2: &[u8]) -> Vec<u8> {
        let mut tx = Vec::with_capacity(
            self.coinbase1.len() + extranonce1.len() + extranonce2.len() + self.coinbase2.len(),
        );
        tx.extend_from_slice(&self.coinbase1);
        tx.extend_from_slice(extranonce1);
        tx.extend_from_slice(extranonce2);
        tx.extend_from_slice(&self.coinbase2);
        tx
    }

    /// Merkle root (internal order) for a given coinbase transaction.
    pub fn merkle_root(&self, coinbase: &[u8]) -> [u8; 32] {
        root_from_branches(sha256d(coinbase), &self.merkle_branches)
    }

    /// Rebuilds the header a miner hashed; returns it with the coinbase used.
    pub fn header(
        &self,
        extranonce1: &[u8],
        extranonce2: &[u8],
        ntime: u32,
        nonce: u32,
    ) -> ([u8; HEADER_SIZE], Vec<u8>) {
        let coinbase = self.coinbase(extranonce1, extranonce2);
        let root = self.merkle_root(&coinbase);
        let header = build_header(self.version, &self.prev_hash_internal, &root, ntime, self.bits, nonce);
        (header, coinbase)
    }

    pub fn block_hex(&self, header: &[u8; HEADER_SIZE], coinbase: &[u8]) -> String {
        serialize_block(header, coinbase, &self.transactions)
    }
}

/// Builds jobs for a fixed payout script and coinbase message
pub struct JobBuilder {
    payout_script: Vec<u8>,
    coinbase_message: Vec<u8>,
    next_seq: AtomicU64,
}

impl JobBuilder {
    pub fn new(payout_script: Vec<u8>, coinbase_message: Vec<u8>) -> Self {
        Self {
            payout_script,
            coinbase_message,
            next_seq: AtomicU64::new(1),
        }
    }

    pub fn build(&self, template: &Template, clean: bool) -> Result<Job, PoolError> {
        let prev_hash_internal = hash_from_display_hex(&template.previousblockhash)?;
        let bits = parse_bits(&template.bits)
            .ok_or_else(|| PoolError::Template(format!("bad bits {:?}", template.bits)))?;
        let ntime = u32::try_from(template.curtime)
            .map_err(|_| PoolError::Template(format!("curtime {} out of range", template.curtime)))?;

        let txids = template
            .transactions
            .iter()
            .map(|tx| hash_from_display_hex(&tx.txid))
            .collect::<Result<Vec<_>, _>>()?;
        let merkle_branches = merkle_branches(&txids);
        if merkle_branches.len() > MAX_NOTIFY_BRANCHES {
            warn!(target: LOG_TARGET,
                "⚠️ Template at height {} needs {} merkle branches, notify carries only {}",
                template.height, merkle_branches.len(), MAX_NOTIFY_BRANCHES
            );
        }

        let (coinbase1, coinbase2) = self.coinbase_halves(template.height, template.coinbasevalue);

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let job = Job {
            id: format!("{:08x}", seq),
            seq,
            height: template.height,
            prev_hash: template.previousblockhash.clone(),
            prev_hash_internal,
            coinbase1,
            coinbase2,
            merkle_branches,
            version: template.version,
            bits,
            ntime,
            coinbase_value: template.coinbasevalue,
            network_target: bits_to_target(bits),
            network_difficulty: bits_to_difficulty(bits),
            transactions: template.transactions.iter().map(|tx| tx.data.clone()).collect(),
            clean,
        };
        debug!(target: LOG_TARGET,
            "Built job {} (height {}, {} txs, clean={})",
            job.id, job.height, job.transactions.len(), clean
        );
        Ok(job)
    }

    /// Splits the coinbase around the 8-byte extranonce region.
    ///
    /// coinbase1: version, null input, script length, height push
    /// coinbase2: message, sequence, single output, locktime
    fn coinbase_halves(&self, height: u64, value: u64) -> (Vec<u8>, Vec<u8>) {
        let height_push = encode_height(height);
        let script_len =
            height_push.len() + EXTRANONCE1_SIZE + EXTRANONCE2_SIZE + self.coinbase_message.len();

        let mut cb1 = Vec::with_capacity(42 + height_push.len());
        cb1.extend_from_slice(&1u32.to_le_bytes());
        cb1.push(0x01);
        cb1.extend_from_slice(&[0u8; 32]);
        cb1.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        cb1.extend_from_slice(&encode_varint(script_len as u64));
        cb1.extend_from_slice(&height_push);

        let mut cb2 = Vec::with_capacity(self.coinbase_message.len() + 22 + self.payout_script.len());
        cb2.extend_from_slice(&self.coinbase_message);
        cb2.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        cb2.push(0x01);
        cb2.extend_from_slice(&value.to_le_bytes());
        cb2.extend_from_slice(&encode_varint(self.payout_script.len() as u64));
        cb2.extend_from_slice(&self.payout_script);
        cb2.extend_from_slice(&0u32.to_le_bytes());

        (cb1, cb2)
    }
}


// Changelog:
// - v1.2.0 (2026-10-17): Jobs keep the full branch list and raw transactions for block assembly.
// - v1.1.0 (2026-10-17): Added header reconstruction for share validation.
// - v1.0.0 (2026-10-17): Initial coinbase split and job construction.
