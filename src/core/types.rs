// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/types.rs
// Version: 2.1.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file defines core data structures for the solo pool, located in the
// core subdirectory. It includes the command-line arguments, the immutable
// runtime configuration built from them, and the node-side template and
// chain-info records.
//
// Tree Location:
// - src/core/types.rs (core data structures)
// - Depends on: clap, serde, crate::core::address

use crate::core::address::{PayoutScript, decode_address};
use crate::core::error::PoolError;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest coinbase message accepted; keeps the script-sig under 100 bytes.
pub const MAX_COINBASE_MESSAGE: usize = 64;

/// Command-line arguments for the solo pool
#[derive(Parser, Debug, Clone)]
#[command(
    name = "solo-pool",
    author = "Solo Pool Team",
    version,
    about = "Solo Bitcoin Stratum V1 pool backed by a local full node",
    long_about = "Solo Pool turns getblocktemplate work from a local Bitcoin node into Stratum V1\n\
                  jobs, validates every submitted share against the job it references, and\n\
                  submits any share that meets the network target as a full block.\n\n\
                  The whole block reward is paid to the single ADDRESS given on the command line.\n\n\
                  Examples:\n\
                    Mainnet: solo-pool bc1q... --rpc-user alice --rpc-pass secret\n\
                    Low diff: solo-pool bc1q... --start-diff 0.001 --min-diff 0.0001\n\
                    Regtest: solo-pool bcrt1q... --rpc-port 18443 --port 3334"
)]
pub struct Args {
    /// Payout address receiving the full block reward
    /// Supported: bc1q (P2WPKH/P2WSH), bc1p (P2TR), 1... (P2PKH), 3... (P2SH), plus tb1/bcrt1/m/n/2
    #[arg(value_name = "ADDRESS", help = "Payout address for block rewards")]
    pub address: Option<String>,

    #[arg(long, default_value = "3333", value_name = "PORT", help = "Stratum listening port")]
    pub port: u16,

    #[arg(long, default_value = "0.0.0.0", value_name = "IP", help = "Stratum listening interface")]
    pub bind: String,

    #[arg(long = "rpc-host", default_value = "127.0.0.1", value_name = "HOST", help = "Node RPC host")]
    pub rpc_host: String,

    #[arg(long = "rpc-port", default_value = "8332", value_name = "PORT", help = "Node RPC port")]
    pub rpc_port: u16,

    #[arg(long = "rpc-user", default_value = "ayedex", value_name = "USER", help = "Node RPC username")]
    pub rpc_user: String,

    #[arg(long = "rpc-pass", default_value = "ayedexpass", value_name = "PASS", help = "Node RPC password")]
    pub rpc_pass: String,

    /// Difficulty given to every new session
    /// 1.0 = 2^32 hashes per share; small values suit USB sticks and CPU miners
    #[arg(long = "start-diff", default_value = "1.0", value_name = "DIFFICULTY", help = "Starting share difficulty")]
    pub start_diff: f64,

    #[arg(long = "min-diff", default_value = "0.0001", value_name = "DIFFICULTY", help = "Minimum share difficulty")]
    pub min_diff: f64,

    #[arg(long = "max-diff", default_value = "1000000", value_name = "DIFFICULTY", help = "Maximum share difficulty")]
    pub max_diff: f64,

    #[arg(
        long = "coinbase-message",
        default_value = "/solo-pool/",
        value_name = "TEXT",
        help = "Text embedded in the coinbase script-sig"
    )]
    pub coinbase_message: String,

    #[arg(long = "poll-interval", default_value = "1", value_name = "SECONDS", help = "Template poll interval")]
    pub poll_interval: u64,

    #[arg(long = "rpc-timeout", default_value = "30", value_name = "SECONDS", help = "Timeout for every node RPC call")]
    pub rpc_timeout: u64,

    /// Minimum age of the current job before a changed template (same tip) is pushed
    #[arg(long = "job-refresh", default_value = "30", value_name = "SECONDS", help = "Refresh interval for same-tip jobs")]
    pub job_refresh: u64,

    #[arg(long = "vardiff-target", default_value = "10", value_name = "SECONDS", help = "Target seconds between shares per session")]
    pub vardiff_target: f64,

    #[arg(long = "vardiff-retarget", default_value = "60", value_name = "SECONDS", help = "Seconds between difficulty retargets")]
    pub vardiff_retarget: u64,

    #[arg(long = "stats-interval", default_value = "30", value_name = "SECONDS", help = "Dashboard interval")]
    pub stats_interval: u64,

    #[arg(long = "log-level", default_value = "info", value_name = "LEVEL", help = "Console log level (error, warn, info, debug, trace)")]
    pub log_level: String,

    #[arg(long = "log-config", value_name = "FILE", help = "log4rs YAML configuration (overrides --log-level)")]
    pub log_config: Option<PathBuf>,
}

impl Args {
    /// Validate arguments and return helpful errors
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_diff > 0.0 && self.min_diff.is_finite()) {
            return Err("Minimum difficulty must be a positive number".to_string());
        }
        if !(self.max_diff.is_finite() && self.max_diff >= self.min_diff) {
            return Err("Maximum difficulty must be at least the minimum difficulty".to_string());
        }
        if !(self.start_diff >= self.min_diff && self.start_diff <= self.max_diff) {
            return Err(format!(
                "Start difficulty {} must lie between --min-diff {} and --max-diff {}",
                self.start_diff, self.min_diff, self.max_diff
            ));
        }
        if self.coinbase_message.len() > MAX_COINBASE_MESSAGE {
            return Err(format!(
                "Coinbase message is {} bytes, the limit is {}",
                self.coinbase_message.len(),
                MAX_COINBASE_MESSAGE
            ));
        }
        if self.poll_interval == 0 || self.rpc_timeout == 0 || self.stats_interval == 0 {
            return Err("Poll, RPC timeout and stats intervals must be greater than 0 seconds".to_string());
        }
        if !(self.vardiff_target > 0.0) || self.vardiff_retarget == 0 {
            return Err("Vardiff target and retarget interval must be greater than 0".to_string());
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(format!("Unknown log level '{}'", self.log_level));
        }
        Ok(())
    }

    /// Builds the runtime configuration, decoding the payout address.
    pub fn to_config(&self) -> Result<PoolConfig, PoolError> {
        self.validate().map_err(PoolError::Config)?;
        let address = self
            .address
            .as_deref()
            .ok_or_else(|| PoolError::Config("payout address is required".to_string()))?;
        let payout = decode_address(address)?;
        Ok(PoolConfig {
            bind_addr: format!("{}:{}", self.bind, self.port),
            payout,
            coinbase_message: self.coinbase_message.as_bytes().to_vec(),
            start_difficulty: self.start_diff,
            min_difficulty: self.min_diff,
            max_difficulty: self.max_diff,
            poll_interval: Duration::from_secs(self.poll_interval),
            job_refresh: Duration::from_secs(self.job_refresh),
            stats_interval: Duration::from_secs(self.stats_interval),
            vardiff: VardiffConfig {
                target_share_secs: self.vardiff_target,
                retarget_interval: Duration::from_secs(self.vardiff_retarget),
            },
            rpc: RpcConfig {
                host: self.rpc_host.clone(),
                port: self.rpc_port,
                user: self.rpc_user.clone(),
                password: self.rpc_pass.clone(),
                timeout: Duration::from_secs(self.rpc_timeout),
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct VardiffConfig {
    /// Desired seconds between accepted shares of one session
    pub target_share_secs: f64,
    pub retarget_interval: Duration,
}

/// Immutable pool configuration, built once at startup and shared by `Arc`.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub bind_addr: String,
    pub payout: PayoutScript,
    pub coinbase_message: Vec<u8>,
    pub start_difficulty: f64,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    pub poll_interval: Duration,
    pub job_refresh: Duration,
    pub stats_interval: Duration,
    pub vardiff: VardiffConfig,
    pub rpc: RpcConfig,
}

impl PoolConfig {
    pub fn clamp_difficulty(&self, difficulty: f64) -> f64 {
        if difficulty.is_nan() {
            return self.start_difficulty;
        }
        difficulty.clamp(self.min_difficulty, self.max_difficulty)
    }
}

/// One transaction of a block template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateTransaction {
    /// Display-order txid
    pub txid: String,

    /// Raw transaction hex, as it goes into the block
    #[serde(default)]
    pub data: String,
}

/// Snapshot of `getblocktemplate`, replaced wholesale on every poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub height: u64,

    /// Display-order hash of the current tip
    pub previousblockhash: String,

    /// Compact target as 8 hex characters
    pub bits: String,

    pub coinbasevalue: u64,

    pub curtime: u64,

    pub version: u32,

    #[serde(default)]
    pub transactions: Vec<TemplateTransaction>,
}

impl Template {
    /// True when `other` describes the same work apart from the timestamp.
    pub fn same_work(&self, other: &Template) -> bool {
        self.previousblockhash == other.previousblockhash
            && self.bits == other.bits
            && self.version == other.version
            && self.coinbasevalue == other.coinbasevalue
            && self.transactions.len() == other.transactions.len()
            && self
                .transactions
                .iter()
                .zip(&other.transactions)
                .all(|(a, b)| a.txid == b.txid)
    }
}

/// Subset of `getblockchaininfo` reported at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain: String,
    pub blocks: u64,
    #[serde(default)]
    pub verificationprogress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["solo-pool", "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let a = args(&[]);
        assert_eq!(a.port, 3333);
        assert_eq!(a.rpc_port, 8332);
        assert_eq!(a.start_diff, 1.0);
        assert_eq!(a.min_diff, 0.0001);
        assert_eq!(a.max_diff, 1_000_000.0);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_missing_address_parses() {
        let a = Args::parse_from(["solo-pool"]);
        assert!(a.address.is_none());
        assert!(matches!(a.to_config(), Err(PoolError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_difficulty_order() {
        assert!(args(&["--min-diff", "2", "--max-diff", "1"]).validate().is_err());
        assert!(args(&["--start-diff", "0.00001"]).validate().is_err());
        assert!(args(&["--min-diff", "0"]).validate().is_err());
        assert!(args(&["--log-level", "loud"]).validate().is_err());
    }

    #[test]
    fn test_validation_rejects_long_coinbase_message() {
        let long = "x".repeat(MAX_COINBASE_MESSAGE + 1);
        assert!(args(&["--coinbase-message", &long]).validate().is_err());
    }

    #[test]
    fn test_to_config_rejects_bad_address() {
        let a = Args::parse_from(["solo-pool", "bc1qnotvalid"]);
        assert!(matches!(a.to_config(), Err(PoolError::Address { .. })));
    }

    #[test]
    fn test_clamp_difficulty() {
        let config = args(&[]).to_config().unwrap();
        assert_eq!(config.clamp_difficulty(1e12), 1_000_000.0);
        assert_eq!(config.clamp_difficulty(0.0), 0.0001);
        assert_eq!(config.clamp_difficulty(42.0), 42.0);
        assert_eq!(config.clamp_difficulty(f64::NAN), 1.0);
        assert_eq!(config.bind_addr, "0.0.0.0:3333");
    }

    #[test]
    fn test_template_deserialize_and_same_work() {
        let raw = r#"{
            "height": 800000,
            "previousblockhash": "00000000000000000002a7c4c1e48d76c5a37902165a270156b7a8d72728a054",
            "bits": "17034219",
            "coinbasevalue": 312500000,
            "curtime": 1690000000,
            "version": 536870912,
            "transactions": [{"txid": "aa", "data": "00", "fee": 10}],
            "rules": ["segwit"]
        }"#;
        let t: Template = serde_json::from_str(raw).unwrap();
        assert_eq!(t.height, 800000);
        assert_eq!(t.transactions.len(), 1);

        let mut later = t.clone();
        later.curtime += 5;
        assert!(t.same_work(&later));
        later.transactions.clear();
        assert!(!t.same_work(&later));
    }
}

// Changelog:
// - v2.1.0 (2026-10-17): Added vardiff, refresh and logging options.
// - v2.0.0 (2026-10-17): Reworked for the solo pool.
//   - Args now takes the payout address and node RPC settings.
//   - Added PoolConfig, Template, TemplateTransaction and ChainInfo.
//   - Removed miner job, share and benchmark types.
