// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/error.rs
// Version: 1.1.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file defines the error taxonomy of the pool, located in the core
// subdirectory. Component errors (node, template, address) are PoolError;
// rejections that go back over the Stratum wire are StratumError.
//
// Tree Location:
// - src/core/error.rs (error types)
// - Depends on: thiserror, serde_json

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("I/O failure")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON encoding failure")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("node RPC `{method}` failed: {message}")]
    Upstream { method: String, message: String },

    #[error("node RPC `{method}` timed out")]
    Timeout { method: String },

    #[error("malformed block template: {0}")]
    Template(String),

    #[error("invalid payout address")]
    Address {
        #[from]
        source: AddressError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PoolError {
    pub fn upstream(method: &str, message: impl Into<String>) -> Self {
        PoolError::Upstream {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("mixed-case bech32 string")]
    MixedCase,

    #[error("checksum mismatch")]
    BadChecksum,

    #[error("unexpected payload length {0}")]
    InvalidLength(usize),

    #[error("unknown human-readable part {0:?}")]
    UnknownHrp(String),

    #[error("unsupported witness version {0}")]
    UnsupportedWitnessVersion(u8),

    #[error("unknown base58 version byte {0:#04x}")]
    UnknownVersion(u8),

    #[error("unrecognised address format")]
    UnknownFormat,
}

/// Rejections carried back to miners as `[code, message, null]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StratumError {
    #[error("Parse error")]
    ParseError,

    #[error("Bad params")]
    BadParams,

    #[error("Unknown method")]
    UnknownMethod,

    #[error("No active job")]
    NoActiveJob,

    #[error("Job not found")]
    JobNotFound,

    #[error("Duplicate share")]
    DuplicateShare,

    #[error("Low difficulty share")]
    LowDifficulty,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not subscribed")]
    NotSubscribed,
}

impl StratumError {
    pub fn code(&self) -> i32 {
        match self {
            StratumError::ParseError | StratumError::BadParams | StratumError::UnknownMethod => 20,
            StratumError::NoActiveJob | StratumError::JobNotFound => 21,
            StratumError::DuplicateShare => 22,
            StratumError::LowDifficulty => 23,
            StratumError::Unauthorized => 24,
            StratumError::NotSubscribed => 25,
        }
    }

    /// True for rejections that count against a share in the statistics.
    pub fn is_share_rejection(&self) -> bool {
        matches!(
            self,
            StratumError::NoActiveJob
                | StratumError::JobNotFound
                | StratumError::DuplicateShare
                | StratumError::LowDifficulty
        )
    }

    pub fn to_value(&self) -> Value {
        json!([self.code(), self.to_string(), null])
    }
}


// Changelog:
// - v1.1.0 (2026-10-17): Added StratumError with fixed wire codes.
// - v1.0.0 (2026-10-17): Initial PoolError and AddressError taxonomy.
