// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/protocol.rs
// Version: 2.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file implements the server side of the Stratum V1 protocol, located in
// the pool subdirectory. It builds the results and notifications the pool
// sends to miners and frames them as newline-terminated lines.
//
// Tree Location:
// - src/pool/protocol.rs (Stratum message construction)
// - Depends on: serde_json, crate::job, crate::pool::messages

use crate::core::codec::swap_words;
use crate::job::{EXTRANONCE2_SIZE, Job};
use crate::pool::messages::Notification;
use log::error;
use serde::Serialize;
use serde_json::{Value, json};

const LOG_TARGET: &str = "solo_pool::pool::protocol";

/// Constructs messages for the Stratum protocol
pub struct StratumProtocol;

impl StratumProtocol {
    /// Result of `mining.subscribe`: subscriptions, extranonce1, extranonce2 size
    pub fn subscribe_result(subscription_id: &str, extranonce1: &[u8]) -> Value {
        json!([
            [
                ["mining.set_difficulty", subscription_id],
                ["mining.notify", subscription_id]
            ],
            hex::encode(extranonce1),
            EXTRANONCE2_SIZE
        ])
    }

    pub fn set_difficulty(difficulty: f64) -> Notification {
        Notification::new("mining.set_difficulty", json!([difficulty]))
    }

    /// `mining.notify` for a job. The previous hash goes out word-swapped and
    /// the branch list is capped, as stock miners expect.
    pub fn notify(job: &Job, clean: bool) -> Notification {
        let branches: Vec<String> = job.advertised_branches().iter().map(hex::encode).collect();
        Notification::new(
            "mining.notify",
            json!([
                job.id,
                swap_words(&job.prev_hash),
                hex::encode(&job.coinbase1),
                hex::encode(&job.coinbase2),
                branches,
                format!("{:08x}", job.version),
                format!("{:08x}", job.bits),
                format!("{:08x}", job.ntime),
                clean
            ]),
        )
    }

    /// Version rolling is not offered
    pub fn configure_result() -> Value {
        json!({"version-rolling": false})
    }

    /// Serializes a message and appends the line terminator.
    pub fn to_message<T: Serialize>(message: &T) -> Option<String> {
        match serde_json::to_string(message) {
            Ok(mut line) => {
                line.push('\n');
                Some(line)
            }
            Err(e) => {
                error!(target: LOG_TARGET, "Failed to serialize outbound message: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Template, TemplateTransaction};
    use crate::job::JobBuilder;

    fn job() -> Job {
        let template = Template {
            height: 800_000,
            previousblockhash: "00000000000000000002a7c4c1e48d76c5a37902165a270156b7a8d72728a054"
                .to_string(),
            bits: "17053894".to_string(),
            coinbasevalue: 625_000_000,
            curtime: 0x6500_0000,
            version: 0x2000_0000,
            transactions: vec![TemplateTransaction { txid: "11".repeat(32), data: "00".into() }],
        };
        JobBuilder::new(vec![0x6a], b"/test/".to_vec()).build(&template, true).unwrap()
    }

    #[test]
    fn test_subscribe_result_shape() {
        let r = StratumProtocol::subscribe_result("1", &[0, 0, 0, 1]);
        assert_eq!(
            r,
            json!([[["mining.set_difficulty", "1"], ["mining.notify", "1"]], "00000001", 4])
        );
    }

    #[test]
    fn test_notify_params() {
        let job = job();
        let n = serde_json::to_value(StratumProtocol::notify(&job, true)).unwrap();
        assert!(n["id"].is_null());
        assert_eq!(n["method"], "mining.notify");
        let p = n["params"].as_array().unwrap();
        assert_eq!(p.len(), 9);
        assert_eq!(p[0], json!(job.id));
        let prev = p[1].as_str().unwrap();
        assert!(prev.starts_with("2728a054"));
        assert!(prev.ends_with("00000000"));
        assert_eq!(p[4], json!(["1111111111111111111111111111111111111111111111111111111111111111"]));
        assert_eq!(p[5], "20000000");
        assert_eq!(p[6], "17053894");
        assert_eq!(p[7], "65000000");
        assert_eq!(p[8], true);
    }

    #[test]
    fn test_set_difficulty_and_framing() {
        let line = StratumProtocol::to_message(&StratumProtocol::set_difficulty(4.0)).unwrap();
        assert!(line.ends_with('\n'));
        let v: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(v["params"], json!([4.0]));
        assert_eq!(StratumProtocol::configure_result(), json!({"version-rolling": false}));
    }
}

// Changelog:
// - v2.0.0 (2026-10-17): Turned the client-side request builders into the pool's
//   outbound messages (subscribe result, set_difficulty, notify, configure).
