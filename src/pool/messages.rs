// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/messages.rs
// Version: 2.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file defines the typed Stratum V1 messages exchanged with miners,
// located in the pool subdirectory. Inbound lines are parsed into a Request
// whose parameters are validated here, before any session state is touched;
// outbound traffic is a Response or a Notification.
//
// Tree Location:
// - src/pool/messages.rs (wire message types)
// - Depends on: serde, serde_json, crate::core

use crate::core::codec::parse_u32_hex;
use crate::core::error::StratumError;
use crate::job::EXTRANONCE2_SIZE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Worker label used when the username carries no `.worker` suffix.
pub const DEFAULT_WORKER: &str = "default";

/// Loosely typed envelope of an inbound line
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitParams {
    pub worker: String,
    pub job_id: String,
    pub extranonce2: Vec<u8>,
    pub ntime: u32,
    pub nonce: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Subscribe { user_agent: Option<String> },
    Authorize { account: String, worker: String, password: String },
    Submit(SubmitParams),
    SuggestDifficulty(f64),
    Configure,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Result<RawRequest, StratumError> {
    serde_json::from_str(line).map_err(|_| StratumError::ParseError)
}

fn params_array(params: &Value) -> &[Value] {
    params.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn string_param(params: &[Value], index: usize) -> Result<&str, StratumError> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or(StratumError::BadParams)
}

impl Request {
    pub fn from_raw(raw: &RawRequest) -> Result<Request, StratumError> {
        let params = params_array(&raw.params);
        match raw.method.as_str() {
            "mining.subscribe" => Ok(Request::Subscribe {
                user_agent: params.first().and_then(Value::as_str).map(str::to_string),
            }),
            "mining.authorize" => {
                let username = string_param(params, 0)?;
                if username.is_empty() {
                    return Err(StratumError::BadParams);
                }
                let (account, worker) = match username.split_once('.') {
                    Some((account, worker)) if !worker.is_empty() => (account, worker),
                    Some((account, _)) => (account, DEFAULT_WORKER),
                    None => (username, DEFAULT_WORKER),
                };
                Ok(Request::Authorize {
                    account: account.to_string(),
                    worker: worker.to_string(),
                    password: params.get(1).and_then(Value::as_str).unwrap_or_default().to_string(),
                })
            }
            "mining.submit" => {
                let extranonce2 =
                    hex::decode(string_param(params, 2)?).map_err(|_| StratumError::BadParams)?;
                if extranonce2.len() != EXTRANONCE2_SIZE {
                    return Err(StratumError::BadParams);
                }
                Ok(Request::Submit(SubmitParams {
                    worker: string_param(params, 0)?.to_string(),
                    job_id: string_param(params, 1)?.to_string(),
                    extranonce2,
                    ntime: parse_u32_hex(string_param(params, 3)?).ok_or(StratumError::BadParams)?,
                    nonce: parse_u32_hex(string_param(params, 4)?).ok_or(StratumError::BadParams)?,
                }))
            }
            "mining.suggest_difficulty" => {
                let value = match params.first() {
                    Some(Value::Number(n)) => n.as_f64(),
                    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                match value {
                    Some(d) if d.is_finite() && d > 0.0 => Ok(Request::SuggestDifficulty(d)),
                    _ => Err(StratumError::BadParams),
                }
            }
            "mining.configure" => Ok(Request::Configure),
            other => Ok(Request::Unknown(other.to_string())),
        }
    }
}

/// Reply to a request, `{"id", "result", "error"}`
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub id: Value,
    pub result: Value,
    pub error: Value,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self { id, result, error: Value::Null }
    }

    pub fn err(id: Value, error: &StratumError) -> Self {
        Self { id, result: Value::Null, error: error.to_value() }
    }
}

/// Server-initiated message, always with `"id": null`
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Value,
    pub method: &'static str,
    pub params: Value,
}

impl Notification {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self { id: Value::Null, method, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(line: &str) -> Result<Request, StratumError> {
        Request::from_raw(&parse_line(line)?)
    }

    #[test]
    fn test_parse_error() {
        assert_eq!(parse_line("{not json").unwrap_err(), StratumError::ParseError);
        assert_eq!(parse_line(r#"{"id":1}"#).unwrap_err(), StratumError::ParseError);
    }

    #[test]
    fn test_subscribe() {
        let r = request(r#"{"id":1,"method":"mining.subscribe","params":["cpuminer/2.5"]}"#);
        assert_eq!(r, Ok(Request::Subscribe { user_agent: Some("cpuminer/2.5".into()) }));
        let r = request(r#"{"id":1,"method":"mining.subscribe"}"#);
        assert_eq!(r, Ok(Request::Subscribe { user_agent: None }));
    }

    #[test]
    fn test_authorize_splits_worker() {
        let r = request(r#"{"id":2,"method":"mining.authorize","params":["bc1qabc.rig1","x"]}"#);
        assert_eq!(
            r,
            Ok(Request::Authorize {
                account: "bc1qabc".into(),
                worker: "rig1".into(),
                password: "x".into()
            })
        );
        let r = request(r#"{"id":2,"method":"mining.authorize","params":["bc1qabc"]}"#).unwrap();
        assert!(matches!(r, Request::Authorize { worker, .. } if worker == DEFAULT_WORKER));
        let r = request(r#"{"id":2,"method":"mining.authorize","params":["a.b.c","x"]}"#).unwrap();
        assert!(matches!(r, Request::Authorize { account, worker, .. } if account == "a" && worker == "b.c"));
    }

    #[test]
    fn test_authorize_bad_params() {
        assert_eq!(
            request(r#"{"id":2,"method":"mining.authorize","params":[]}"#),
            Err(StratumError::BadParams)
        );
        assert_eq!(
            request(r#"{"id":2,"method":"mining.authorize","params":[42]}"#),
            Err(StratumError::BadParams)
        );
    }

    #[test]
    fn test_submit() {
        let r = request(
            r#"{"id":4,"method":"mining.submit","params":["w","00000001","0a0b0c0d","65000000","deadbeef"]}"#,
        );
        assert_eq!(
            r,
            Ok(Request::Submit(SubmitParams {
                worker: "w".into(),
                job_id: "00000001".into(),
                extranonce2: vec![0x0a, 0x0b, 0x0c, 0x0d],
                ntime: 0x6500_0000,
                nonce: 0xdead_beef,
            }))
        );
    }

    #[test]
    fn test_submit_bad_params() {
        for params in [
            json!(["w", "1", "0a0b0c", "65000000", "deadbeef"]),
            json!(["w", "1", "0a0b0c0d", "650000", "deadbeef"]),
            json!(["w", "1", "0a0b0c0d", "65000000", "xyz"]),
            json!(["w", "1", "0a0b0c0d"]),
            json!({"job": "1"}),
        ] {
            let raw = RawRequest { id: json!(1), method: "mining.submit".into(), params };
            assert_eq!(Request::from_raw(&raw), Err(StratumError::BadParams));
        }
    }

    #[test]
    fn test_suggest_difficulty_accepts_number_or_string() {
        let r = request(r#"{"id":3,"method":"mining.suggest_difficulty","params":[512]}"#);
        assert_eq!(r, Ok(Request::SuggestDifficulty(512.0)));
        let r = request(r#"{"id":3,"method":"mining.suggest_difficulty","params":["0.5"]}"#);
        assert_eq!(r, Ok(Request::SuggestDifficulty(0.5)));
        let r = request(r#"{"id":3,"method":"mining.suggest_difficulty","params":[-1]}"#);
        assert_eq!(r, Err(StratumError::BadParams));
    }

    #[test]
    fn test_configure_and_unknown() {
        let r = request(r#"{"id":5,"method":"mining.configure","params":[["version-rolling"],{}]}"#);
        assert_eq!(r, Ok(Request::Configure));
        let r = request(r#"{"id":6,"method":"mining.extranonce.subscribe","params":[]}"#);
        assert_eq!(r, Ok(Request::Unknown("mining.extranonce.subscribe".into())));
    }

    #[test]
    fn test_outbound_shapes() {
        let ok = serde_json::to_value(Response::ok(json!(7), json!(true))).unwrap();
        assert_eq!(ok, json!({"id": 7, "result": true, "error": null}));
        let err = serde_json::to_value(Response::err(json!(8), &StratumError::Unauthorized)).unwrap();
        assert_eq!(err, json!({"id": 8, "result": null, "error": [24, "Unauthorized", null]}));
        let n = serde_json::to_value(Notification::new("mining.set_difficulty", json!([2.0]))).unwrap();
        assert_eq!(n, json!({"id": null, "method": "mining.set_difficulty", "params": [2.0]}));
    }
}

// Changelog:
// - v2.0.0 (2026-10-17): Replaced the stale difficulty copy with typed Stratum messages.
//   - Request is validated at the boundary (hex widths, worker split, difficulty).
//   - Response and Notification carry the outbound wire shapes.
