// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/node/rpc.rs
// Version: 1.1.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file implements the JSON-RPC client for the local full node, located
// in the node subdirectory. It is a thin HTTP POST + basic-auth shim with a
// fixed timeout around every call.
//
// Tree Location:
// - src/node/rpc.rs (node RPC client)
// - Depends on: hyper, hyper-util, http-body-util, base64, serde_json, tokio

use crate::core::error::PoolError;
use crate::core::types::{ChainInfo, RpcConfig, Template};
use crate::node::source::TemplateSource;
use base64::Engine;
use http_body_util::{BodyExt, Full};
use hyper::{
    Request, Uri,
    body::Bytes,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const LOG_TARGET: &str = "solo_pool::node::rpc";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

pub struct NodeRpc {
    client: Client<HttpConnector, Full<Bytes>>,
    url: Uri,
    auth_header: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl NodeRpc {
    pub fn new(config: &RpcConfig) -> Result<Self, PoolError> {
        let url: Uri = format!("http://{}:{}/", config.host, config.port)
            .parse()
            .map_err(|e| PoolError::Config(format!("bad RPC address {}:{}: {e}", config.host, config.port)))?;
        let credentials = format!("{}:{}", config.user, config.password);
        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            url,
            auth_header: format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode(credentials)
            ),
            timeout: config.timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Sends one request and returns its `result`, or the node's error.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, PoolError> {
        let request = JsonRpcRequest {
            jsonrpc: "1.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let body = serde_json::to_string(&request)?;
        let req = Request::builder()
            .method("POST")
            .uri(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, &self.auth_header)
            .body(Full::<Bytes>::from(body))
            .map_err(|e| PoolError::upstream(method, e.to_string()))?;

        let exchange = async {
            let response = self
                .client
                .request(req)
                .await
                .map_err(|e| PoolError::upstream(method, e.to_string()))?;
            let status = response.status();
            let bytes = response
                .into_body()
                .collect()
                .await
                .map_err(|e| PoolError::upstream(method, e.to_string()))?
                .to_bytes();
            Ok::<_, PoolError>((status, bytes))
        };
        let (status, bytes) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| PoolError::Timeout { method: method.to_string() })??;

        // the node answers RPC errors with HTTP 500 and a JSON body
        let reply: JsonRpcReply = serde_json::from_slice(&bytes)
            .map_err(|e| PoolError::upstream(method, format!("HTTP {status}: {e}")))?;
        if let Some(error) = reply.error {
            return Err(PoolError::upstream(
                method,
                format!("code {}: {}", error.code, error.message),
            ));
        }
        debug!(target: LOG_TARGET, "RPC {} answered (HTTP {})", method, status);
        Ok(reply.result)
    }

    pub async fn get_blockchain_info(&self) -> Result<ChainInfo, PoolError> {
        let result = self.call("getblockchaininfo", json!([])).await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn get_block_template(&self) -> Result<Template, PoolError> {
        let result = self
            .call("getblocktemplate", json!([{"rules": ["segwit"]}]))
            .await?;
        if result.is_null() {
            return Err(PoolError::upstream("getblocktemplate", "empty result"));
        }
        Ok(serde_json::from_value(result)?)
    }

    /// `Ok(None)` when the node accepted the block, else its rejection reason.
    pub async fn submit_block(&self, block_hex: String) -> Result<Option<String>, PoolError> {
        let result = self.call("submitblock", json!([block_hex])).await?;
        Ok(match result {
            Value::Null => None,
            Value::String(reason) => Some(reason),
            other => Some(other.to_string()),
        })
    }
}

impl TemplateSource for NodeRpc {
    async fn fetch_template(&self) -> Result<Template, PoolError> {
        self.get_block_template().await
    }

    async fn submit_block(&self, block_hex: String) -> Result<Option<String>, PoolError> {
        NodeRpc::submit_block(self, block_hex).await
    }
}


// Changelog:
// - v1.1.0 (2026-10-17): Every call is bounded by the configured timeout.
// - v1.0.0 (2026-10-17): Initial node RPC client (getblocktemplate, submitblock, getblockchaininfo).
