// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/node/source.rs
// Version: 1.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file declares the seam between the pool and whatever produces block
// templates, located in the node subdirectory. The node RPC client is the
// production implementation; tests plug in an in-memory one.

use crate::core::error::PoolError;
use crate::core::types::Template;
use std::future::Future;

pub trait TemplateSource: Send + Sync + 'static {
    /// Fetches the current block template.
    fn fetch_template(&self) -> impl Future<Output = Result<Template, PoolError>> + Send;

    /// Submits a serialized block. `Ok(None)` means accepted, `Ok(Some(reason))` rejected.
    fn submit_block(
        &self,
        block_hex: String,
    ) -> impl Future<Output = Result<Option<String>, PoolError>> + Send;
}

// Changelog:
// - v1.0.0 (2026-10-17): Initial TemplateSource trait.
