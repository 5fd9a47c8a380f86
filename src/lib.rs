// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/lib.rs
// Version: 2.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file serves as the main library entry point for the solo pool,
// located at the root of the source tree. It exports all public modules
// and types that the binary and the integration tests use.
//
// Tree Location:
// - src/lib.rs (root library file)
// - Exports modules: core, job, node, pool, stats, utils

pub mod core;
pub mod job;
pub mod node;
pub mod pool;
pub mod stats;
pub mod utils;

// Re-export commonly used types at the crate root for convenience
pub use crate::core::{PoolConfig, PoolError, StratumError};
pub use crate::node::{NodeRpc, TemplateSource};
pub use crate::pool::StratumServer;
pub use crate::stats::PoolStats;

// Changelog:
// - v2.0.0 (2026-10-17): Solo pool library root.
//   - Added job, node and stats modules; dropped miner, benchmark, help and tui.
// - v1.0.2 (2025-06-15): Added help module support.
// - v1.0.0 (2025-06-14): Initial modular breakout from monolithic main.rs.
