// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/stats/mod.rs
// Version: 1.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file is the module declaration for pool statistics, located in the
// stats subdirectory.
//
// Tree Location:
// - src/stats/mod.rs (stats module entry point)
// - Submodules: pool_stats

pub mod pool_stats;

pub use pool_stats::{BestShare, PoolStats};

// Changelog:
// - v1.0.0 (2026-10-17): Moved statistics out of the miner into a pool-level module.
