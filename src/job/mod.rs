// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/job/mod.rs
// Version: 1.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file is the module declaration for job construction, located in the
// job subdirectory.
//
// Tree Location:
// - src/job/mod.rs (job module entry point)
// - Submodules: builder, header, merkle, store

pub mod builder;
pub mod header;
pub mod merkle;
pub mod store;

pub use builder::{EXTRANONCE1_SIZE, EXTRANONCE2_SIZE, Job, JobBuilder};
pub use store::JobStore;

// Changelog:
// - v1.0.0 (2026-10-17): Initial job module.
