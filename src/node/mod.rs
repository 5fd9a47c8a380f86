// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/node/mod.rs
// Version: 1.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file is the module declaration for full-node access, located in the
// node subdirectory.
//
// Tree Location:
// - src/node/mod.rs (node module entry point)
// - Submodules: rpc, source

pub mod rpc;
pub mod source;

pub use rpc::NodeRpc;
pub use source::TemplateSource;

// Changelog:
// - v1.0.0 (2026-10-17): Initial node module.
