// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/mod.rs
// Version: 2.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file is the module declaration for the core functionality of the solo
// pool, located in the core subdirectory. It declares submodules and re-exports
// key types for use throughout the project.

pub mod address;
pub mod codec;
pub mod difficulty;
pub mod error;
pub mod types;

// Re-export the most commonly used items
pub use address::{PayoutScript, ScriptType, address_to_script, decode_address};
pub use codec::sha256d;
pub use error::{AddressError, PoolError, StratumError};
pub use types::{Args, ChainInfo, PoolConfig, Template, TemplateTransaction};

// Changelog:
// - v2.0.0 (2026-10-17): Reworked for the solo pool.
//   - Added address, codec and error modules.
//   - Dropped the SHA3x hasher.
// - v1.0.1 (2025-06-16): Added simple SHA-256 support.
