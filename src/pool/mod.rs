// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/pool/mod.rs
// Version: 2.0.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file is the module declaration for the Stratum side of the solo pool,
// located in the pool subdirectory. It declares submodules and re-exports
// the types main.rs and the integration tests drive.
//
// Tree Location:
// - src/pool/mod.rs (pool module entry point)
// - Submodules: messages, poller, protocol, registry, server, session

pub mod messages;
pub mod poller;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

// Re-export key types for convenience
pub use poller::{BlockCandidate, RefreshOutcome, TemplatePoller};
pub use protocol::StratumProtocol;
pub use registry::Registry;
pub use server::{PoolContext, StratumServer};
pub use session::{Session, SessionHandle};

// Changelog:
// - v2.0.0 (2026-10-17): The pool module now serves miners instead of connecting to a pool.
//   - Replaced client with server, session, registry and poller.
// - v1.0.0 (2025-06-14): Extracted from monolithic main.rs.
