//! Guarded Ledger
//!
//! A single owner-gated state machine holding a message, a counter, a pause
//! flag and custody of deposited native currency, plus an in-memory
//! execution host to run it on.
//!
//! # Modules
//! - `errors`: Ledger, host and deployment error types
//! - `events`: Events emitted by guarded operations
//! - `security`: Guard primitives (owner, pause, reentrancy)
//! - `config`: Ledger and host configuration
//! - `ledger`: The guarded ledger and its transfer seam
//! - `host`: In-memory execution host with atomic calls
//! - `deployment`: Deployment records

pub mod config;
pub mod deployment;
pub mod errors;
pub mod events;
pub mod host;
pub mod ledger;
pub mod security;

/// Ledger ABI version, frozen after release
pub const LEDGER_ABI_VERSION: &str = "1.0.0";
