//! Ledger error types
//!
//! Error taxonomy for guarded operations, the in-memory execution host and
//! deployment records. Every ledger error aborts its call with no partial
//! mutation.

use ledger_types::ids::Address;
use thiserror::Error;

/// Errors returned by guarded ledger operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Unauthorized: caller is not the owner")]
    Unauthorized,

    #[error("Ledger is paused")]
    Paused,

    #[error("Ledger is not paused")]
    NotPaused,

    #[error("Invalid address: ownership cannot move to the zero address")]
    InvalidAddress,

    #[error("Transfer failed: {reason}")]
    TransferFailed { reason: String },

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Errors raised by the in-memory execution host
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("No ledger deployed at {address}")]
    UnknownLedger { address: Address },

    #[error("Insufficient funds in {address}: required {required}, available {available}")]
    InsufficientFunds {
        address: Address,
        required: String,
        available: String,
    },

    #[error("Arithmetic overflow in account balance")]
    Overflow,
}

/// Errors writing or reading a deployment record
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
