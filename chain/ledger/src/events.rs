//! Ledger events
//!
//! Events are immutable records emitted by successful guarded operations.
//! A failed call emits nothing.

use ledger_types::ids::Address;
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};

/// The stored message changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageUpdated {
    pub message: String,
}

/// The counter changed, by increment or reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterChanged {
    pub value: u64,
}

/// The ledger entered the paused state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPaused {
    pub by: Address,
}

/// The ledger left the paused state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUnpaused {
    pub by: Address,
}

/// Ownership moved. `new_owner` is the zero address after renouncement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    pub previous_owner: Address,
    pub new_owner: Address,
}

/// The full balance was withdrawn to the owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyWithdrawal {
    pub to: Address,
    pub amount: Amount,
}

/// Enum wrapper for all ledger events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    MessageUpdated(MessageUpdated),
    CounterChanged(CounterChanged),
    ContractPaused(ContractPaused),
    ContractUnpaused(ContractUnpaused),
    OwnershipTransferred(OwnershipTransferred),
    EmergencyWithdrawal(EmergencyWithdrawal),
}

impl LedgerEvent {
    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            LedgerEvent::MessageUpdated(_) => "MessageUpdated",
            LedgerEvent::CounterChanged(_) => "CounterChanged",
            LedgerEvent::ContractPaused(_) => "ContractPaused",
            LedgerEvent::ContractUnpaused(_) => "ContractUnpaused",
            LedgerEvent::OwnershipTransferred(_) => "OwnershipTransferred",
            LedgerEvent::EmergencyWithdrawal(_) => "EmergencyWithdrawal",
        }
    }
}
