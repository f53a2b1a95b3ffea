//! Guarded ledger: owner-gated record with a pause gate and funds custody
//!
//! Holds a message, a counter, a pause flag and a native currency balance.
//! Every mutator runs its guards before touching state:
//! 1. Owner check (all mutators)
//! 2. Pause check (message and counter mutators only)
//!
//! Reset, ownership, pause toggles and withdrawal stay available while
//! paused so funds can always be recovered.

use ledger_types::ids::Address;
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::errors::LedgerError;
use crate::events::{
    ContractPaused, ContractUnpaused, CounterChanged, EmergencyWithdrawal, LedgerEvent,
    MessageUpdated, OwnershipTransferred,
};
use crate::security::{OwnerGuard, PauseGuard, ReentrancyGuard};

/// Response of the unguarded `public_function` read.
pub const PUBLIC_FUNCTION_RESPONSE: &str = "This function can be called by anyone";

/// Outbound currency movement supplied by the execution host.
///
/// Implementations receive the ledger mutably because the receiving side
/// may call back into it before the transfer returns.
pub trait FundsTransfer {
    /// Move `amount` to `to`. An `Err` carries the failure reason.
    fn transfer(
        &mut self,
        ledger: &mut GuardedLedger,
        to: Address,
        amount: Amount,
    ) -> Result<(), String>;
}

/// Read-only snapshot returned by `get_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub owner: Address,
    pub message: String,
    pub counter: u64,
    pub paused: bool,
    pub balance: Amount,
}

/// The guarded ledger state machine.
///
/// Owned by exactly one host slot; all access goes through the methods
/// below. `Clone` lets the host snapshot it for all-or-nothing calls.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardedLedger {
    /// Security: single-owner access control
    owner_guard: OwnerGuard,
    /// Security: pause gate
    pause_guard: PauseGuard,
    /// Security: reentrancy guard around the withdrawal transfer
    reentrancy_guard: ReentrancyGuard,
    message: String,
    counter: u64,
    /// Funds held in custody
    balance: Amount,
    /// Emitted events log (append-only)
    events: Vec<LedgerEvent>,
}

impl GuardedLedger {
    /// Instantiate a ledger owned by `creator`.
    pub fn new(creator: Address, config: &LedgerConfig) -> Self {
        Self {
            owner_guard: OwnerGuard::new(creator),
            pause_guard: PauseGuard::new(),
            reentrancy_guard: ReentrancyGuard::new(),
            message: config.initial_message.clone(),
            counter: 0,
            balance: Amount::ZERO,
            events: Vec::new(),
        }
    }

    /// Instantiate with the default configuration.
    pub fn with_defaults(creator: Address) -> Self {
        Self::new(creator, &LedgerConfig::default())
    }

    // ───────────────────────── Message & Counter ─────────────────────────

    /// Replace the stored message. Owner-only, blocked while paused.
    pub fn update_message(
        &mut self,
        caller: &Address,
        text: impl Into<String>,
    ) -> Result<LedgerEvent, LedgerError> {
        self.authorize_active(caller, "update_message")?;

        self.message = text.into();
        debug!(len = self.message.len(), "Message updated");

        Ok(self.emit(LedgerEvent::MessageUpdated(MessageUpdated {
            message: self.message.clone(),
        })))
    }

    /// Add one to the counter. Owner-only, blocked while paused.
    pub fn increment_counter(&mut self, caller: &Address) -> Result<LedgerEvent, LedgerError> {
        self.authorize_active(caller, "increment_counter")?;

        self.counter = self.counter.checked_add(1).ok_or(LedgerError::Overflow)?;
        debug!(counter = self.counter, "Counter incremented");

        Ok(self.emit(LedgerEvent::CounterChanged(CounterChanged {
            value: self.counter,
        })))
    }

    /// Set the counter back to zero. Owner-only, allowed while paused.
    pub fn reset_counter(&mut self, caller: &Address) -> Result<LedgerEvent, LedgerError> {
        self.authorize(caller, "reset_counter")?;

        self.counter = 0;
        debug!("Counter reset");

        Ok(self.emit(LedgerEvent::CounterChanged(CounterChanged { value: 0 })))
    }

    // ───────────────────────── Pause ─────────────────────────

    /// Close the pause gate. Fails if already paused.
    pub fn pause_contract(&mut self, caller: &Address) -> Result<LedgerEvent, LedgerError> {
        self.authorize(caller, "pause_contract")?;
        self.pause_guard.pause()?;

        info!(by = %caller, "Ledger paused");
        Ok(self.emit(LedgerEvent::ContractPaused(ContractPaused { by: *caller })))
    }

    /// Open the pause gate. Fails if not paused.
    pub fn unpause_contract(&mut self, caller: &Address) -> Result<LedgerEvent, LedgerError> {
        self.authorize(caller, "unpause_contract")?;
        self.pause_guard.unpause()?;

        info!(by = %caller, "Ledger unpaused");
        Ok(self.emit(LedgerEvent::ContractUnpaused(ContractUnpaused { by: *caller })))
    }

    // ───────────────────────── Ownership ─────────────────────────

    /// Hand ownership to `new_owner`. The zero address is rejected.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<LedgerEvent, LedgerError> {
        self.authorize(caller, "transfer_ownership")?;
        let previous_owner = self.owner_guard.transfer(new_owner)?;

        info!(from = %previous_owner, to = %new_owner, "Ownership transferred");
        Ok(self.emit(LedgerEvent::OwnershipTransferred(OwnershipTransferred {
            previous_owner,
            new_owner,
        })))
    }

    /// Give up ownership permanently. No gated call can succeed afterwards.
    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<LedgerEvent, LedgerError> {
        self.authorize(caller, "renounce_ownership")?;
        let previous_owner = self.owner_guard.renounce();

        info!(from = %previous_owner, "Ownership renounced");
        Ok(self.emit(LedgerEvent::OwnershipTransferred(OwnershipTransferred {
            previous_owner,
            new_owner: Address::ZERO,
        })))
    }

    // ───────────────────────── Funds ─────────────────────────

    /// Credit an inbound transfer, with or without accompanying data.
    ///
    /// Called by the host adapter for every transfer addressed to the
    /// ledger. Unguarded and not pause-gated. Emits no event.
    pub fn receive_funds(
        &mut self,
        from: &Address,
        amount: Amount,
        data: &[u8],
    ) -> Result<(), LedgerError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        debug!(
            from = %from,
            amount = %amount,
            data_len = data.len(),
            balance = %self.balance,
            "Funds received"
        );
        Ok(())
    }

    /// Send the entire balance to the owner.
    ///
    /// The balance is zeroed before `transfer` runs, so a recipient that
    /// re-enters sees nothing left to take; the reentrancy guard rejects a
    /// nested withdrawal outright. If the transfer fails the ledger is put
    /// back exactly as it was before the call, including anything the
    /// recipient changed while re-entered, and the call reports
    /// `TransferFailed`.
    pub fn emergency_withdraw<T: FundsTransfer + ?Sized>(
        &mut self,
        caller: &Address,
        transfer: &mut T,
    ) -> Result<LedgerEvent, LedgerError> {
        self.authorize(caller, "emergency_withdraw")?;
        let snapshot = self.clone();
        self.reentrancy_guard.acquire()?;

        let to = self.owner_guard.owner();
        let amount = self.balance;
        self.balance = Amount::ZERO;

        if let Err(reason) = transfer.transfer(self, to, amount) {
            warn!(to = %to, amount = %amount, reason = %reason, "Withdrawal transfer failed");
            // Snapshot was taken unlocked, so this also releases the guard.
            *self = snapshot;
            return Err(LedgerError::TransferFailed { reason });
        }
        self.reentrancy_guard.release();

        info!(to = %to, amount = %amount, "Emergency withdrawal completed");
        Ok(self.emit(LedgerEvent::EmergencyWithdrawal(EmergencyWithdrawal {
            to,
            amount,
        })))
    }

    // ───────────────────────── Reads ─────────────────────────

    /// Unguarded read with a fixed response.
    pub fn public_function(&self) -> &'static str {
        PUBLIC_FUNCTION_RESPONSE
    }

    /// Snapshot of the full record.
    pub fn get_info(&self) -> LedgerInfo {
        LedgerInfo {
            owner: self.owner_guard.owner(),
            message: self.message.clone(),
            counter: self.counter,
            paused: self.pause_guard.is_paused(),
            balance: self.balance,
        }
    }

    /// True if `addr` currently owns the ledger.
    pub fn is_owner(&self, addr: &Address) -> bool {
        self.owner_guard.is_owner(addr)
    }

    /// Current owner (zero after renouncement).
    pub fn owner(&self) -> Address {
        self.owner_guard.owner()
    }

    /// Stored message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Current counter value.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// True while the pause gate is closed.
    pub fn is_paused(&self) -> bool {
        self.pause_guard.is_paused()
    }

    /// Funds currently held in custody.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    fn authorize(&self, caller: &Address, op: &'static str) -> Result<(), LedgerError> {
        self.owner_guard.require_owner(caller).inspect_err(|_| {
            warn!(caller = %caller, op, "Rejected: caller is not the owner");
        })
    }

    fn authorize_active(&self, caller: &Address, op: &'static str) -> Result<(), LedgerError> {
        self.authorize(caller, op)?;
        self.pause_guard.require_not_paused().inspect_err(|_| {
            warn!(caller = %caller, op, "Rejected: ledger is paused");
        })
    }

    fn emit(&mut self, event: LedgerEvent) -> LedgerEvent {
        self.events.push(event.clone());
        event
    }
}
