//! Guard primitives for the ledger
//!
//! Composable preconditions checked before any guarded operation body runs.
//! Each guard is a small value owned by the ledger; checks return typed
//! errors and never mutate.

use ledger_types::ids::Address;

use crate::errors::LedgerError;

/// Held for the duration of a withdrawal payout.
///
/// While a payout is in flight the recipient may call back into the ledger;
/// a second withdrawal started from there finds the guard held and is
/// refused with `Reentrancy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReentrancyGuard {
    in_flight: bool,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self { in_flight: false }
    }

    /// Mark a payout as started. `Reentrancy` if one already is.
    pub fn acquire(&mut self) -> Result<(), LedgerError> {
        if self.in_flight {
            return Err(LedgerError::Reentrancy);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Mark the payout as finished.
    pub fn release(&mut self) {
        self.in_flight = false;
    }

    /// True while a payout is in flight.
    pub fn is_locked(&self) -> bool {
        self.in_flight
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-owner access control.
///
/// Holds exactly one owner at any time. The zero address is only reachable
/// through `renounce` and never satisfies `require_owner`, so renouncement
/// is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerGuard {
    owner: Address,
}

impl OwnerGuard {
    /// Create with an initial owner.
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    /// Check whether `caller` is the current owner.
    pub fn is_owner(&self, caller: &Address) -> bool {
        !self.owner.is_zero() && *caller == self.owner
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if !self.is_owner(caller) {
            return Err(LedgerError::Unauthorized);
        }
        Ok(())
    }

    /// Move ownership to `new_owner`. Returns the previous owner.
    ///
    /// The caller must already have passed `require_owner`.
    pub fn transfer(&mut self, new_owner: Address) -> Result<Address, LedgerError> {
        if new_owner.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }

    /// Drop ownership for good. Returns the previous owner.
    pub fn renounce(&mut self) -> Address {
        std::mem::replace(&mut self.owner, Address::ZERO)
    }

    /// Get the current owner (zero after renouncement).
    pub fn owner(&self) -> Address {
        self.owner
    }
}

/// Two-state pause gate: Active or Paused.
///
/// Each transition is valid only from the opposite state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a new unpaused guard.
    pub fn new() -> Self {
        Self { paused: false }
    }

    /// Active → Paused. Fails with `Paused` if already paused.
    pub fn pause(&mut self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        self.paused = true;
        Ok(())
    }

    /// Paused → Active. Fails with `NotPaused` if already active.
    pub fn unpause(&mut self) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    /// Fail with `Paused` while the gate is closed.
    pub fn require_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for PauseGuard {
    fn default() -> Self {
        Self::new()
    }
}
