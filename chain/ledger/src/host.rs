//! In-memory execution host
//!
//! Stands in for the transactional runtime a ledger is deployed on:
//! - Externally owned account balances
//! - Ledger deployment at derived addresses
//! - All-or-nothing calls: ledger and account state are snapshotted before
//!   each call and restored if it fails
//! - Native currency transfer, including recipient hooks that may re-enter
//!   the ledger while a withdrawal is in flight
//! - Inbound transfers routed to `GuardedLedger::receive_funds`

use chrono::Utc;
use ledger_types::ids::{Address, TxId};
use ledger_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::{HostConfig, LedgerConfig};
use crate::deployment::{DeploymentRecord, CONTRACT_NAME};
use crate::errors::{HostError, LedgerError};
use crate::events::LedgerEvent;
use crate::ledger::{FundsTransfer, GuardedLedger};

/// Callback run when the host moves currency to a hooked address.
///
/// Receives a [`ReentrantCall`] bound to the paying ledger mid-transfer.
/// Returning `Err` makes the transfer fail.
pub type RecipientHook = Box<dyn FnMut(&mut ReentrantCall<'_>, Amount) -> Result<(), String>>;

/// Outcome of a committed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: TxId,
    pub caller: Address,
    pub to: Address,
    /// Events emitted by the call, including any from re-entrant calls.
    pub events: Vec<LedgerEvent>,
}

/// A recipient's handle on the paying ledger while a payout is in flight.
///
/// The caller is always the recipient being paid. Hooks cannot act under
/// any other identity.
pub struct ReentrantCall<'a> {
    caller: Address,
    ledger: &'a mut GuardedLedger,
    accounts: &'a mut HashMap<Address, Amount>,
}

impl ReentrantCall<'_> {
    /// Address every re-entrant call is made as.
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Read access to the paying ledger.
    pub fn ledger(&self) -> &GuardedLedger {
        &*self.ledger
    }

    /// Send `amount` from the recipient's account back into the ledger.
    pub fn receive(&mut self, amount: Amount) -> Result<(), HostError> {
        let available = self.accounts.get(&self.caller).copied().unwrap_or(Amount::ZERO);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| HostError::InsufficientFunds {
                address: self.caller,
                required: amount.to_string(),
                available: available.to_string(),
            })?;
        self.ledger.receive_funds(&self.caller, amount, &[])?;
        self.accounts.insert(self.caller, remaining);
        Ok(())
    }

    pub fn update_message(&mut self, text: impl Into<String>) -> Result<LedgerEvent, LedgerError> {
        self.ledger.update_message(&self.caller, text)
    }

    pub fn increment_counter(&mut self) -> Result<LedgerEvent, LedgerError> {
        self.ledger.increment_counter(&self.caller)
    }

    pub fn reset_counter(&mut self) -> Result<LedgerEvent, LedgerError> {
        self.ledger.reset_counter(&self.caller)
    }

    pub fn pause_contract(&mut self) -> Result<LedgerEvent, LedgerError> {
        self.ledger.pause_contract(&self.caller)
    }

    pub fn unpause_contract(&mut self) -> Result<LedgerEvent, LedgerError> {
        self.ledger.unpause_contract(&self.caller)
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<LedgerEvent, LedgerError> {
        self.ledger.transfer_ownership(&self.caller, new_owner)
    }

    pub fn renounce_ownership(&mut self) -> Result<LedgerEvent, LedgerError> {
        self.ledger.renounce_ownership(&self.caller)
    }

    /// Attempt a nested withdrawal. The outer withdrawal still holds the
    /// ledger's reentrancy guard, so this never reaches a payout.
    pub fn emergency_withdraw(&mut self) -> Result<LedgerEvent, LedgerError> {
        self.ledger.emergency_withdraw(&self.caller, &mut NestedTransfer)
    }
}

/// Payout primitive for nested withdrawals; refuses every transfer.
struct NestedTransfer;

impl FundsTransfer for NestedTransfer {
    fn transfer(&mut self, _: &mut GuardedLedger, _: Address, _: Amount) -> Result<(), String> {
        Err("nested payout while a withdrawal is in flight".to_string())
    }
}

/// The host's transfer primitive, handed to a ledger during a call.
///
/// Payouts to another deployed ledger, or back to the paying ledger itself,
/// go through `receive_funds`. Everything else credits an account.
pub struct HostTransfer<'a> {
    from: Address,
    accounts: &'a mut HashMap<Address, Amount>,
    ledgers: &'a mut HashMap<Address, GuardedLedger>,
    hooks: &'a mut HashMap<Address, RecipientHook>,
}

impl FundsTransfer for HostTransfer<'_> {
    fn transfer(
        &mut self,
        ledger: &mut GuardedLedger,
        to: Address,
        amount: Amount,
    ) -> Result<(), String> {
        if to == self.from {
            ledger
                .receive_funds(&self.from, amount, &[])
                .map_err(|e| e.to_string())?;
        } else if let Some(payee) = self.ledgers.get_mut(&to) {
            payee
                .receive_funds(&self.from, amount, &[])
                .map_err(|e| e.to_string())?;
        } else {
            let current = self.accounts.get(&to).copied().unwrap_or(Amount::ZERO);
            let credited = current
                .checked_add(amount)
                .ok_or_else(|| format!("balance overflow crediting {}", to))?;
            self.accounts.insert(to, credited);
        }

        if let Some(hook) = self.hooks.get_mut(&to) {
            debug!(to = %to, amount = %amount, "Invoking recipient hook");
            let mut reentry = ReentrantCall {
                caller: to,
                ledger,
                accounts: &mut *self.accounts,
            };
            hook(&mut reentry, amount)?;
        }
        Ok(())
    }
}

/// In-memory execution host.
///
/// Calls against one host are serialized by `&mut self`, so each call runs
/// to completion without interleaving.
pub struct InMemoryHost {
    config: HostConfig,
    accounts: HashMap<Address, Amount>,
    ledgers: HashMap<Address, GuardedLedger>,
    hooks: HashMap<Address, RecipientHook>,
    deploy_nonce: u64,
}

impl InMemoryHost {
    /// Create an empty host.
    pub fn new(config: HostConfig) -> Self {
        info!(network = %config.network, "InMemoryHost initialized");
        Self {
            config,
            accounts: HashMap::new(),
            ledgers: HashMap::new(),
            hooks: HashMap::new(),
            deploy_nonce: 0,
        }
    }

    /// Create a host with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(HostConfig::default())
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    // ───────────────────────── Accounts ─────────────────────────

    /// Credit an externally owned account out of thin air.
    pub fn fund(&mut self, account: Address, amount: Amount) -> Result<(), HostError> {
        let current = self.accounts.get(&account).copied().unwrap_or(Amount::ZERO);
        let credited = current.checked_add(amount).ok_or(HostError::Overflow)?;
        self.accounts.insert(account, credited);
        Ok(())
    }

    /// Balance of an account or, for a ledger address, its custody balance.
    pub fn balance_of(&self, address: &Address) -> Amount {
        match self.ledgers.get(address) {
            Some(ledger) => ledger.balance(),
            None => self.accounts.get(address).copied().unwrap_or(Amount::ZERO),
        }
    }

    /// Register a hook run whenever the host pays `address`.
    pub fn set_recipient_hook(&mut self, address: Address, hook: RecipientHook) {
        self.hooks.insert(address, hook);
    }

    pub fn clear_recipient_hook(&mut self, address: &Address) {
        self.hooks.remove(address);
    }

    // ───────────────────────── Deployment ─────────────────────────

    /// Instantiate a ledger owned by `deployer`.
    pub fn deploy(
        &mut self,
        deployer: Address,
        ledger_config: &LedgerConfig,
    ) -> Result<DeploymentRecord, HostError> {
        if deployer.is_zero() {
            return Err(LedgerError::InvalidAddress.into());
        }

        let deployer_balance = self.balance_of(&deployer);
        if deployer_balance < self.config.min_deployer_balance {
            warn!(
                deployer = %deployer,
                balance = %deployer_balance,
                minimum = %self.config.min_deployer_balance,
                "Deployer balance is low"
            );
        }

        self.deploy_nonce += 1;
        let address = Address::derive(&format!("ledger:{}:{}", deployer, self.deploy_nonce));
        let ledger = GuardedLedger::new(deployer, ledger_config);
        let initial_state = ledger.get_info();
        self.ledgers.insert(address, ledger);

        let record = DeploymentRecord {
            contract_name: CONTRACT_NAME.to_string(),
            contract_address: address,
            transaction_hash: TxId::new(),
            deployer,
            deployment_time: Utc::now(),
            network: self.config.network.clone(),
            initial_state,
        };

        info!(
            address = %address,
            deployer = %deployer,
            tx = %record.transaction_hash,
            "Ledger deployed"
        );
        Ok(record)
    }

    /// Read access to a deployed ledger.
    pub fn ledger(&self, address: &Address) -> Result<&GuardedLedger, HostError> {
        self.ledgers
            .get(address)
            .ok_or(HostError::UnknownLedger { address: *address })
    }

    // ───────────────────────── Calls ─────────────────────────

    /// Run `op` against the ledger at `at` as a single atomic call.
    ///
    /// On error every ledger and every account balance are restored to
    /// their state before the call.
    pub fn call<F>(&mut self, caller: Address, at: Address, op: F) -> Result<Receipt, HostError>
    where
        F: FnOnce(&mut GuardedLedger, &mut HostTransfer<'_>) -> Result<LedgerEvent, LedgerError>,
    {
        let mut ledger = self
            .ledgers
            .remove(&at)
            .ok_or(HostError::UnknownLedger { address: at })?;
        let ledger_snapshot = ledger.clone();
        let ledgers_snapshot = self.ledgers.clone();
        let accounts_snapshot = self.accounts.clone();
        let mark = ledger.events().len();

        let result = {
            let mut transfer = HostTransfer {
                from: at,
                accounts: &mut self.accounts,
                ledgers: &mut self.ledgers,
                hooks: &mut self.hooks,
            };
            op(&mut ledger, &mut transfer)
        };

        match result {
            Ok(_) => {
                let receipt = Receipt {
                    tx_id: TxId::new(),
                    caller,
                    to: at,
                    events: ledger
                        .events()
                        .get(mark..)
                        .map(<[LedgerEvent]>::to_vec)
                        .unwrap_or_default(),
                };
                self.ledgers.insert(at, ledger);
                debug!(tx = %receipt.tx_id, events = receipt.events.len(), "Call committed");
                Ok(receipt)
            }
            Err(e) => {
                self.ledgers = ledgers_snapshot;
                self.ledgers.insert(at, ledger_snapshot);
                self.accounts = accounts_snapshot;
                warn!(caller = %caller, ledger = %at, error = %e, "Call reverted");
                Err(e.into())
            }
        }
    }

    /// Move currency from an account. Transfers to a ledger are credited
    /// through `receive_funds`, with `data` passed along.
    pub fn send(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        data: &[u8],
    ) -> Result<Receipt, HostError> {
        let available = self.accounts.get(&from).copied().unwrap_or(Amount::ZERO);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| HostError::InsufficientFunds {
                address: from,
                required: amount.to_string(),
                available: available.to_string(),
            })?;

        if let Some(ledger) = self.ledgers.get_mut(&to) {
            ledger.receive_funds(&from, amount, data)?;
            self.accounts.insert(from, remaining);
        } else if from != to {
            let current = self.accounts.get(&to).copied().unwrap_or(Amount::ZERO);
            let credited = current.checked_add(amount).ok_or(HostError::Overflow)?;
            self.accounts.insert(from, remaining);
            self.accounts.insert(to, credited);
        }

        debug!(from = %from, to = %to, amount = %amount, "Transfer committed");
        Ok(Receipt {
            tx_id: TxId::new(),
            caller: from,
            to,
            events: Vec::new(),
        })
    }

    // ───────────────────────── Ledger operations ─────────────────────────

    pub fn update_message(
        &mut self,
        caller: Address,
        at: Address,
        text: impl Into<String>,
    ) -> Result<Receipt, HostError> {
        let text = text.into();
        self.call(caller, at, |ledger, _| ledger.update_message(&caller, text))
    }

    pub fn increment_counter(&mut self, caller: Address, at: Address) -> Result<Receipt, HostError> {
        self.call(caller, at, |ledger, _| ledger.increment_counter(&caller))
    }

    pub fn reset_counter(&mut self, caller: Address, at: Address) -> Result<Receipt, HostError> {
        self.call(caller, at, |ledger, _| ledger.reset_counter(&caller))
    }

    pub fn pause_contract(&mut self, caller: Address, at: Address) -> Result<Receipt, HostError> {
        self.call(caller, at, |ledger, _| ledger.pause_contract(&caller))
    }

    pub fn unpause_contract(&mut self, caller: Address, at: Address) -> Result<Receipt, HostError> {
        self.call(caller, at, |ledger, _| ledger.unpause_contract(&caller))
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        at: Address,
        new_owner: Address,
    ) -> Result<Receipt, HostError> {
        self.call(caller, at, |ledger, _| {
            ledger.transfer_ownership(&caller, new_owner)
        })
    }

    pub fn renounce_ownership(&mut self, caller: Address, at: Address) -> Result<Receipt, HostError> {
        self.call(caller, at, |ledger, _| ledger.renounce_ownership(&caller))
    }

    /// Withdraw the ledger's full balance to its owner using the host's
    /// transfer primitive.
    pub fn emergency_withdraw(&mut self, caller: Address, at: Address) -> Result<Receipt, HostError> {
        self.call(caller, at, |ledger, transfer| {
            ledger.emergency_withdraw(&caller, transfer)
        })
    }
}
