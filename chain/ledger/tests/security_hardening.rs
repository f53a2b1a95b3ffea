//! Security Hardening Tests
//!
//! Adversarial testing against the guarded ledger:
//! - Reentrancy during withdrawal
//! - Permission escalation on every gated operation
//! - Pause gating and its exemptions
//! - Terminal renouncement
//! - Fuzz testing (proptest)
//! - ABI freeze

use guarded_ledger::config::LedgerConfig;
use guarded_ledger::errors::{HostError, LedgerError};
use guarded_ledger::events::{EmergencyWithdrawal, LedgerEvent};
use guarded_ledger::host::{InMemoryHost, ReentrantCall};
use guarded_ledger::ledger::{FundsTransfer, GuardedLedger};
use guarded_ledger::LEDGER_ABI_VERSION;
use ledger_types::ids::Address;
use ledger_types::numeric::Amount;
use std::cell::RefCell;
use std::rc::Rc;

// ═══════════════════════════════════════════════════════════════════
// Reentrancy Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_reentrant_withdraw_is_rejected() {
    let (mut host, at) = setup_host();
    host.send(attacker(), at, Amount::from_ether(10), &[]).unwrap();

    let nested: Rc<RefCell<Option<Result<LedgerEvent, LedgerError>>>> = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&nested);
    host.set_recipient_hook(
        owner(),
        Box::new(move |call: &mut ReentrantCall<'_>, _amount: Amount| {
            *seen.borrow_mut() = Some(call.emergency_withdraw());
            Ok(())
        }),
    );

    host.emergency_withdraw(owner(), at).unwrap();

    assert_eq!(*nested.borrow(), Some(Err(LedgerError::Reentrancy)));
    // Paid exactly once
    assert_eq!(host.balance_of(&owner()), Amount::from_ether(110));
    assert_eq!(host.balance_of(&at), Amount::ZERO);
}

#[test]
fn test_balance_zeroed_before_transfer() {
    let (mut host, at) = setup_host();
    host.send(attacker(), at, Amount::from_ether(3), &[]).unwrap();

    let observed = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&observed);
    host.set_recipient_hook(
        owner(),
        Box::new(move |call: &mut ReentrantCall<'_>, amount: Amount| {
            *seen.borrow_mut() = Some((call.ledger().balance(), amount));
            Ok(())
        }),
    );

    host.emergency_withdraw(owner(), at).unwrap();
    assert_eq!(
        *observed.borrow(),
        Some((Amount::ZERO, Amount::from_ether(3)))
    );
}

#[test]
fn test_deposit_during_withdrawal_is_kept() {
    let (mut host, at) = setup_host();
    host.send(attacker(), at, Amount::from_ether(3), &[]).unwrap();

    host.set_recipient_hook(
        owner(),
        Box::new(|call: &mut ReentrantCall<'_>, amount: Amount| {
            // Recipient bounces the payout straight back in.
            call.receive(amount).map_err(|e| e.to_string())
        }),
    );

    let receipt = host.emergency_withdraw(owner(), at).unwrap();
    assert_eq!(
        receipt.events,
        vec![LedgerEvent::EmergencyWithdrawal(EmergencyWithdrawal {
            to: owner(),
            amount: Amount::from_ether(3),
        })]
    );
    assert_eq!(host.balance_of(&at), Amount::from_ether(3));
    assert_eq!(host.balance_of(&owner()), Amount::from_ether(100));
}

#[test]
fn test_reentry_after_handover_is_unauthorized() {
    let (mut host, at) = setup_host();
    host.send(attacker(), at, Amount::from_ether(2), &[]).unwrap();

    // The paid recipient gives the ledger away mid-payout, then tries to
    // keep acting on it.
    let nested = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&nested);
    host.set_recipient_hook(
        owner(),
        Box::new(move |call: &mut ReentrantCall<'_>, _amount: Amount| {
            call.transfer_ownership(attacker()).map_err(|e| e.to_string())?;
            let mut seen = seen.borrow_mut();
            seen.push(call.increment_counter());
            seen.push(call.update_message("still mine"));
            seen.push(call.emergency_withdraw());
            Ok(())
        }),
    );

    host.emergency_withdraw(owner(), at).unwrap();

    assert_eq!(
        *nested.borrow(),
        vec![
            Err(LedgerError::Unauthorized),
            Err(LedgerError::Unauthorized),
            Err(LedgerError::Unauthorized),
        ]
    );
    let ledger = host.ledger(&at).unwrap();
    assert_eq!(ledger.owner(), attacker());
    assert_eq!(ledger.counter(), 0);
    assert_eq!(host.balance_of(&owner()), Amount::from_ether(102));
}

#[test]
fn test_ledger_recipient_is_credited_and_hooked_as_itself() {
    let (mut host, at) = setup_host();
    let vault = host
        .deploy(owner(), &LedgerConfig::default())
        .unwrap()
        .contract_address;
    host.send(attacker(), at, Amount::from_ether(1), &[]).unwrap();
    host.transfer_ownership(owner(), at, vault).unwrap();

    // The payout lands in `vault` custody; its hook acts as `vault`.
    let nested = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&nested);
    host.set_recipient_hook(
        vault,
        Box::new(move |call: &mut ReentrantCall<'_>, _amount: Amount| {
            *seen.borrow_mut() = Some((call.caller(), call.ledger().is_owner(&call.caller())));
            Ok(())
        }),
    );

    host.emergency_withdraw(vault, at).unwrap();
    assert_eq!(*nested.borrow(), Some((vault, true)));
    assert_eq!(host.balance_of(&vault), Amount::from_ether(1));
    assert_eq!(host.balance_of(&at), Amount::ZERO);
}

#[test]
fn test_withdraw_guard_released_after_failure() {
    let mut ledger = GuardedLedger::with_defaults(owner());
    ledger
        .receive_funds(&attacker(), Amount::from_ether(1), &[])
        .unwrap();

    let result = ledger.emergency_withdraw(&owner(), &mut FailingTransfer);
    assert!(matches!(result, Err(LedgerError::TransferFailed { .. })));

    // Guard was released, so the next withdrawal goes through
    assert!(ledger.emergency_withdraw(&owner(), &mut NoopTransfer).is_ok());
    assert_eq!(ledger.balance(), Amount::ZERO);
}

// ═══════════════════════════════════════════════════════════════════
// Permission Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_every_gated_operation_rejects_non_owner() {
    let (mut host, at) = setup_host();
    host.send(attacker(), at, Amount::from_ether(1), &[]).unwrap();
    let a = attacker();
    let before = host.ledger(&at).unwrap().clone();

    let results = vec![
        host.update_message(a, at, "test"),
        host.increment_counter(a, at),
        host.reset_counter(a, at),
        host.pause_contract(a, at),
        host.unpause_contract(a, at),
        host.transfer_ownership(a, at, a),
        host.renounce_ownership(a, at),
        host.emergency_withdraw(a, at),
    ];

    for result in results {
        assert_eq!(result, Err(HostError::Ledger(LedgerError::Unauthorized)));
    }
    assert_eq!(host.ledger(&at).unwrap(), &before);
    assert_eq!(host.balance_of(&a), Amount::from_ether(99));
}

#[test]
fn test_new_owner_takes_over() {
    let (mut host, at) = setup_host();
    let bob = Address::derive("bob");

    host.transfer_ownership(owner(), at, bob).unwrap();

    assert!(host.update_message(bob, at, "New owner message").is_ok());
    assert_eq!(
        host.increment_counter(owner(), at),
        Err(HostError::Ledger(LedgerError::Unauthorized))
    );
    assert!(host.ledger(&at).unwrap().is_owner(&bob));
    assert!(!host.ledger(&at).unwrap().is_owner(&owner()));
}

#[test]
fn test_transfer_to_zero_rejected() {
    let (mut host, at) = setup_host();
    let result = host.transfer_ownership(owner(), at, Address::ZERO);
    assert_eq!(result, Err(HostError::Ledger(LedgerError::InvalidAddress)));
    assert_eq!(host.ledger(&at).unwrap().owner(), owner());
}

#[test]
fn test_renounce_is_permanent() {
    let (mut host, at) = setup_host();
    host.send(attacker(), at, Amount::from_ether(2), &[]).unwrap();
    host.renounce_ownership(owner(), at).unwrap();
    assert!(host.ledger(&at).unwrap().owner().is_zero());

    for caller in [owner(), attacker(), Address::ZERO] {
        assert_eq!(
            host.increment_counter(caller, at),
            Err(HostError::Ledger(LedgerError::Unauthorized))
        );
        assert_eq!(
            host.transfer_ownership(caller, at, caller),
            Err(HostError::Ledger(LedgerError::Unauthorized))
        );
        assert_eq!(
            host.emergency_withdraw(caller, at),
            Err(HostError::Ledger(LedgerError::Unauthorized))
        );
    }
    // Funds stay locked in custody
    assert_eq!(host.balance_of(&at), Amount::from_ether(2));
}

// ═══════════════════════════════════════════════════════════════════
// Pause Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_pause_blocks_message_and_counter() {
    let (mut host, at) = setup_host();
    host.pause_contract(owner(), at).unwrap();

    assert_eq!(
        host.update_message(owner(), at, "test"),
        Err(HostError::Ledger(LedgerError::Paused))
    );
    assert_eq!(
        host.increment_counter(owner(), at),
        Err(HostError::Ledger(LedgerError::Paused))
    );
}

#[test]
fn test_pause_exempt_operations_still_work() {
    let (mut host, at) = setup_host();
    host.send(attacker(), at, Amount::from_ether(1), &[]).unwrap();
    host.increment_counter(owner(), at).unwrap();
    host.pause_contract(owner(), at).unwrap();

    assert!(host.reset_counter(owner(), at).is_ok());
    assert!(host.emergency_withdraw(owner(), at).is_ok());

    let bob = Address::derive("bob");
    assert!(host.transfer_ownership(owner(), at, bob).is_ok());
    assert!(host.renounce_ownership(bob, at).is_ok());
}

#[test]
fn test_deposits_accepted_while_paused() {
    let (mut host, at) = setup_host();
    host.pause_contract(owner(), at).unwrap();
    host.send(attacker(), at, Amount::from_ether(1), &[]).unwrap();
    assert_eq!(host.balance_of(&at), Amount::from_ether(1));
}

#[test]
fn test_pause_toggle_wrong_state() {
    let (mut host, at) = setup_host();
    assert_eq!(
        host.unpause_contract(owner(), at),
        Err(HostError::Ledger(LedgerError::NotPaused))
    );
    host.pause_contract(owner(), at).unwrap();
    assert_eq!(
        host.pause_contract(owner(), at),
        Err(HostError::Ledger(LedgerError::Paused))
    );
    host.unpause_contract(owner(), at).unwrap();
    assert!(!host.ledger(&at).unwrap().is_paused());
}

// ═══════════════════════════════════════════════════════════════════
// ABI Freeze
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_ledger_abi_version_frozen() {
    assert_eq!(LEDGER_ABI_VERSION, "1.0.0");
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Tests (proptest)
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    fn deposit_amount() -> impl Strategy<Value = Amount> {
        (0u64..=1_000_000u64).prop_map(Amount::from_ether)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn fuzz_increment_then_reset(n in 0u64..200) {
            let mut ledger = GuardedLedger::with_defaults(owner());
            for _ in 0..n {
                ledger.increment_counter(&owner()).unwrap();
            }
            prop_assert_eq!(ledger.counter(), n);
            ledger.reset_counter(&owner()).unwrap();
            prop_assert_eq!(ledger.counter(), 0);
        }

        #[test]
        fn fuzz_balance_conservation(amounts in prop::collection::vec(deposit_amount(), 1..20)) {
            let mut ledger = GuardedLedger::with_defaults(owner());
            let mut expected = Amount::ZERO;
            for amount in &amounts {
                ledger.receive_funds(&attacker(), *amount, &[]).unwrap();
                expected = expected.checked_add(*amount).unwrap();
            }
            prop_assert_eq!(ledger.balance(), expected);

            let mut transfer = CountingTransfer::default();
            ledger.emergency_withdraw(&owner(), &mut transfer).unwrap();
            prop_assert_eq!(ledger.balance(), Amount::ZERO);
            prop_assert_eq!(transfer.total, expected);
        }

        #[test]
        fn fuzz_non_owner_never_mutates(seed in "[a-z]{1,12}", text in ".{0,32}") {
            let caller = Address::derive(&seed);
            prop_assume!(caller != owner());

            let mut ledger = GuardedLedger::with_defaults(owner());
            ledger.receive_funds(&caller, Amount::from_ether(1), &[]).unwrap();
            let before = ledger.clone();

            prop_assert_eq!(ledger.update_message(&caller, text), Err(LedgerError::Unauthorized));
            prop_assert_eq!(ledger.increment_counter(&caller), Err(LedgerError::Unauthorized));
            prop_assert_eq!(ledger.pause_contract(&caller), Err(LedgerError::Unauthorized));
            prop_assert_eq!(ledger.transfer_ownership(&caller, caller), Err(LedgerError::Unauthorized));
            prop_assert_eq!(
                ledger.emergency_withdraw(&caller, &mut NoopTransfer),
                Err(LedgerError::Unauthorized)
            );
            prop_assert_eq!(ledger, before);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn owner() -> Address {
    Address::derive("owner")
}

fn attacker() -> Address {
    Address::derive("attacker")
}

fn setup_host() -> (InMemoryHost, Address) {
    let mut host = InMemoryHost::with_defaults();
    host.fund(owner(), Amount::from_ether(100)).unwrap();
    host.fund(attacker(), Amount::from_ether(100)).unwrap();
    let record = host.deploy(owner(), &LedgerConfig::default()).unwrap();
    (host, record.contract_address)
}

struct NoopTransfer;

impl FundsTransfer for NoopTransfer {
    fn transfer(&mut self, _: &mut GuardedLedger, _: Address, _: Amount) -> Result<(), String> {
        Ok(())
    }
}

struct FailingTransfer;

impl FundsTransfer for FailingTransfer {
    fn transfer(&mut self, _: &mut GuardedLedger, _: Address, _: Amount) -> Result<(), String> {
        Err("out of gas".to_string())
    }
}

#[derive(Default)]
struct CountingTransfer {
    total: Amount,
}

impl FundsTransfer for CountingTransfer {
    fn transfer(&mut self, _: &mut GuardedLedger, _: Address, amount: Amount) -> Result<(), String> {
        self.total = self.total.checked_add(amount).ok_or("overflow")?;
        Ok(())
    }
}
