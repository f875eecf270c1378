//! Comprehensive tests for the balance ledger

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, GroupId, Money, PersonId};
use domain_ledger::{
    BalanceState, Group, GroupExpense, Ledger, LedgerError, Person, SplitMethod, Transaction,
    TransactionKind,
};

fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

struct Household {
    ledger: Ledger,
    me: PersonId,
    alice: PersonId,
    bob: PersonId,
    carol: PersonId,
    group: GroupId,
}

fn household() -> Household {
    let me = PersonId::new();
    Household {
        ledger: Ledger::new(me, Currency::USD),
        me,
        alice: PersonId::new(),
        bob: PersonId::new(),
        carol: PersonId::new(),
        group: GroupId::new(),
    }
}

fn equal_bill(
    h: &Household,
    title: &str,
    total: Decimal,
    payer: PersonId,
    participants: &[PersonId],
) -> GroupExpense {
    GroupExpense::split(
        h.group,
        title,
        usd(total),
        payer,
        participants,
        &SplitMethod::Equally,
    )
    .unwrap()
}

// ============================================================================
// Expense Recording Tests
// ============================================================================

mod record_expense_tests {
    use super::*;

    #[test]
    fn test_user_pays_for_the_table() {
        let mut h = household();
        let bill = equal_bill(&h, "Dinner", dec!(120.00), h.me, &[h.me, h.alice, h.bob, h.carol]);

        let delta = h.ledger.record_expense(bill).unwrap();

        assert_eq!(delta.changes.len(), 3);
        for person in [h.alice, h.bob, h.carol] {
            assert_eq!(h.ledger.net_balance(&person), usd(dec!(30.00)));
        }
    }

    #[test]
    fn test_user_pays_without_participating() {
        let mut h = household();
        // The user fronts a bill they are not splitting
        let bill = equal_bill(&h, "Their tickets", dec!(60.00), h.me, &[h.alice, h.bob]);

        h.ledger.record_expense(bill).unwrap();

        assert_eq!(h.ledger.net_balance(&h.alice), usd(dec!(30.00)));
        assert_eq!(h.ledger.net_balance(&h.bob), usd(dec!(30.00)));
    }

    #[test]
    fn test_friend_pays_user_owes_only_own_share() {
        let mut h = household();
        let bill = equal_bill(&h, "Brunch", dec!(90.00), h.alice, &[h.me, h.alice, h.bob]);

        let delta = h.ledger.record_expense(bill).unwrap();

        assert_eq!(delta.changes.len(), 1);
        assert_eq!(h.ledger.net_balance(&h.alice), usd(dec!(-30.00)));
        // Bob owes Alice, which is not this user's ledger's business
        assert_eq!(h.ledger.net_balance(&h.bob), usd(dec!(0)));
    }

    #[test]
    fn test_bill_not_involving_user_is_recorded_but_moves_nothing() {
        let mut h = household();
        let bill = equal_bill(&h, "Their coffee", dec!(8.00), h.alice, &[h.alice, h.bob]);

        let delta = h.ledger.record_expense(bill).unwrap();

        assert!(delta.is_empty());
        assert_eq!(h.ledger.history().len(), 1);
    }

    #[test]
    fn test_uneven_remainder_lands_on_leading_participants() {
        let mut h = household();
        let bill = equal_bill(&h, "Pizza", dec!(100.00), h.me, &[h.me, h.alice, h.bob]);

        h.ledger.record_expense(bill).unwrap();

        // Shares are 33.34 / 33.33 / 33.33 with the user first in order
        assert_eq!(h.ledger.net_balance(&h.alice), usd(dec!(33.33)));
        assert_eq!(h.ledger.net_balance(&h.bob), usd(dec!(33.33)));
    }

    #[test]
    fn test_invalid_expense_leaves_ledger_untouched() {
        let mut h = household();
        let mut bill = equal_bill(&h, "Dinner", dec!(90.00), h.me, &[h.me, h.alice]);
        // Corrupt the allocations past the one-minor-unit tolerance
        bill.participants[0].amount = usd(dec!(10.00));

        assert!(matches!(
            h.ledger.record_expense(bill),
            Err(LedgerError::ShareMismatch { .. })
        ));
        assert!(h.ledger.history().is_empty());
        assert_eq!(h.ledger.net_balance(&h.alice), usd(dec!(0)));
    }

    #[test]
    fn test_balances_accumulate_across_bills() {
        let mut h = household();
        h.ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(90.00), h.me, &[h.me, h.alice, h.bob]))
            .unwrap();
        h.ledger
            .record_expense(equal_bill(&h, "Taxi", dec!(24.00), h.alice, &[h.me, h.alice, h.bob]))
            .unwrap();

        // +30 from dinner, -8 own taxi share
        assert_eq!(h.ledger.net_balance(&h.alice), usd(dec!(22.00)));
        assert_eq!(h.ledger.net_balance(&h.bob), usd(dec!(30.00)));
    }
}

// ============================================================================
// Transaction Tests
// ============================================================================

mod transaction_tests {
    use super::*;

    #[test]
    fn test_linked_expense_increases_what_they_owe() {
        let mut h = household();
        let txn = Transaction::new("Covered her ticket", usd(dec!(45.00)), TransactionKind::Expense)
            .with_linked_person(h.alice);

        h.ledger.record_transaction(txn).unwrap();
        assert_eq!(h.ledger.net_balance(&h.alice), usd(dec!(45.00)));
    }

    #[test]
    fn test_linked_income_decreases_what_they_owe() {
        let mut h = household();
        let txn = Transaction::new("Borrowed from Bob", usd(dec!(45.00)), TransactionKind::Income)
            .with_linked_person(h.bob);

        h.ledger.record_transaction(txn).unwrap();
        assert_eq!(h.ledger.net_balance(&h.bob), usd(dec!(-45.00)));
    }

    #[test]
    fn test_unlinked_transaction_is_feed_only() {
        let mut h = household();
        let txn = Transaction::new("Groceries", usd(dec!(80.00)), TransactionKind::Expense);

        let delta = h.ledger.record_transaction(txn).unwrap();
        assert!(delta.is_empty());
        assert_eq!(h.ledger.history().len(), 1);
    }

    #[test]
    fn test_self_linked_transaction_rejected() {
        let mut h = household();
        let txn = Transaction::new("Paid myself", usd(dec!(10.00)), TransactionKind::Expense)
            .with_linked_person(h.me);

        assert!(h.ledger.record_transaction(txn).is_err());
        assert!(h.ledger.history().is_empty());
    }
}

// ============================================================================
// Query and Aggregate Tests
// ============================================================================

mod query_tests {
    use super::*;

    #[test]
    fn test_debtors_creditors_and_totals() {
        let mut h = household();
        h.ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(60.00), h.me, &[h.me, h.alice]))
            .unwrap();
        let txn = Transaction::new("Borrowed", usd(dec!(100.00)), TransactionKind::Income)
            .with_linked_person(h.bob);
        h.ledger.record_transaction(txn).unwrap();

        assert_eq!(h.ledger.debtors(), vec![(h.alice, usd(dec!(30.00)))]);
        assert_eq!(h.ledger.creditors(), vec![(h.bob, usd(dec!(-100.00)))]);
        assert_eq!(h.ledger.total_owed_to_user(), usd(dec!(30.00)));
        assert_eq!(h.ledger.total_user_owes(), usd(dec!(100.00)));
    }

    #[test]
    fn test_zero_balances_hidden_from_listings() {
        let mut h = household();
        h.ledger
            .record_expense(equal_bill(&h, "Lunch", dec!(20.00), h.me, &[h.me, h.alice]))
            .unwrap();
        let repay = Transaction::new("Repaid", usd(dec!(10.00)), TransactionKind::Income)
            .with_linked_person(h.alice);
        h.ledger.record_transaction(repay).unwrap();

        assert!(h.ledger.net_balance(&h.alice).is_zero());
        assert!(h.ledger.debtors().is_empty());
        assert!(h.ledger.creditors().is_empty());
    }

    #[test]
    fn test_group_aggregate_is_the_group_slice_of_the_net() {
        let mut h = household();
        let other_group = GroupId::new();

        h.ledger
            .record_expense(equal_bill(&h, "Trip dinner", dec!(60.00), h.me, &[h.me, h.alice]))
            .unwrap();
        let flat_bill = GroupExpense::split(
            other_group,
            "Rent share",
            usd(dec!(500.00)),
            h.me,
            &[h.me, h.alice],
            &SplitMethod::Equally,
        )
        .unwrap();
        h.ledger.record_expense(flat_bill).unwrap();

        let trip = h.ledger.aggregate_for_group(&h.group);
        let flat = h.ledger.aggregate_for_group(&other_group);

        assert_eq!(trip.get(&h.alice), Some(&usd(dec!(30.00))));
        assert_eq!(flat.get(&h.alice), Some(&usd(dec!(250.00))));
        assert_eq!(h.ledger.net_balance(&h.alice), usd(dec!(280.00)));
    }

    #[test]
    fn test_balance_state_lifecycle() {
        let mut h = household();
        assert_eq!(h.ledger.balance_state(&h.alice), BalanceState::Settled);

        h.ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(40.00), h.me, &[h.me, h.alice]))
            .unwrap();
        assert_eq!(h.ledger.balance_state(&h.alice), BalanceState::Unsettled);
    }
}

// ============================================================================
// Replay and Reconciliation Tests
// ============================================================================

mod replay_tests {
    use super::*;
    use domain_ledger::SettlementMode;

    #[test]
    fn test_replay_reproduces_balances_exactly() {
        let mut h = household();
        h.ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(100.00), h.me, &[h.me, h.alice, h.bob]))
            .unwrap();
        h.ledger
            .record_expense(equal_bill(&h, "Taxi", dec!(30.00), h.alice, &[h.me, h.alice]))
            .unwrap();
        let txn = Transaction::new("Loan", usd(dec!(12.50)), TransactionKind::Expense)
            .with_linked_person(h.bob);
        h.ledger.record_transaction(txn).unwrap();

        let replayed =
            Ledger::from_events(h.me, Currency::USD, h.ledger.history().to_vec()).unwrap();

        for person in [h.alice, h.bob, h.carol] {
            assert_eq!(replayed.net_balance(&person), h.ledger.net_balance(&person));
        }
        assert_eq!(replayed.history().len(), h.ledger.history().len());
    }

    #[test]
    fn test_replay_covers_settlements_and_settled_expenses() {
        let mut h = household();
        let bill = equal_bill(&h, "Dinner", dec!(90.00), h.me, &[h.me, h.alice, h.bob]);
        let bill_id = bill.id;
        h.ledger.record_expense(bill).unwrap();

        h.ledger
            .settle(h.alice, SettlementMode::Partial(usd(dec!(10.00))))
            .unwrap();
        h.ledger.settle_expense(bill_id).unwrap();

        let replayed =
            Ledger::from_events(h.me, Currency::USD, h.ledger.history().to_vec()).unwrap();

        assert!(replayed.is_expense_settled(&bill_id));
        assert_eq!(replayed.net_balance(&h.alice), h.ledger.net_balance(&h.alice));
        assert_eq!(replayed.net_balance(&h.bob), h.ledger.net_balance(&h.bob));
    }

    #[test]
    fn test_recompute_agrees_with_cache_after_mixed_activity() {
        let mut h = household();
        h.ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(100.00), h.me, &[h.me, h.alice, h.bob]))
            .unwrap();
        let txn = Transaction::new("Repaid", usd(dec!(13.33)), TransactionKind::Income)
            .with_linked_person(h.alice);
        h.ledger.record_transaction(txn).unwrap();

        for person in [h.alice, h.bob] {
            assert_eq!(h.ledger.recompute(&person), h.ledger.net_balance(&person));
        }
    }

    #[test]
    fn test_healthy_ledger_reconciles_clean() {
        let mut h = household();
        h.ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(90.00), h.me, &[h.me, h.alice, h.bob]))
            .unwrap();
        h.ledger
            .record_expense(equal_bill(&h, "Drinks", dec!(45.00), h.bob, &[h.me, h.bob]))
            .unwrap();

        assert!(h.ledger.reconcile().is_empty());
    }
}

// ============================================================================
// Person and Group Tests
// ============================================================================

mod party_tests {
    use super::*;

    #[test]
    fn test_person_balance_signs() {
        let person = Person::new("Alice", Currency::USD);
        assert!(!person.owes_user());
        assert!(!person.user_owes());

        let debtor = person.clone().with_balance(usd(dec!(20.00)));
        assert!(debtor.owes_user());

        let creditor = person.with_balance(usd(dec!(-20.00)));
        assert!(creditor.user_owes());
    }

    #[test]
    fn test_group_membership_checks_expenses() {
        let me = PersonId::new();
        let alice = PersonId::new();
        let outsider = PersonId::new();
        let group = Group::new("Flatmates", vec![me, alice]);

        let ok = GroupExpense::split(
            group.id,
            "Rent",
            usd(dec!(100.00)),
            me,
            &[me, alice],
            &SplitMethod::Equally,
        )
        .unwrap();
        assert!(group.validate_expense(&ok).is_ok());

        let bad = GroupExpense::split(
            group.id,
            "Rent",
            usd(dec!(100.00)),
            me,
            &[me, outsider],
            &SplitMethod::Equally,
        )
        .unwrap();
        assert!(matches!(
            group.validate_expense(&bad),
            Err(LedgerError::InvalidParticipantSet(_))
        ));
    }

    #[test]
    fn test_group_members_stay_unique() {
        let a = PersonId::new();
        let b = PersonId::new();
        let mut group = Group::new("Trip", vec![a, b, a]);

        assert_eq!(group.members, vec![a, b]);
        assert!(!group.add_member(b));
        assert!(group.add_member(PersonId::new()));
        assert_eq!(group.members.len(), 3);
    }
}

// ============================================================================
// Event Log Serialization Tests
// ============================================================================

mod serialization_tests {
    use super::*;
    use domain_ledger::LedgerEvent;

    #[test]
    fn test_event_log_survives_a_json_round_trip() {
        let mut h = household();
        h.ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(100.00), h.me, &[h.me, h.alice, h.bob]))
            .unwrap();
        let txn = Transaction::new("Loan", usd(dec!(12.50)), TransactionKind::Expense)
            .with_linked_person(h.bob);
        h.ledger.record_transaction(txn).unwrap();

        let json = serde_json::to_string(h.ledger.history()).unwrap();
        let events: Vec<LedgerEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(events, h.ledger.history());

        // A store round-trip rebuilds the same ledger
        let restored = Ledger::from_events(h.me, Currency::USD, events).unwrap();
        assert_eq!(restored.net_balance(&h.alice), h.ledger.net_balance(&h.alice));
        assert_eq!(restored.net_balance(&h.bob), h.ledger.net_balance(&h.bob));
    }
}

// ============================================================================
// Notification Payload Tests
// ============================================================================

mod notification_tests {
    use super::*;

    #[test]
    fn test_delta_exposes_notification_payloads() {
        let mut h = household();
        let delta = h
            .ledger
            .record_expense(equal_bill(&h, "Dinner", dec!(60.00), h.me, &[h.me, h.alice, h.bob]))
            .unwrap();

        let updates = delta.notifications();
        assert_eq!(updates.len(), 2);
        assert!(updates
            .iter()
            .all(|u| u.new_balance == usd(dec!(20.00))));
    }
}
