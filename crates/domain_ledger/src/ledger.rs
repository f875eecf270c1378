//! Balance Ledger
//!
//! Maintains the signed net balance between the current user and every other
//! person, fed by split bills and direct transactions. All mutating
//! operations validate first and apply second (all-or-nothing), and are
//! expected to run serialized per user: the ledger is single-writer by
//! design.
//!
//! # Invariants
//!
//! - Cached balances always equal the fold over the event history
//!   ([`Ledger::recompute`] is the recovery/consistency path)
//! - Money is conserved: the deltas produced by an expense sum to what the
//!   payer fronted for the others
//! - History is append-only; nothing is ever rewritten in place

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use core_kernel::{Currency, ExpenseId, GroupId, Money, MoneyError, PersonId};

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::expense::GroupExpense;
use crate::ports::BalanceUpdate;
use crate::settlement::SettlementTarget;
use crate::transaction::Transaction;

/// One person's balance movement produced by a ledger mutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceChange {
    /// Whose balance moved
    pub person_id: PersonId,
    /// Signed movement
    pub delta: Money,
    /// The balance after applying the movement
    pub new_balance: Money,
}

/// The full set of balance movements from one mutation.
///
/// This is what the persistence collaborator stores and what the
/// notification collaborator is told about.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerDelta {
    /// Per-person movements, in expense participant order
    pub changes: Vec<BalanceChange>,
}

impl LedgerDelta {
    /// True if the mutation moved no balances
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Payloads for the fire-and-forget notification collaborator
    pub fn notifications(&self) -> Vec<BalanceUpdate> {
        self.changes
            .iter()
            .map(|change| BalanceUpdate {
                person_id: change.person_id,
                new_balance: change.new_balance,
            })
            .collect()
    }
}

/// Derived settlement state of one (user, counterparty) balance.
///
/// Never stored: a settled balance re-enters `Unsettled` as soon as new
/// activity is recorded. Settlement is a point-in-time zeroing, not a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceState {
    /// Non-zero balance with no settlement since the last activity
    Unsettled,
    /// Non-zero balance most recently reduced by a settlement
    PartiallySettled,
    /// Zero balance
    Settled,
}

/// Cached balance found to disagree with the event-log fold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceDrift {
    pub person_id: PersonId,
    pub cached: Money,
    pub derived: Money,
}

/// The per-user balance ledger
#[derive(Debug, Clone)]
pub struct Ledger {
    current_user: PersonId,
    currency: Currency,
    history: Vec<LedgerEvent>,
    balances: HashMap<PersonId, Money>,
    settled_expenses: HashSet<ExpenseId>,
}

impl Ledger {
    /// Creates an empty ledger for the given user
    pub fn new(current_user: PersonId, currency: Currency) -> Self {
        Self {
            current_user,
            currency,
            history: Vec::new(),
            balances: HashMap::new(),
            settled_expenses: HashSet::new(),
        }
    }

    /// Rebuilds a ledger by replaying a persisted event log.
    ///
    /// The replayed balances are the fold over the log, so a ledger restored
    /// this way is identical to the one that produced the events.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ExpenseNotFound`] if the log settles an
    /// expense it never recorded, or a money error if the log mixes
    /// currencies.
    pub fn from_events(
        current_user: PersonId,
        currency: Currency,
        events: Vec<LedgerEvent>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new(current_user, currency);

        for event in events {
            match &event {
                LedgerEvent::ExpenseRecorded { expense, .. } => {
                    let deltas = ledger.expense_deltas(expense);
                    ledger.apply_changes(&deltas)?;
                }
                LedgerEvent::ExpenseSettled { expense_id, .. } => {
                    let expense = ledger
                        .expense(expense_id)
                        .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))?
                        .clone();
                    let reversal = negate(ledger.expense_deltas(&expense));
                    ledger.apply_changes(&reversal)?;
                    ledger.settled_expenses.insert(*expense_id);
                }
                LedgerEvent::TransactionRecorded { transaction, .. } => {
                    let deltas = transaction_deltas(transaction);
                    ledger.apply_changes(&deltas)?;
                }
                // Settlement balance effects ride on their transactions
                LedgerEvent::SettlementRecorded { .. } => {}
            }
            ledger.history.push(event);
        }

        debug!(
            events = ledger.history.len(),
            people = ledger.balances.len(),
            "ledger replayed from event log"
        );

        Ok(ledger)
    }

    /// The user this ledger belongs to
    pub fn current_user(&self) -> PersonId {
        self.current_user
    }

    /// The ledger currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// The append-only event history
    pub fn history(&self) -> &[LedgerEvent] {
        &self.history
    }

    /// Looks up a recorded expense by id
    pub fn expense(&self, expense_id: &ExpenseId) -> Option<&GroupExpense> {
        self.history.iter().find_map(|event| match event {
            LedgerEvent::ExpenseRecorded { expense, .. } if expense.id == *expense_id => {
                Some(expense)
            }
            _ => None,
        })
    }

    /// True if the given split bill has been marked settled
    pub fn is_expense_settled(&self, expense_id: &ExpenseId) -> bool {
        self.settled_expenses.contains(expense_id)
    }

    /// Records a split bill and moves the affected balances.
    ///
    /// When the current user paid, every other participant now owes their
    /// share (+share). When someone else paid and the current user
    /// participates, the user owes the payer their own share (−share against
    /// the payer). Bills that do not involve the current user produce an
    /// empty delta: this ledger is strictly user-centric.
    ///
    /// # Errors
    ///
    /// Fails without mutating anything if the expense violates its
    /// allocation invariants or uses a different currency.
    pub fn record_expense(&mut self, expense: GroupExpense) -> Result<LedgerDelta, LedgerError> {
        expense.validate()?;
        self.check_currency(&expense.total)?;

        let deltas = self.expense_deltas(&expense);
        let delta = self.apply_changes(&deltas)?;

        debug!(
            expense = %expense.id,
            payer = %expense.payer,
            total = %expense.total,
            moved = delta.changes.len(),
            "expense recorded"
        );

        self.history.push(LedgerEvent::ExpenseRecorded {
            timestamp: expense.created_at,
            expense,
        });

        Ok(delta)
    }

    /// Records a direct transaction (non-split income/expense).
    ///
    /// Only transactions linked to a person move a balance; unlinked ones
    /// are kept in the history for the activity feed and recomputation.
    pub fn record_transaction(
        &mut self,
        transaction: Transaction,
    ) -> Result<LedgerDelta, LedgerError> {
        self.check_currency(&transaction.amount)?;
        if transaction.linked_person == Some(self.current_user) {
            return Err(LedgerError::InvalidParticipantSet(
                "transaction cannot be linked to the current user".to_string(),
            ));
        }

        let deltas = transaction_deltas(&transaction);
        let delta = self.apply_changes(&deltas)?;

        self.history.push(LedgerEvent::TransactionRecorded {
            timestamp: transaction.occurred_at,
            transaction,
        });

        Ok(delta)
    }

    /// The cached net balance for one person (zero if never seen).
    ///
    /// Positive: they owe you. Negative: you owe them.
    pub fn net_balance(&self, person_id: &PersonId) -> Money {
        self.balances
            .get(person_id)
            .copied()
            .unwrap_or_else(|| Money::zero(self.currency))
    }

    /// All cached non-zero balances
    pub fn balances(&self) -> impl Iterator<Item = (&PersonId, &Money)> {
        self.balances.iter().filter(|(_, b)| !b.is_zero())
    }

    /// People who owe the current user (positive balances)
    pub fn debtors(&self) -> Vec<(PersonId, Money)> {
        self.balances()
            .filter(|(_, b)| b.is_positive())
            .map(|(p, b)| (*p, *b))
            .collect()
    }

    /// People the current user owes (negative balances)
    pub fn creditors(&self) -> Vec<(PersonId, Money)> {
        self.balances()
            .filter(|(_, b)| b.is_negative())
            .map(|(p, b)| (*p, *b))
            .collect()
    }

    /// Total outstanding in the user's favor
    pub fn total_owed_to_user(&self) -> Money {
        self.debtors()
            .iter()
            .fold(Money::zero(self.currency), |acc, (_, b)| acc + *b)
    }

    /// Total the user owes others (as a positive amount)
    pub fn total_user_owes(&self) -> Money {
        self.creditors()
            .iter()
            .fold(Money::zero(self.currency), |acc, (_, b)| acc + b.abs())
    }

    /// Per-member balances within one group, over that group's unsettled
    /// bills only.
    ///
    /// Group balances and direct-person balances are additive slices of the
    /// same net figure; nothing is double-counted because direct
    /// transactions never enter this aggregate.
    pub fn aggregate_for_group(&self, group_id: &GroupId) -> HashMap<PersonId, Money> {
        let mut totals: HashMap<PersonId, Money> = HashMap::new();

        for event in &self.history {
            if let LedgerEvent::ExpenseRecorded { expense, .. } = event {
                if expense.group_id != *group_id || self.settled_expenses.contains(&expense.id)
                {
                    continue;
                }
                for (person_id, delta) in self.expense_deltas(expense) {
                    let entry = totals
                        .entry(person_id)
                        .or_insert_with(|| Money::zero(self.currency));
                    *entry = *entry + delta;
                }
            }
        }

        totals
    }

    /// Recomputes one person's balance from the event history.
    ///
    /// This is the materialized-view rebuild: unsettled expense allocations
    /// plus every linked transaction (settlement transactions included).
    /// Used for reconciliation and recovery rather than day-to-day reads.
    pub fn recompute(&self, person_id: &PersonId) -> Money {
        let mut balance = Money::zero(self.currency);

        for event in &self.history {
            match event {
                LedgerEvent::ExpenseRecorded { expense, .. } => {
                    if self.settled_expenses.contains(&expense.id) {
                        continue;
                    }
                    for (p, delta) in self.expense_deltas(expense) {
                        if p == *person_id {
                            balance = balance + delta;
                        }
                    }
                }
                LedgerEvent::TransactionRecorded { transaction, .. } => {
                    if transaction.linked_person == Some(*person_id) {
                        balance = balance + transaction.balance_effect();
                    }
                }
                // Settled expenses drop out of the fold entirely; the
                // reversal is implied by the settled set
                LedgerEvent::ExpenseSettled { .. } => {}
                // Settlement effects are carried by their transactions
                LedgerEvent::SettlementRecorded { .. } => {}
            }
        }

        balance
    }

    /// Recomputes every balance, repairs the cache where it drifted, and
    /// reports the repairs.
    ///
    /// A healthy ledger returns an empty vector; drift means an external
    /// writer bypassed the single-writer discipline.
    pub fn reconcile(&mut self) -> Vec<BalanceDrift> {
        let mut known: HashSet<PersonId> = self.balances.keys().copied().collect();
        for event in &self.history {
            if let LedgerEvent::ExpenseRecorded { expense, .. } = event {
                for (p, _) in self.expense_deltas(expense) {
                    known.insert(p);
                }
            }
        }

        let mut drifts = Vec::new();
        for person_id in known {
            let derived = self.recompute(&person_id);
            let cached = self.net_balance(&person_id);
            if cached != derived {
                warn!(
                    person = %person_id,
                    %cached,
                    %derived,
                    "balance cache drifted from event log; repairing"
                );
                drifts.push(BalanceDrift {
                    person_id,
                    cached,
                    derived,
                });
                self.balances.insert(person_id, derived);
            }
        }

        drifts
    }

    /// Derived settlement state for one counterparty balance
    pub fn balance_state(&self, person_id: &PersonId) -> BalanceState {
        if self.net_balance(person_id).is_zero() {
            return BalanceState::Settled;
        }

        for event in self.history.iter().rev() {
            if self.event_touches(event, person_id) {
                return match event {
                    LedgerEvent::SettlementRecorded { .. } => BalanceState::PartiallySettled,
                    _ => BalanceState::Unsettled,
                };
            }
        }

        BalanceState::Unsettled
    }

    /// True if the event moved (or could move) this person's balance
    fn event_touches(&self, event: &LedgerEvent, person_id: &PersonId) -> bool {
        match event {
            LedgerEvent::ExpenseRecorded { expense, .. } => self
                .expense_deltas(expense)
                .iter()
                .any(|(p, _)| p == person_id),
            LedgerEvent::ExpenseSettled { expense_id, .. } => self
                .expense(expense_id)
                .map(|e| self.expense_deltas(e).iter().any(|(p, _)| p == person_id))
                .unwrap_or(false),
            LedgerEvent::TransactionRecorded { transaction, .. } => {
                transaction.linked_person == Some(*person_id)
            }
            LedgerEvent::SettlementRecorded { settlement, .. } => {
                matches!(settlement.target, SettlementTarget::Person(p) if p == *person_id)
            }
        }
    }

    /// Signed balance movements for one expense, from the current user's
    /// perspective (positive = they owe you).
    pub(crate) fn expense_deltas(&self, expense: &GroupExpense) -> Vec<(PersonId, Money)> {
        if expense.payer == self.current_user {
            expense
                .participants
                .iter()
                .filter(|p| p.person_id != self.current_user)
                .map(|p| (p.person_id, p.amount))
                .collect()
        } else if let Some(own_share) = expense.share_of(&self.current_user) {
            vec![(expense.payer, -own_share)]
        } else {
            Vec::new()
        }
    }

    /// Applies balance movements to the cache, returning the delta.
    ///
    /// Movements are validated as a whole before the first write, so a
    /// failure leaves the cache untouched.
    pub(crate) fn apply_changes(
        &mut self,
        deltas: &[(PersonId, Money)],
    ) -> Result<LedgerDelta, LedgerError> {
        let mut changes = Vec::with_capacity(deltas.len());

        // Validate pass
        for (person_id, delta) in deltas {
            self.check_currency(delta)?;
            let new_balance = self.net_balance(person_id).checked_add(delta)?;
            changes.push(BalanceChange {
                person_id: *person_id,
                delta: *delta,
                new_balance,
            });
        }

        // Write pass
        for change in &changes {
            self.balances.insert(change.person_id, change.new_balance);
        }

        Ok(LedgerDelta { changes })
    }

    pub(crate) fn push_event(&mut self, event: LedgerEvent) {
        self.history.push(event);
    }

    pub(crate) fn mark_expense_settled(&mut self, expense_id: ExpenseId) {
        self.settled_expenses.insert(expense_id);
    }

    pub(crate) fn check_currency(&self, money: &Money) -> Result<(), LedgerError> {
        if money.currency() != self.currency {
            return Err(LedgerError::Money(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                money.currency().to_string(),
            )));
        }
        Ok(())
    }
}

fn transaction_deltas(transaction: &Transaction) -> Vec<(PersonId, Money)> {
    match transaction.linked_person {
        Some(person_id) => {
            let effect = transaction.balance_effect();
            if effect.is_zero() {
                Vec::new()
            } else {
                vec![(person_id, effect)]
            }
        }
        None => Vec::new(),
    }
}

pub(crate) fn negate(deltas: Vec<(PersonId, Money)>) -> Vec<(PersonId, Money)> {
    deltas.into_iter().map(|(p, m)| (p, -m)).collect()
}

/// Conservation check helper: the deltas an expense produces for the other
/// participants always sum to the payer's fronted amount for them.
pub fn conserved_sum(delta: &LedgerDelta) -> Decimal {
    delta
        .changes
        .iter()
        .fold(Decimal::ZERO, |acc, c| acc + c.delta.amount())
}
