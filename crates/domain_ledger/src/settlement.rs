//! Settlement Processor
//!
//! Settlements are a layer on top of the expense history: applying one
//! appends an immutable `Settlement` record plus a settlement-tagged
//! `Transaction`, and never rewrites a prior expense. Repeated calls are
//! deliberately not idempotent (every call appends a new record), so
//! callers own the double-submit problem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ExpenseId, GroupId, Money, PersonId, SettlementId};

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::expense::GroupExpense;
use crate::ledger::{negate, Ledger, LedgerDelta};
use crate::transaction::{Transaction, TransactionKind};

/// Who handed over money in a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementDirection {
    /// The current user paid off what they owed
    UserPaid,
    /// The counterparty paid the current user back
    UserReceived,
}

/// How much of the outstanding balance to settle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettlementMode {
    /// Zero the balance entirely
    Full,
    /// Pay off part of it
    Partial(Money),
}

/// What a settlement was applied against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementTarget {
    Person(PersonId),
    Group(GroupId),
}

/// An immutable settlement record, the audit trail.
///
/// Created exactly once per settlement action, never modified or deleted
/// afterward; corrections are new settlements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Stable identifier
    pub id: SettlementId,
    /// Person or group settled against
    pub target: SettlementTarget,
    /// Settled amount, always positive
    pub amount: Money,
    /// Who paid whom
    pub direction: SettlementDirection,
    /// Whether this zeroed the balance
    pub is_full: bool,
    /// When the settlement happened
    pub settled_at: DateTime<Utc>,
}

/// Outcome of settling against a person
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementResult {
    /// The audit record
    pub settlement: Settlement,
    /// The activity-feed record carrying the balance effect
    pub transaction: Transaction,
    /// Balance before the settlement
    pub prior_balance: Money,
    /// Balance after the settlement
    pub new_balance: Money,
}

/// Outcome of marking a whole split bill settled
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSettlement {
    /// The audit record (group-targeted)
    pub settlement: Settlement,
    /// Updated expense value object for the persistence collaborator
    pub expense: GroupExpense,
    /// Balance movements from removing the bill's allocations
    pub delta: LedgerDelta,
}

impl Ledger {
    /// Settles the outstanding balance with one person, fully or partially.
    ///
    /// Full settlement zeroes the balance and records `amount =
    /// |prior balance|`; partial settlement moves the balance toward zero by
    /// `amount`. The direction is derived from the prior balance's sign:
    /// `UserPaid` when the user owed, `UserReceived` when they were owed.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidSettlementAmount`]: zero/negative partial
    ///   amount, or nothing outstanding to settle
    /// - [`LedgerError::SettlementExceedsBalance`]: partial amount larger
    ///   than the outstanding balance
    ///
    /// Nothing is recorded when validation fails.
    pub fn settle(
        &mut self,
        target: PersonId,
        mode: SettlementMode,
    ) -> Result<SettlementResult, LedgerError> {
        let prior_balance = self.net_balance(&target);

        let amount = match mode {
            SettlementMode::Full => {
                if prior_balance.is_zero() {
                    return Err(LedgerError::InvalidSettlementAmount(format!(
                        "nothing outstanding with {}",
                        target
                    )));
                }
                prior_balance.abs()
            }
            SettlementMode::Partial(amount) => {
                self.check_currency(&amount)?;
                if !amount.is_positive() {
                    return Err(LedgerError::InvalidSettlementAmount(format!(
                        "settlement amount must be positive, got {}",
                        amount.amount()
                    )));
                }
                if amount.amount() > prior_balance.abs().amount() {
                    return Err(LedgerError::SettlementExceedsBalance {
                        amount: amount.amount(),
                        outstanding: prior_balance.abs().amount(),
                    });
                }
                amount
            }
        };

        let direction = if prior_balance.is_negative() {
            SettlementDirection::UserPaid
        } else {
            SettlementDirection::UserReceived
        };

        let settlement = Settlement {
            id: SettlementId::new_v7(),
            target: SettlementTarget::Person(target),
            amount,
            direction,
            is_full: matches!(mode, SettlementMode::Full),
            settled_at: Utc::now(),
        };

        // The balance effect rides on a settlement-tagged transaction so the
        // activity feed and the audit trail stay consistent.
        let kind = match direction {
            SettlementDirection::UserPaid => TransactionKind::Expense,
            SettlementDirection::UserReceived => TransactionKind::Income,
        };
        let transaction = Transaction::new("Settlement", amount, kind)
            .with_linked_person(target)
            .with_settlement(settlement.id);

        let effect = transaction.balance_effect();
        let delta = self.apply_changes(&[(target, effect)])?;
        let new_balance = delta
            .changes
            .first()
            .map(|change| change.new_balance)
            .unwrap_or(prior_balance);

        tracing::debug!(
            %target,
            amount = %settlement.amount,
            full = settlement.is_full,
            %prior_balance,
            %new_balance,
            "settlement applied"
        );

        self.push_event(LedgerEvent::TransactionRecorded {
            transaction: transaction.clone(),
            timestamp: transaction.occurred_at,
        });
        self.push_event(LedgerEvent::SettlementRecorded {
            settlement: settlement.clone(),
            timestamp: settlement.settled_at,
        });

        Ok(SettlementResult {
            settlement,
            transaction,
            prior_balance,
            new_balance,
        })
    }

    /// Marks one split bill settled.
    ///
    /// Removes exactly that bill's allocations from the affected balances
    /// (the bill drops out of the recompute fold) and appends a
    /// group-targeted settlement record. The original expense event is left
    /// untouched in the history.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ExpenseNotFound`]: id not in this ledger's history
    /// - [`LedgerError::ExpenseAlreadySettled`]: the bill was settled before
    pub fn settle_expense(
        &mut self,
        expense_id: ExpenseId,
    ) -> Result<ExpenseSettlement, LedgerError> {
        let mut expense = self
            .expense(&expense_id)
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))?
            .clone();

        if self.is_expense_settled(&expense_id) {
            return Err(LedgerError::ExpenseAlreadySettled(expense_id.to_string()));
        }

        let reversal = negate(self.expense_deltas(&expense));
        let delta = self.apply_changes(&reversal)?;
        self.mark_expense_settled(expense_id);

        let now = Utc::now();
        expense.mark_settled(now);

        let direction = if expense.payer == self.current_user() {
            SettlementDirection::UserReceived
        } else {
            SettlementDirection::UserPaid
        };

        let settlement = Settlement {
            id: SettlementId::new_v7(),
            target: SettlementTarget::Group(expense.group_id),
            amount: expense.total,
            direction,
            is_full: true,
            settled_at: now,
        };

        self.push_event(LedgerEvent::ExpenseSettled {
            expense_id,
            timestamp: now,
        });
        self.push_event(LedgerEvent::SettlementRecorded {
            settlement: settlement.clone(),
            timestamp: now,
        });

        Ok(ExpenseSettlement {
            settlement,
            expense,
            delta,
        })
    }
}
