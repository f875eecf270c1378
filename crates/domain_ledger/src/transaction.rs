//! Generic ledger-adjacent records
//!
//! A `Transaction` is a non-split income or expense. When it carries a
//! `linked_person`, it moves that person's balance; settlements also emit a
//! transaction so the activity feed and the settlement audit trail stay
//! consistent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PersonId, SettlementId, TransactionId};

/// Direction of a transaction from the current user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money came in (salary, a friend paying you back)
    Income,
    /// Money went out (a purchase, paying a friend back)
    Expense,
}

/// A generic income/expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identifier
    pub id: TransactionId,
    /// Display title
    pub title: String,
    /// Magnitude; always non-negative, direction lives in `kind`
    pub amount: Money,
    /// Direction
    pub kind: TransactionKind,
    /// Person whose balance this record moves, if any
    pub linked_person: Option<PersonId>,
    /// Set when this transaction was produced by a settlement
    pub settlement_id: Option<SettlementId>,
    /// When the transaction occurred
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a transaction with no person link
    pub fn new(title: impl Into<String>, amount: Money, kind: TransactionKind) -> Self {
        Self {
            id: TransactionId::new_v7(),
            title: title.into(),
            amount: amount.abs(),
            kind,
            linked_person: None,
            settlement_id: None,
            occurred_at: Utc::now(),
        }
    }

    /// Links the transaction to a person so it affects their balance
    pub fn with_linked_person(mut self, person_id: PersonId) -> Self {
        self.linked_person = Some(person_id);
        self
    }

    /// Tags the transaction as produced by a settlement
    pub fn with_settlement(mut self, settlement_id: SettlementId) -> Self {
        self.settlement_id = Some(settlement_id);
        self
    }

    /// True if this transaction came out of a settlement
    pub fn is_settlement(&self) -> bool {
        self.settlement_id.is_some()
    }

    /// Signed effect on the linked person's balance.
    ///
    /// An expense on someone's behalf raises what they owe you (+amount); an
    /// income from them lowers it (−amount). Unlinked transactions move no
    /// balance.
    pub fn balance_effect(&self) -> Money {
        if self.linked_person.is_none() {
            return Money::zero(self.amount.currency());
        }
        match self.kind {
            TransactionKind::Expense => self.amount,
            TransactionKind::Income => -self.amount,
        }
    }
}
