//! Split bills
//!
//! A `GroupExpense` is one shared expense: a payer who fronted the total and
//! an ordered list of participant allocations. Allocations must sum back to
//! the total within one minor unit; the payer's own share (when present)
//! nets out against the amount they fronted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use core_kernel::{ExpenseId, GroupId, Money, PersonId};

use crate::error::LedgerError;
use crate::split::{resolve_shares, Share, SplitKind, SplitMethod};

/// One participant's allocation within a split bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Who this allocation belongs to
    pub person_id: PersonId,
    /// Their share of the total
    pub amount: Money,
}

impl From<Share> for Participant {
    fn from(share: Share) -> Self {
        Self {
            person_id: share.person_id,
            amount: share.amount,
        }
    }
}

/// A shared expense with a payer and per-participant allocations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupExpense {
    /// Stable identifier
    pub id: ExpenseId,
    /// Group this bill belongs to
    pub group_id: GroupId,
    /// Display title ("Dinner at Luigi's")
    pub title: String,
    /// Total amount fronted by the payer
    pub total: Money,
    /// Who paid the bill
    pub payer: PersonId,
    /// Ordered participant allocations
    pub participants: Vec<Participant>,
    /// Which split strategy produced the allocations
    pub method: SplitKind,
    /// Whether this bill has been marked settled
    pub is_settled: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// When the bill was marked settled
    pub settled_at: Option<DateTime<Utc>>,
}

impl GroupExpense {
    /// Resolves shares under `method` and builds the expense in one step.
    ///
    /// # Errors
    ///
    /// Propagates every validation error of
    /// [`resolve_shares`](crate::split::resolve_shares).
    pub fn split(
        group_id: GroupId,
        title: impl Into<String>,
        total: Money,
        payer: PersonId,
        participants: &[PersonId],
        method: &SplitMethod,
    ) -> Result<Self, LedgerError> {
        let shares = resolve_shares(total, participants, method)?;

        Ok(Self {
            id: ExpenseId::new_v7(),
            group_id,
            title: title.into(),
            total,
            payer,
            participants: shares.into_iter().map(Participant::from).collect(),
            method: method.kind(),
            is_settled: false,
            created_at: Utc::now(),
            settled_at: None,
        })
    }

    /// Builds an expense from pre-resolved allocations (the persistence
    /// collaborator's load path). Call [`GroupExpense::validate`] afterwards.
    pub fn from_allocations(
        group_id: GroupId,
        title: impl Into<String>,
        total: Money,
        payer: PersonId,
        participants: Vec<Participant>,
        method: SplitKind,
    ) -> Self {
        Self {
            id: ExpenseId::new_v7(),
            group_id,
            title: title.into(),
            total,
            payer,
            participants,
            method,
            is_settled: false,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Validates the allocation invariants.
    ///
    /// Participants must be non-empty and unique, the total positive, and
    /// the allocations must sum to the total within one minor unit of
    /// rounding tolerance.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.participants.is_empty() {
            return Err(LedgerError::InvalidParticipantSet(
                "expense has no participants".to_string(),
            ));
        }

        let unique: HashSet<_> = self.participants.iter().map(|p| p.person_id).collect();
        if unique.len() != self.participants.len() {
            return Err(LedgerError::InvalidParticipantSet(
                "expense participants must be unique".to_string(),
            ));
        }

        if !self.total.is_positive() {
            return Err(LedgerError::InvalidExpenseAmount(format!(
                "expense total must be positive, got {}",
                self.total.amount()
            )));
        }

        let mut sum = Money::zero(self.total.currency());
        for participant in &self.participants {
            sum = sum.checked_add(&participant.amount)?;
        }

        let drift = (sum.minor_units() - self.total.minor_units()).abs();
        if drift > 1 {
            return Err(LedgerError::ShareMismatch {
                expected: self.total.amount(),
                actual: sum.amount(),
            });
        }

        Ok(())
    }

    /// Returns the allocation for one person, if they participate
    pub fn share_of(&self, person_id: &PersonId) -> Option<Money> {
        self.participants
            .iter()
            .find(|p| p.person_id == *person_id)
            .map(|p| p.amount)
    }

    /// True if the person participates in this bill
    pub fn involves(&self, person_id: &PersonId) -> bool {
        self.payer == *person_id || self.share_of(person_id).is_some()
    }

    /// Marks the bill settled. The ledger drives this through
    /// [`crate::Ledger::settle_expense`] so that balances stay consistent.
    pub(crate) fn mark_settled(&mut self, at: DateTime<Utc>) {
        self.is_settled = true;
        self.settled_at = Some(at);
    }
}
