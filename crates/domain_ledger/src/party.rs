//! People and groups
//!
//! `Person` and `Group` are value objects owned by the persistence
//! collaborator. The ledger operates on them by id only and hands back
//! updated copies; it never keeps long-lived references to either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, GroupId, Money, PersonId};

use crate::error::LedgerError;
use crate::expense::GroupExpense;

/// Another person the current user settles up with
///
/// `balance` is signed from the current user's perspective: positive means
/// they owe you, negative means you owe them. It is a write-through cache of
/// the ledger fold, never an independent source of truth; see
/// [`crate::Ledger::recompute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Stable identifier
    pub id: PersonId,
    /// Display name
    pub display_name: String,
    /// Optional reference into the device contact book
    pub contact_ref: Option<String>,
    /// Cached net balance versus the current user
    pub balance: Money,
}

impl Person {
    /// Creates a person with a zero balance
    pub fn new(display_name: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: PersonId::new_v7(),
            display_name: display_name.into(),
            contact_ref: None,
            balance: Money::zero(currency),
        }
    }

    /// Attaches a contact-book reference
    pub fn with_contact_ref(mut self, contact_ref: impl Into<String>) -> Self {
        self.contact_ref = Some(contact_ref.into());
        self
    }

    /// Returns a copy carrying a freshly computed balance
    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = balance;
        self
    }

    /// True if this person owes the current user
    pub fn owes_user(&self) -> bool {
        self.balance.is_positive()
    }

    /// True if the current user owes this person
    pub fn user_owes(&self) -> bool {
        self.balance.is_negative()
    }
}

/// A named set of people who share expenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Stable identifier
    pub id: GroupId,
    /// Display name
    pub name: String,
    /// Member ids, in insertion order, unique
    pub members: Vec<PersonId>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Creates a group with the given members (duplicates dropped)
    pub fn new(name: impl Into<String>, members: Vec<PersonId>) -> Self {
        let mut group = Self {
            id: GroupId::new_v7(),
            name: name.into(),
            members: Vec::new(),
            created_at: Utc::now(),
        };
        for member in members {
            group.add_member(member);
        }
        group
    }

    /// Adds a member, keeping the list unique; returns true if added
    pub fn add_member(&mut self, person_id: PersonId) -> bool {
        if self.members.contains(&person_id) {
            return false;
        }
        self.members.push(person_id);
        true
    }

    /// True if the person is a member
    pub fn contains(&self, person_id: &PersonId) -> bool {
        self.members.contains(person_id)
    }

    /// Checks that an expense only involves members of this group.
    ///
    /// The payer and every participant must be members; the UI adds missing
    /// members before recording, so a violation here is a caller bug.
    pub fn validate_expense(&self, expense: &GroupExpense) -> Result<(), LedgerError> {
        if !self.contains(&expense.payer) {
            return Err(LedgerError::InvalidParticipantSet(format!(
                "payer {} is not a member of group {}",
                expense.payer, self.id
            )));
        }

        for participant in &expense.participants {
            if !self.contains(&participant.person_id) {
                return Err(LedgerError::InvalidParticipantSet(format!(
                    "participant {} is not a member of group {}",
                    participant.person_id, self.id
                )));
            }
        }

        Ok(())
    }
}
