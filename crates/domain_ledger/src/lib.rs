//! Ledger Domain - who owes whom, and how settlements change that
//!
//! This crate is the core of the expense tracker: it computes per-person
//! shares for split bills, maintains the signed net balance between the
//! current user and every other person, and applies full or partial
//! settlements against those balances.
//!
//! # Model
//!
//! The ledger is strictly user-centric: every balance is signed from the
//! current user's perspective (positive = they owe you, negative = you owe
//! them). Balance-affecting activity is kept as an append-only event log;
//! the cached per-person balances are a fold over that log and can always be
//! rebuilt from it.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{Ledger, GroupExpense, SplitMethod, SettlementMode};
//!
//! let mut ledger = Ledger::new(me, Currency::USD);
//!
//! let dinner = GroupExpense::split(
//!     group, "Dinner", total, me, &[me, alice, bob], &SplitMethod::Equally,
//! )?;
//! ledger.record_expense(dinner)?;
//!
//! // Alice pays back part of what she owes
//! ledger.settle(alice, SettlementMode::Partial(amount))?;
//! ```

pub mod error;
pub mod events;
pub mod expense;
pub mod ledger;
pub mod party;
pub mod ports;
pub mod settlement;
pub mod split;
pub mod transaction;

pub use error::LedgerError;
pub use events::LedgerEvent;
pub use expense::{GroupExpense, Participant};
pub use ledger::{BalanceChange, BalanceState, Ledger, LedgerDelta};
pub use party::{Group, Person};
pub use ports::{BalanceNotifier, BalanceUpdate, LedgerStore, PortError};
pub use settlement::{
    Settlement, SettlementDirection, SettlementMode, SettlementResult, SettlementTarget,
};
pub use split::{resolve_shares, Share, SplitKind, SplitMethod};
pub use transaction::{Transaction, TransactionKind};
