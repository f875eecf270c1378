//! Core Kernel - foundational types for the ledger & settlement engine
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Money with precise decimal arithmetic and minor-unit splitting
//! - Strongly-typed identifiers
//! - Common error types

pub mod error;
pub mod identifiers;
pub mod money;

pub use error::CoreError;
pub use identifiers::{
    ExpenseId, GroupId, PersonId, SettlementId, SubscriptionId, TransactionId,
};
pub use money::{Currency, Money, MoneyError};
