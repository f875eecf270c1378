//! Ledger domain errors
//!
//! Every variant is a validation failure on caller-supplied input. None of
//! them is transient, so there is no retry policy here: callers correct the
//! input and resubmit. Validation always runs before any state is touched.

use core_kernel::MoneyError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Empty participant set, duplicate participants, or per-participant
    /// parameters that do not line up with the participant list
    #[error("Invalid participant set: {0}")]
    InvalidParticipantSet(String),

    /// Exact amounts do not sum to the expense total
    #[error("Shares don't add up to the total: expected {expected}, got {actual}")]
    ShareMismatch { expected: Decimal, actual: Decimal },

    /// Percentages do not sum to 100 (within ±0.01)
    #[error("Percentages must sum to 100, got {total}")]
    PercentageMismatch { total: Decimal },

    /// Adjustment deltas do not sum to zero
    #[error("Adjustments must sum to zero, got {net}")]
    AdjustmentImbalance { net: Decimal },

    /// Expense total is not a positive amount
    #[error("Invalid expense amount: {0}")]
    InvalidExpenseAmount(String),

    /// Settlement amount is zero or negative, or there is nothing to settle
    #[error("Invalid settlement amount: {0}")]
    InvalidSettlementAmount(String),

    /// Partial settlement larger than the outstanding balance
    #[error("Settlement of {amount} exceeds outstanding balance of {outstanding}")]
    SettlementExceedsBalance {
        amount: Decimal,
        outstanding: Decimal,
    },

    /// Referenced expense is not in this ledger's history
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    /// Split bill has already been marked settled
    #[error("Expense already settled: {0}")]
    ExpenseAlreadySettled(String),

    /// Money arithmetic failed (currency mismatch, division by zero)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
