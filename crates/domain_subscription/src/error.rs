//! Subscription domain errors

use chrono::NaiveDate;
use core_kernel::MoneyError;
use thiserror::Error;

/// Errors that can occur in the subscription domain
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// Trial ends before it starts
    #[error("Invalid trial window: starts {started_on}, ends {ends_on}")]
    InvalidTrialWindow {
        started_on: NaiveDate,
        ends_on: NaiveDate,
    },

    /// Money arithmetic failed (currency mismatch)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
