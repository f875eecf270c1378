//! Core error types shared across the system

use crate::money::MoneyError;
use thiserror::Error;

/// Core error type for the kernel
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};
    use rust_decimal_macros::dec;

    #[test]
    fn constructors_and_display() {
        assert_eq!(
            CoreError::validation("bad input").to_string(),
            "Validation error: bad input"
        );
        assert_eq!(
            CoreError::not_found("person 42").to_string(),
            "Not found: person 42"
        );
    }

    #[test]
    fn money_errors_convert() {
        let usd = Money::new(dec!(1), Currency::USD);
        let eur = Money::new(dec!(1), Currency::EUR);
        let err: CoreError = usd.checked_add(&eur).unwrap_err().into();
        assert!(matches!(err, CoreError::Money(_)));
    }
}
