//! The append-only ledger event log
//!
//! Every balance-affecting action is captured as an event. The cached
//! per-person balances are a fold over this log, which makes auditing and
//! recovery straightforward: replay the log, get the same balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::ExpenseId;

use crate::expense::GroupExpense;
use crate::settlement::Settlement;
use crate::transaction::Transaction;

/// A balance-affecting event in the ledger history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A split bill was recorded
    ExpenseRecorded {
        expense: GroupExpense,
        timestamp: DateTime<Utc>,
    },

    /// A split bill was marked settled; its allocations no longer count
    ExpenseSettled {
        expense_id: ExpenseId,
        timestamp: DateTime<Utc>,
    },

    /// A direct income/expense transaction was recorded
    TransactionRecorded {
        transaction: Transaction,
        timestamp: DateTime<Utc>,
    },

    /// A settlement was applied against a person or group
    SettlementRecorded {
        settlement: Settlement,
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// When the event entered the log
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::ExpenseRecorded { timestamp, .. }
            | LedgerEvent::ExpenseSettled { timestamp, .. }
            | LedgerEvent::TransactionRecorded { timestamp, .. }
            | LedgerEvent::SettlementRecorded { timestamp, .. } => *timestamp,
        }
    }
}
