//! Collaborator ports
//!
//! The engine is a library sandwiched between external collaborators:
//! persistence loads and stores the event log, notifications get told about
//! balance movements, and the UI reads aggregates. These traits are the
//! seams; adapters live outside this crate. The engine itself never blocks
//! on them: persistence and notification side effects are dispatched by the
//! caller after the in-memory computation completes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{Money, PersonId};

use crate::events::LedgerEvent;

/// Error type for port adapter failures
///
/// The engine never raises these; they belong to the adapters wrapping it,
/// as do timeouts and retries.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Stored data could not be decoded
    #[error("Corrupt data: {message}")]
    CorruptData { message: String },
}

/// Persistence collaborator seam: durable storage for the event log.
///
/// A ledger is restored with [`crate::Ledger::from_events`] over
/// `load_events`, and every mutation's new events are handed to
/// `append_events` after the in-memory computation succeeds.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Loads the full event log for one user's ledger
    async fn load_events(&self, user: PersonId) -> Result<Vec<LedgerEvent>, PortError>;

    /// Appends new events to the user's log
    async fn append_events(
        &self,
        user: PersonId,
        events: &[LedgerEvent],
    ) -> Result<(), PortError>;
}

/// Payload for the notification collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// Whose balance moved
    pub person_id: PersonId,
    /// The balance after the move
    pub new_balance: Money,
}

/// Notification collaborator seam, fire-and-forget.
///
/// Told about every balance movement (see
/// [`crate::LedgerDelta::notifications`]) so it can schedule or cancel
/// reminders. Failures are the adapter's problem; the engine never waits.
pub trait BalanceNotifier: Send + Sync {
    /// Reports one balance movement
    fn balance_changed(&self, update: BalanceUpdate);
}
