//! Waitlist persistence.
//!
//! Signups live in one of two interchangeable backends behind
//! [`traits::WaitlistStore`]:
//! - the durable SQLite collection in [`sqlite`], used while the
//!   [`ConnectionManager`] reports a live connection;
//! - the process-local [`MemoryWaitlistStore`], used whenever the durable
//!   backend is unconfigured, unreachable, or fails mid-operation.
//!
//! [`WaitlistRepository`] chooses between them on every call and reports
//! the choice through [`Served`].

mod connection;
mod memory_store;
pub mod sqlite;
pub mod traits;
mod waitlist;

pub use connection::{ConnectionManager, ConnectionState};
pub use memory_store::MemoryWaitlistStore;
pub use waitlist::{StoreStatus, WaitlistRepository, DEFAULT_LIST_LIMIT, WAITLIST_COLLECTION};

use crate::entry::WaitlistEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Timed out after {0:?} connecting to the database")]
    ConnectTimeout(std::time::Duration),
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

/// Which backend served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Durable,
    Transient,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Durable => "durable",
            StorageMode::Transient => "transient",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the transient backend served a request instead of the durable one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// No connection string; the process runs on memory for its lifetime.
    NotConfigured,
    /// Configured, but no live connection could be obtained.
    Unavailable,
    /// Connected, but the durable operation failed and was replayed in memory.
    DurableFailed(String),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::NotConfigured => f.write_str("durable storage is not configured"),
            Degradation::Unavailable => f.write_str("durable storage is unavailable"),
            Degradation::DurableFailed(reason) => {
                write!(f, "durable operation failed: {reason}")
            }
        }
    }
}

/// A repository result together with the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served<T> {
    pub value: T,
    pub storage: StorageMode,
    pub degradation: Option<Degradation>,
}

impl<T> Served<T> {
    pub fn durable(value: T) -> Self {
        Self {
            value,
            storage: StorageMode::Durable,
            degradation: None,
        }
    }

    pub fn transient(value: T, degradation: Degradation) -> Self {
        Self {
            value,
            storage: StorageMode::Transient,
            degradation: Some(degradation),
        }
    }
}

/// Result of an insert-if-absent keyed by normalized email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(WaitlistEntry),
    /// The email was already registered; carries the original record.
    Conflict(WaitlistEntry),
}

impl InsertOutcome {
    pub fn entry(&self) -> &WaitlistEntry {
        match self {
            InsertOutcome::Created(entry) | InsertOutcome::Conflict(entry) => entry,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}
