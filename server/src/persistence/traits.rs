//! Async repository trait shared by the durable and transient backends.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send`, which axum handlers and
//! `tokio::spawn` require.

use super::{InsertOutcome, PersistenceError};
use crate::entry::{NewEntry, WaitlistEntry};
use std::future::Future;

/// Storage for waitlist signups, keyed by normalized email.
///
/// Implementations must never hold two entries with the same email.
pub trait WaitlistStore: Send + Sync {
    /// Store `entry` unless its email is already present, in which case the
    /// existing record is returned untouched.
    fn insert_if_absent(
        &self,
        entry: &NewEntry,
    ) -> impl Future<Output = Result<InsertOutcome, PersistenceError>> + Send;

    /// Look up an entry by email. The argument is normalized first.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<WaitlistEntry>, PersistenceError>> + Send;

    /// Recent entries. The durable backend returns at most `limit`, newest
    /// first; the transient backend returns everything in insertion order.
    fn list_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<WaitlistEntry>, PersistenceError>> + Send;
}
