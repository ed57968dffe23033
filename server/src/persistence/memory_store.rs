use super::traits::WaitlistStore;
use super::{InsertOutcome, PersistenceError};
use crate::entry::{normalize_email, NewEntry, WaitlistEntry};
use tokio::sync::RwLock;

/// Process-local waitlist, used when durable storage is not available.
///
/// Append-only and lost on restart. The existence check and the append run
/// under one write lock, so concurrent signups for the same email cannot
/// both be created.
#[derive(Default)]
pub struct MemoryWaitlistStore {
    entries: RwLock<Vec<WaitlistEntry>>,
}

impl MemoryWaitlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl WaitlistStore for MemoryWaitlistStore {
    async fn insert_if_absent(&self, entry: &NewEntry) -> Result<InsertOutcome, PersistenceError> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.iter().find(|e| e.email == entry.email()) {
            return Ok(InsertOutcome::Conflict(existing.clone()));
        }
        let record = WaitlistEntry::record(entry.clone());
        entries.push(record.clone());
        tracing::debug!(email = %record.email, total = entries.len(), "Stored waitlist entry in memory");
        Ok(InsertOutcome::Created(record))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistEntry>, PersistenceError> {
        let email = normalize_email(email);
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.email == email).cloned())
    }

    async fn list_recent(&self, _limit: usize) -> Result<Vec<WaitlistEntry>, PersistenceError> {
        // Insertion order, uncapped.
        Ok(self.entries.read().await.clone())
    }
}
