//! Waitlist repository: routes each call to the durable or transient backend.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::sqlite::{Database, SqliteWaitlistRepository};
use super::traits::WaitlistStore;
use super::{
    ConnectionManager, Degradation, InsertOutcome, MemoryWaitlistStore, PersistenceError, Served,
};
use crate::entry::{NewEntry, WaitlistEntry};

/// Cap applied to durable listings when the caller has no preference.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Durable collection holding signups.
pub const WAITLIST_COLLECTION: &str = "waitlists";

/// Durable-store statistics for operational tooling.
///
/// Serializes to exactly `{"connected": false}` when not connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreStatus {
    pub fn disconnected() -> Self {
        Self::default()
    }
}

enum Route {
    Durable(Database),
    Transient(Degradation),
}

/// Data access for waitlist signups.
///
/// Every operation re-reads the connection state; no handle is kept
/// between calls, since the pool can close underneath us at any time.
pub struct WaitlistRepository {
    connections: ConnectionManager,
    memory: Arc<MemoryWaitlistStore>,
}

impl WaitlistRepository {
    pub fn new(connections: ConnectionManager) -> Self {
        Self::with_memory(connections, Arc::new(MemoryWaitlistStore::new()))
    }

    pub fn with_memory(connections: ConnectionManager, memory: Arc<MemoryWaitlistStore>) -> Self {
        Self {
            connections,
            memory,
        }
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn memory(&self) -> &MemoryWaitlistStore {
        &self.memory
    }

    async fn route(&self) -> Route {
        if !self.connections.is_configured() {
            return Route::Transient(Degradation::NotConfigured);
        }
        let Some(db) = self.connections.ensure_connected().await else {
            return Route::Transient(Degradation::Unavailable);
        };
        if self.connections.is_connected().await {
            Route::Durable(db)
        } else {
            Route::Transient(Degradation::Unavailable)
        }
    }

    /// Record a signup unless its email is already on the waitlist.
    ///
    /// Any durable failure, including one after the existence check, is
    /// logged and the whole operation replays against the transient store.
    pub async fn insert_if_absent(
        &self,
        entry: &NewEntry,
    ) -> Result<Served<InsertOutcome>, PersistenceError> {
        let degradation = match self.route().await {
            Route::Durable(db) => {
                let durable = SqliteWaitlistRepository::new(db.pool().clone());
                match durable.insert_if_absent(entry).await {
                    Ok(outcome) => return Ok(Served::durable(outcome)),
                    Err(e) => {
                        tracing::warn!(email = %entry.email(), error = %e, "Durable insert failed; falling back to memory");
                        Degradation::DurableFailed(e.to_string())
                    }
                }
            }
            Route::Transient(reason) => reason,
        };

        let outcome = self.memory.insert_if_absent(entry).await?;
        Ok(Served::transient(outcome, degradation))
    }

    /// Recent signups: newest first and capped when durable, the whole
    /// in-memory list in insertion order otherwise.
    pub async fn list_recent(
        &self,
        limit: usize,
    ) -> Result<Served<Vec<WaitlistEntry>>, PersistenceError> {
        let degradation = match self.route().await {
            Route::Durable(db) => {
                let durable = SqliteWaitlistRepository::new(db.pool().clone());
                match durable.list_recent(limit).await {
                    Ok(entries) => return Ok(Served::durable(entries)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Durable listing failed; falling back to memory");
                        Degradation::DurableFailed(e.to_string())
                    }
                }
            }
            Route::Transient(reason) => reason,
        };

        let entries = self.memory.list_recent(limit).await?;
        Ok(Served::transient(entries, degradation))
    }

    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Served<Option<WaitlistEntry>>, PersistenceError> {
        let degradation = match self.route().await {
            Route::Durable(db) => {
                let durable = SqliteWaitlistRepository::new(db.pool().clone());
                match durable.find_by_email(email).await {
                    Ok(found) => return Ok(Served::durable(found)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Durable lookup failed; falling back to memory");
                        Degradation::DurableFailed(e.to_string())
                    }
                }
            }
            Route::Transient(reason) => reason,
        };

        let found = self.memory.find_by_email(email).await?;
        Ok(Served::transient(found, degradation))
    }

    /// Collections and entry count of the durable store.
    ///
    /// Reads the current state without connecting; enumeration failures are
    /// reported inside the status rather than returned.
    pub async fn status(&self) -> StoreStatus {
        let Some(db) = self.connections.current().await else {
            return StoreStatus::disconnected();
        };

        match collect_stats(&db).await {
            Ok((collections, entry_count)) => StoreStatus {
                connected: true,
                database: Some(db.name().to_string()),
                collections: Some(collections),
                entry_count,
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to enumerate durable collections");
                StoreStatus {
                    connected: true,
                    error: Some(e.to_string()),
                    ..StoreStatus::default()
                }
            }
        }
    }
}

async fn collect_stats(db: &Database) -> Result<(Vec<String>, Option<u64>), PersistenceError> {
    let collections = db.collection_names().await?;
    let entry_count = if collections.iter().any(|c| c == WAITLIST_COLLECTION) {
        Some(SqliteWaitlistRepository::new(db.pool().clone()).count().await?)
    } else {
        None
    };
    Ok((collections, entry_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::testing::file_settings;
    use crate::persistence::{ConnectionState, StorageMode};

    fn signup(name: &str, email: &str) -> NewEntry {
        NewEntry::parse(Some(name), Some(email), None, None).unwrap()
    }

    fn degraded_repo() -> WaitlistRepository {
        WaitlistRepository::new(ConnectionManager::new(None))
    }

    fn durable_repo(dir: &std::path::Path) -> WaitlistRepository {
        WaitlistRepository::new(ConnectionManager::new(Some(file_settings(dir))))
    }

    #[tokio::test]
    async fn test_unconfigured_uses_transient() {
        let repo = degraded_repo();
        let served = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(served.storage, StorageMode::Transient);
        assert_eq!(served.degradation, Some(Degradation::NotConfigured));
        assert!(served.value.is_created());
        assert_eq!(repo.connections().state().await, ConnectionState::Unattempted);
    }

    #[tokio::test]
    async fn test_case_and_whitespace_variants_conflict_in_memory() {
        let repo = degraded_repo();
        let first = repo
            .insert_if_absent(&NewEntry::parse(Some("Ann"), Some("Ann@Example.com"), None, None).unwrap())
            .await
            .unwrap();
        let second = repo
            .insert_if_absent(&NewEntry::parse(Some("Ann"), Some("ann@example.com "), None, None).unwrap())
            .await
            .unwrap();

        assert!(first.value.is_created());
        assert_eq!(second.storage, StorageMode::Transient);
        assert_eq!(second.value, InsertOutcome::Conflict(first.value.entry().clone()));
    }

    #[tokio::test]
    async fn test_durable_insert_and_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(dir.path());

        let first = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(first.storage, StorageMode::Durable);
        assert_eq!(first.degradation, None);
        assert!(first.value.is_created());

        let second = repo.insert_if_absent(&signup("Ann", "ANN@example.com")).await.unwrap();
        assert_eq!(second.storage, StorageMode::Durable);
        assert_eq!(second.value, InsertOutcome::Conflict(first.value.entry().clone()));
        assert!(repo.memory().is_empty().await);
    }

    #[tokio::test]
    async fn test_unreachable_store_uses_transient() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(&dir.path().join("missing"));

        let served = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(served.storage, StorageMode::Transient);
        assert_eq!(served.degradation, Some(Degradation::Unavailable));
    }

    #[tokio::test]
    async fn test_write_failure_falls_back_to_transient() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(dir.path());
        let db = repo.connections().ensure_connected().await.unwrap();

        // Lookups succeed, writes fail.
        sqlx::query(
            "CREATE TRIGGER reject_signups BEFORE INSERT ON waitlists
             BEGIN SELECT RAISE(ABORT, 'disk quota exceeded'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let served = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(served.storage, StorageMode::Transient);
        assert!(matches!(served.degradation, Some(Degradation::DurableFailed(_))));
        assert!(served.value.is_created());

        // Health flag is untouched; the next call still tries durable first.
        assert!(repo.connections().is_connected().await);
        let again = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(again.storage, StorageMode::Transient);
        assert!(!again.value.is_created());
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_transient() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(dir.path());
        let db = repo.connections().ensure_connected().await.unwrap();

        sqlx::query("DROP TABLE waitlists").execute(db.pool()).await.unwrap();

        let served = repo.insert_if_absent(&signup("Bob", "bob@example.com")).await.unwrap();
        assert_eq!(served.storage, StorageMode::Transient);
        assert!(served.value.is_created());

        let listed = repo.list_recent(DEFAULT_LIST_LIMIT).await.unwrap();
        assert_eq!(listed.storage, StorageMode::Transient);
        assert_eq!(listed.value.len(), 1);
    }

    #[tokio::test]
    async fn test_durable_listing_is_capped_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(dir.path());
        for i in 0..(DEFAULT_LIST_LIMIT + 3) {
            repo.insert_if_absent(&signup("User", &format!("user{i}@example.com")))
                .await
                .unwrap();
        }

        let listed = repo.list_recent(DEFAULT_LIST_LIMIT).await.unwrap();
        assert_eq!(listed.storage, StorageMode::Durable);
        assert_eq!(listed.value.len(), DEFAULT_LIST_LIMIT);
        assert_eq!(
            listed.value[0].email,
            format!("user{}@example.com", DEFAULT_LIST_LIMIT + 2)
        );
    }

    #[tokio::test]
    async fn test_transient_listing_is_insertion_order() {
        let repo = degraded_repo();
        for name in ["first", "second", "third"] {
            repo.insert_if_absent(&signup(name, &format!("{name}@example.com")))
                .await
                .unwrap();
        }

        let listed = repo.list_recent(1).await.unwrap();
        assert_eq!(listed.storage, StorageMode::Transient);
        let names: Vec<_> = listed.value.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_find_by_email_reports_mode() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(dir.path());
        repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();

        let found = repo.find_by_email(" Ann@Example.com").await.unwrap();
        assert_eq!(found.storage, StorageMode::Durable);
        assert_eq!(found.value.map(|e| e.name), Some("Ann".to_string()));

        let missing = degraded_repo().find_by_email("ann@example.com").await.unwrap();
        assert_eq!(missing.storage, StorageMode::Transient);
        assert_eq!(missing.value, None);
    }

    #[tokio::test]
    async fn test_status_never_connected_is_bare() {
        let repo = degraded_repo();
        let status = repo.status().await;
        assert_eq!(status, StoreStatus::disconnected());
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({ "connected": false })
        );
    }

    #[tokio::test]
    async fn test_status_connected_reports_collections_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(dir.path());
        repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        repo.insert_if_absent(&signup("Bob", "bob@example.com")).await.unwrap();

        let status = repo.status().await;
        assert!(status.connected);
        assert_eq!(status.database.as_deref(), Some("waitlist"));
        assert_eq!(status.collections, Some(vec![WAITLIST_COLLECTION.to_string()]));
        assert_eq!(status.entry_count, Some(2));
        assert_eq!(status.error, None);
    }

    #[tokio::test]
    async fn test_status_without_waitlist_collection_omits_count() {
        let dir = tempfile::tempdir().unwrap();
        let repo = durable_repo(dir.path());
        let db = repo.connections().ensure_connected().await.unwrap();
        sqlx::query("DROP TABLE waitlists").execute(db.pool()).await.unwrap();

        let status = repo.status().await;
        assert!(status.connected);
        assert_eq!(status.collections, Some(vec![]));
        assert_eq!(status.entry_count, None);
    }

    #[tokio::test]
    async fn test_status_error_shape() {
        let status = StoreStatus {
            connected: true,
            error: Some("boom".into()),
            ..StoreStatus::default()
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({ "connected": true, "error": "boom" })
        );
    }
}
