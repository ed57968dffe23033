//! SQLite-backed repository for waitlist signups.

use sqlx::SqlitePool;

use super::helpers::{decode_row, encode_created_at, WaitlistRow};
use crate::entry::{normalize_email, NewEntry, WaitlistEntry};
use crate::persistence::traits::WaitlistStore;
use crate::persistence::{InsertOutcome, PersistenceError};

/// SQLite implementation of [`WaitlistStore`].
pub struct SqliteWaitlistRepository {
    pool: SqlitePool,
}

impl SqliteWaitlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<u64, PersistenceError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM waitlists")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }
}

impl WaitlistStore for SqliteWaitlistRepository {
    async fn insert_if_absent(&self, entry: &NewEntry) -> Result<InsertOutcome, PersistenceError> {
        if let Some(existing) = self.find_by_email(entry.email()).await? {
            return Ok(InsertOutcome::Conflict(existing));
        }

        let record = WaitlistEntry::record(entry.clone());
        let result = sqlx::query(
            r#"
            INSERT INTO waitlists
                (id, name, email, phone_number, preferred_plan, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone_number)
        .bind(record.preferred_plan.as_str())
        .bind(encode_created_at(&record.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Created(record)),
            // A concurrent signup won between our lookup and insert; the
            // unique index is the authority on duplicates.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!(email = %record.email, "Unique index rejected concurrent signup");
                match self.find_by_email(&record.email).await? {
                    Some(existing) => Ok(InsertOutcome::Conflict(existing)),
                    None => Err(sqlx::Error::Database(db_err).into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistEntry>, PersistenceError> {
        let row: Option<WaitlistRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, phone_number, preferred_plan, created_at
            FROM waitlists
            WHERE email = ?
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        row.map(decode_row).transpose()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<WaitlistEntry>, PersistenceError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<WaitlistRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, phone_number, preferred_plan, created_at
            FROM waitlists
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(decode_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PreferredPlan;
    use crate::persistence::sqlite::testing;
    use crate::persistence::sqlite::Database;
    use std::sync::Arc;

    async fn test_db(dir: &std::path::Path) -> (Database, SqliteWaitlistRepository) {
        let db = testing::open_file(dir).await;
        let repo = SqliteWaitlistRepository::new(db.pool().clone());
        (db, repo)
    }

    fn signup(name: &str, email: &str) -> NewEntry {
        NewEntry::parse(Some(name), Some(email), Some("555-0100"), Some("enterprise")).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, repo) = test_db(dir.path()).await;

        let outcome = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        assert!(outcome.is_created());

        let loaded = repo.find_by_email("ANN@example.com ").await.unwrap().unwrap();
        assert_eq!(&loaded, outcome.entry());
        assert_eq!(loaded.preferred_plan, PreferredPlan::Enterprise);
        assert_eq!(loaded.phone_number, "555-0100");
    }

    #[tokio::test]
    async fn test_find_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, repo) = test_db(dir.path()).await;
        assert_eq!(repo.find_by_email("nobody@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mixed_case_first_signup_still_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, repo) = test_db(dir.path()).await;

        let first = repo.insert_if_absent(&signup("Ann", " Ann@Example.com")).await.unwrap();
        assert_eq!(first.entry().email, "ann@example.com");

        let second = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        assert_eq!(second, InsertOutcome::Conflict(first.entry().clone()));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_returns_original() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, repo) = test_db(dir.path()).await;

        let first = repo.insert_if_absent(&signup("Ann", "ann@example.com")).await.unwrap();
        let second = repo
            .insert_if_absent(&signup("Someone Else", "ann@example.com"))
            .await
            .unwrap();

        assert_eq!(second, InsertOutcome::Conflict(first.entry().clone()));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, repo) = test_db(dir.path()).await;

        for i in 0..105 {
            repo.insert_if_absent(&signup("User", &format!("user{i}@example.com")))
                .await
                .unwrap();
        }

        let list = repo.list_recent(100).await.unwrap();
        assert_eq!(list.len(), 100);
        assert_eq!(list[0].email, "user104@example.com");
        assert!(list
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
        assert_eq!(repo.count().await.unwrap(), 105);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, repo) = test_db(dir.path()).await;
        assert!(repo.list_recent(100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_create_once() {
        let dir = tempfile::tempdir().unwrap();
        let (_db, repo) = test_db(dir.path()).await;
        let repo = Arc::new(repo);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert_if_absent(&signup("Racer", "race@example.com"))
                    .await
                    .unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_created() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_plan_is_invalid_record() {
        let dir = tempfile::tempdir().unwrap();
        let (db, repo) = test_db(dir.path()).await;

        // Bypass the CHECK constraint to simulate a record written by an
        // older schema. The pragma is per-connection.
        let mut conn = db.pool().acquire().await.unwrap();
        sqlx::query("PRAGMA ignore_check_constraints = ON")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO waitlists (id, name, email, phone_number, preferred_plan, created_at)
             VALUES ('legacy', 'Old', 'old@example.com', '', 'platinum', 0)",
        )
        .execute(&mut *conn)
        .await
        .unwrap();
        drop(conn);

        let result = repo.find_by_email("old@example.com").await;
        assert!(matches!(result, Err(PersistenceError::InvalidRecord(_))));
    }
}
