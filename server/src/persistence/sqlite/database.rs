//! SQLite database connection pool and migration runner.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::config::DurableSettings;
use crate::persistence::PersistenceError;

/// Holds a connection pool to the SQLite database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    name: String,
}

impl Database {
    /// Connect using `settings`, run migrations, and return a ready-to-use
    /// `Database`.
    ///
    /// The whole handshake is bounded by `settings.connect_timeout`. Pooled
    /// connections idle for longer than `settings.idle_timeout` are closed.
    pub async fn connect(settings: &DurableSettings) -> Result<Self, PersistenceError> {
        let in_memory = is_memory_url(&settings.url);

        let options = SqliteConnectOptions::from_str(&settings.url)?
            .create_if_missing(true)
            .journal_mode(if in_memory {
                SqliteJournalMode::Memory
            } else {
                SqliteJournalMode::Wal
            })
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(settings.connect_timeout);

        // An in-memory database lives and dies with its single connection.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .idle_timeout(settings.idle_timeout)
        };

        let connect = pool_options
            .acquire_timeout(settings.connect_timeout)
            .connect_with(options);

        let pool = tokio::time::timeout(settings.connect_timeout, connect)
            .await
            .map_err(|_| PersistenceError::ConnectTimeout(settings.connect_timeout))??;

        let db = Self {
            pool,
            name: settings.database_name.clone(),
        };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run embedded migrations from `server/migrations/`.
    async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PersistenceError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Logical database name reported by status queries.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collection (table) names, excluding SQLite and migration bookkeeping.
    pub async fn collection_names(&self) -> Result<Vec<String>, PersistenceError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
              AND name NOT LIKE '_sqlx_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Close every pooled connection. Fires the pool's close event.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
