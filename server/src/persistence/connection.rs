//! Lifecycle of the durable-store connection.
//!
//! ```text
//! Unattempted --connect ok--> Connected --pool closed--> Disconnected
//!                                  ^                          |
//!                                  +---- ensure_connected ----+
//! ```
//!
//! The `Connected -> Disconnected` edge follows the pool's close event.
//! SQLite pools only close on an explicit [`Database::close`], which the
//! binary never calls, so outside of tests a process stays `Connected`
//! once it gets there.
//!
//! There is no background reconnection; the next request that calls
//! [`ConnectionManager::ensure_connected`] makes the next attempt. A failed
//! attempt leaves the state where it was.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::sqlite::Database;
use crate::config::DurableSettings;

/// Readiness of the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unattempted,
    Connected,
    Disconnected,
}

struct Link {
    state: ConnectionState,
    database: Option<Database>,
    /// Bumped on every successful connect so a stale close listener cannot
    /// disconnect a newer pool.
    generation: u64,
}

struct Shared {
    settings: Option<DurableSettings>,
    link: RwLock<Link>,
    connecting: Mutex<()>,
}

/// Owns the durable connection and its readiness state.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// `None` settings mean no connection string was configured and the
    /// process stays in degraded mode.
    pub fn new(settings: Option<DurableSettings>) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                link: RwLock::new(Link {
                    state: ConnectionState::Unattempted,
                    database: None,
                    generation: 0,
                }),
                connecting: Mutex::new(()),
            }),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.shared.settings.is_some()
    }

    pub async fn state(&self) -> ConnectionState {
        self.shared.link.read().await.state
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Return a live database handle, connecting if necessary.
    ///
    /// Returns `None` without any I/O when unconfigured. Connection failures
    /// are logged and reported as `None`; they never propagate.
    pub async fn ensure_connected(&self) -> Option<Database> {
        let settings = self.shared.settings.as_ref()?;

        if let Some(db) = self.current().await {
            return Some(db);
        }

        // One handshake at a time; late arrivals reuse its result.
        let _guard = self.shared.connecting.lock().await;
        if let Some(db) = self.current().await {
            return Some(db);
        }

        let previous = self.state().await;
        tracing::info!(database = %settings.database_name, ?previous, "Connecting to durable store");

        match Database::connect(settings).await {
            Ok(db) => {
                let generation = {
                    let mut link = self.shared.link.write().await;
                    link.generation += 1;
                    link.state = ConnectionState::Connected;
                    link.database = Some(db.clone());
                    link.generation
                };
                self.watch_close(&db, generation);
                tracing::info!(database = %settings.database_name, "Durable store connected");
                Some(db)
            }
            Err(e) => {
                tracing::warn!(
                    database = %settings.database_name,
                    error = %e,
                    "Durable store unavailable; using in-memory storage"
                );
                None
            }
        }
    }

    /// The live handle, if connected. Never connects.
    pub async fn current(&self) -> Option<Database> {
        let link = self.shared.link.read().await;
        match link.state {
            // The close listener may not have run yet.
            ConnectionState::Connected => link.database.clone().filter(|db| !db.is_closed()),
            _ => None,
        }
    }

    /// Flip to `Disconnected` once the pool behind `db` closes.
    fn watch_close(&self, db: &Database, generation: u64) {
        let closed = db.pool().close_event();
        let shared = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            closed.await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut link = shared.link.write().await;
            if link.generation == generation && link.state == ConnectionState::Connected {
                link.state = ConnectionState::Disconnected;
                link.database = None;
                tracing::warn!("Durable store connection closed");
            }
        });
    }

    /// Forget any connection and return to `Unattempted`.
    #[cfg(test)]
    pub async fn reset(&self) {
        let mut link = self.shared.link.write().await;
        if let Some(db) = link.database.take() {
            link.generation += 1;
            db.close().await;
        }
        link.state = ConnectionState::Unattempted;
    }
}
