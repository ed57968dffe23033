//! Durable-store status for operational tooling.

use std::sync::Arc;

use crate::persistence::{StoreStatus, WaitlistRepository};

/// Gives the connection manager a chance to connect, then asks the
/// repository for its status. Holds no state of its own.
#[derive(Clone)]
pub struct StatusReporter {
    repository: Arc<WaitlistRepository>,
}

impl StatusReporter {
    pub fn new(repository: Arc<WaitlistRepository>) -> Self {
        Self { repository }
    }

    pub async fn report(&self) -> StoreStatus {
        self.repository.connections().ensure_connected().await;
        self.repository.status().await
    }
}
