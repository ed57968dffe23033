//! HTTP API
//!
//! Handlers validate input, call the [`WaitlistRepository`], and map the
//! outcome to a status code. Every body that carries waitlist data also
//! names the storage mode that served it.
//!
//! | Route                  | Handler                        |
//! |------------------------|--------------------------------|
//! | `POST /waitlist`       | [`endpoints::waitlist::join_waitlist`] |
//! | `GET /waitlist-entries`| [`endpoints::waitlist::list_entries`]  |
//! | `GET /db-status`       | [`endpoints::status::db_status`]       |
//! | `GET /health`          | [`endpoints::status::health`]          |

pub mod endpoints;
mod error;

pub use endpoints::{
    ConflictResponse, DbStatusResponse, EntriesResponse, HealthResponse, SignupRequest,
    SignupResponse, IN_MEMORY_STORAGE,
};
pub use error::{ApiError, ErrorResponse};

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::persistence::{ConnectionManager, WaitlistRepository};
use crate::status::StatusReporter;

/// Shared handler state, built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<WaitlistRepository>,
    pub status: StatusReporter,
}

impl AppState {
    pub fn new(connections: ConnectionManager) -> Self {
        let repository = Arc::new(WaitlistRepository::new(connections));
        Self {
            status: StatusReporter::new(repository.clone()),
            repository,
        }
    }
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/waitlist", post(endpoints::waitlist::join_waitlist))
        .route("/waitlist-entries", get(endpoints::waitlist::list_entries))
        .route("/db-status", get(endpoints::status::db_status))
        .route("/health", get(endpoints::status::health))
        .with_state(state)
}
