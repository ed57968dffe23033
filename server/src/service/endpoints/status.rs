//! Operational endpoints

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::persistence::StoreStatus;
use crate::service::AppState;

/// Storage label reported while no durable connection exists.
pub const IN_MEMORY_STORAGE: &str = "in-memory";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum DbStatusResponse {
    // Listed first: `StoreStatus` would also accept this shape.
    Offline {
        connected: bool,
        message: String,
        storage: String,
    },
    Connected(StoreStatus),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn db_status(State(state): State<AppState>) -> Json<DbStatusResponse> {
    tracing::info!("GET /db-status");

    let status = state.status.report().await;
    if status.connected {
        return Json(DbStatusResponse::Connected(status));
    }

    let message = if state.repository.connections().is_configured() {
        "Database unreachable; signups are held in memory"
    } else {
        "No database configured; signups are held in memory"
    };
    Json(DbStatusResponse::Offline {
        connected: false,
        message: message.to_string(),
        storage: IN_MEMORY_STORAGE.to_string(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
