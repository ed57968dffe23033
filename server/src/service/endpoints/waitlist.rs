//! Waitlist signup and listing endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::entry::{NewEntry, WaitlistEntry};
use crate::persistence::{InsertOutcome, StorageMode, DEFAULT_LIST_LIMIT};
use crate::service::error::ApiError;
use crate::service::AppState;

/// `POST /waitlist` body. Every field is optional at the wire level so that
/// missing fields produce our own validation errors.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub preferred_plan: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignupResponse {
    pub success: bool,
    pub entry: WaitlistEntry,
    pub storage: StorageMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConflictResponse {
    pub error: String,
    pub entry: WaitlistEntry,
    pub storage: StorageMode,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntriesResponse {
    pub success: bool,
    pub entries: Vec<WaitlistEntry>,
    pub count: usize,
    pub storage: StorageMode,
}

pub async fn join_waitlist(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::MalformedBody(e.body_text()))?;

    let entry = NewEntry::parse(
        req.name.as_deref(),
        req.email.as_deref(),
        req.phone_number.as_deref(),
        req.preferred_plan.as_deref(),
    )?;
    tracing::info!(email = %entry.email(), plan = %entry.preferred_plan(), "POST /waitlist");

    let served = state
        .repository
        .insert_if_absent(&entry)
        .await
        .map_err(|e| ApiError::storage("Failed to join waitlist", e))?;

    if let Some(reason) = &served.degradation {
        tracing::info!(email = %entry.email(), %reason, "Signup served from memory");
    }

    let response = match served.value {
        InsertOutcome::Created(entry) => {
            let message = match served.storage {
                StorageMode::Durable => "Successfully joined the waitlist!",
                StorageMode::Transient => {
                    "Joined the waitlist. Storage is temporarily in-memory, so this signup may not persist."
                }
            };
            Json(SignupResponse {
                success: true,
                entry,
                storage: served.storage,
                message: Some(message.to_string()),
            })
            .into_response()
        }
        InsertOutcome::Conflict(existing) => (
            StatusCode::CONFLICT,
            Json(ConflictResponse {
                error: "Email already registered on the waitlist".to_string(),
                entry: existing,
                storage: served.storage,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

pub async fn list_entries(State(state): State<AppState>) -> Result<Json<EntriesResponse>, ApiError> {
    tracing::info!("GET /waitlist-entries");

    let served = state
        .repository
        .list_recent(DEFAULT_LIST_LIMIT)
        .await
        .map_err(|e| ApiError::storage("Failed to fetch waitlist entries", e))?;

    Ok(Json(EntriesResponse {
        success: true,
        count: served.value.len(),
        entries: served.value,
        storage: served.storage,
    }))
}
