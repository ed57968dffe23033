//! Error responses for the HTTP API.
//!
//! Every failure renders as a JSON body; callers never see a bare status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::entry::EntryError;
use crate::persistence::PersistenceError;

/// Body of every non-2xx, non-conflict response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] EntryError),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: PersistenceError,
    },
}

impl ApiError {
    pub fn storage(context: &'static str, source: PersistenceError) -> Self {
        Self::Storage { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(e) => ErrorResponse {
                error: e.to_string(),
                message: None,
            },
            ApiError::MalformedBody(detail) => ErrorResponse {
                error: "Invalid request body".to_string(),
                message: Some(detail),
            },
            ApiError::Storage { context, source } => {
                tracing::error!(error = %source, "{context}");
                ErrorResponse {
                    error: context.to_string(),
                    message: Some(source.to_string()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
