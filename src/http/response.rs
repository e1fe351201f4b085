//! Request-level errors and their HTTP representation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::agent::AgentError;
use crate::sessions::SessionStoreError;

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Session storage failed to initialize at startup.
    #[error("conversation sessions are unavailable: {0}")]
    SessionsUnavailable(String),

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Store(SessionStoreError),
}

impl From<SessionStoreError> for ApiError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound(id) => ApiError::SessionNotFound(id),
            other => ApiError::Store(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Agent(AgentError::Respond(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Agent(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
