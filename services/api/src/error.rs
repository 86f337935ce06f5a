//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mentor_match_core::{
    AccessDenied, BookingError, BookingErrorKind, PortError, TransitionError,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed client input, caught before any store access.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The write would duplicate an existing record.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Missing, invalid or expired credential.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(vec![msg.into()])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Conflict(_)) => StatusCode::BAD_REQUEST,
            ApiError::Port(PortError::Unexpected(_))
            | ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The messages shown to the client. Server-side failures never leak
    /// their details.
    pub fn client_messages(&self) -> Vec<String> {
        match self {
            ApiError::Validation(messages) => messages.clone(),
            ApiError::Duplicate(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Port(PortError::NotFound(msg))
            | ApiError::Port(PortError::Conflict(msg)) => vec![msg.clone()],
            _ => vec!["Server error".to_string()],
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        let msg = e.to_string();
        match e.kind() {
            BookingErrorKind::NotFound => ApiError::NotFound(msg),
            BookingErrorKind::Forbidden => ApiError::Forbidden(msg),
            BookingErrorKind::InvalidInput => ApiError::Validation(vec![msg]),
            BookingErrorKind::Conflict => ApiError::Conflict(msg),
        }
    }
}

impl From<AccessDenied> for ApiError {
    fn from(e: AccessDenied) -> Self {
        ApiError::Forbidden(e.message.to_string())
    }
}

impl From<TransitionError> for ApiError {
    fn from(e: TransitionError) -> Self {
        ApiError::Conflict(e.to_string())
    }
}

//=========================================================================================
// Wire Format
//=========================================================================================

/// A single client-facing error message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorMessage {
    pub msg: String,
}

/// The body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub errors: Vec<ErrorMessage>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = ErrorBody {
            errors: self
                .client_messages()
                .into_iter()
                .map(|msg| ErrorMessage { msg })
                .collect(),
        };
        (status, Json(body)).into_response()
    }
}
