//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use crate::config::ConfigError;
use crate::web::dashboard::RegistryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use coursebuilder_core::{error::CoreError, ports::PortError};
use serde_json::json;
use tracing::error;

/// Where unenrolled students are sent.
pub const REGISTER_PATH: &str = "/register";

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dashboard registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Invalid input rejected by the scoring, progress or section logic.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while running database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The caller has no enrolled student record.
    #[error("Not enrolled in this course")]
    NotEnrolled,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::NotEnrolled => {
                let body = Json(json!({
                    "error": self.to_string(),
                    "redirect": REGISTER_PATH,
                }));
                return (StatusCode::FORBIDDEN, body).into_response();
            }
            ApiError::Core(err @ (CoreError::DuplicateSection(_) | CoreError::ClassFull(_)))
            | ApiError::Port(PortError::Rejected(
                err @ (CoreError::DuplicateSection(_) | CoreError::ClassFull(_)),
            )) => (StatusCode::CONFLICT, err.to_string()),
            ApiError::Core(err) | ApiError::Port(PortError::Rejected(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Port(PortError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Port(PortError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            _ => {
                error!("Request failed: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
