//! Grafana client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Grafana HTTP API
#[derive(Debug, Error)]
pub enum GrafanaError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Grafana returned an unexpected error status
    #[error("Grafana API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid or expired token, missing permission)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists or was changed concurrently
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Grafana rejected the request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
