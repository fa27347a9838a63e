//! Controller-specific error types.
//!
//! This module defines error types specific to the GrafanaDashboard controller
//! that are not covered by upstream library errors.

use grafana_client::GrafanaError;
use kube::Error as KubeError;
use kube_runtime::finalizer::Error as FinalizerError;
use thiserror::Error;

/// Errors that can occur in the GrafanaDashboard controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Grafana API error
    #[error("Grafana error: {0}")]
    Grafana(#[from] GrafanaError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// spec.json could not be turned into a dashboard model
    #[error("Invalid dashboard: {0}")]
    InvalidDashboard(String),

    /// Finalizer add/remove or the wrapped apply/cleanup failed
    #[error("Finalizer error: {0}")]
    Finalizer(#[source] Box<FinalizerError<ControllerError>>),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Metrics registry or probes server failure
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<FinalizerError<ControllerError>> for ControllerError {
    fn from(error: FinalizerError<ControllerError>) -> Self {
        match error {
            // Surface apply/cleanup errors as themselves so the error policy and
            // status messages see the real cause.
            FinalizerError::ApplyFailed(inner) | FinalizerError::CleanupFailed(inner) => inner,
            other => ControllerError::Finalizer(Box::new(other)),
        }
    }
}

impl From<prometheus::Error> for ControllerError {
    fn from(error: prometheus::Error) -> Self {
        ControllerError::Metrics(error.to_string())
    }
}
