//! Grafana HTTP API Client
//!
//! A Rust client for the parts of the Grafana HTTP API used to manage
//! dashboards and data sources.
//!
//! # Example
//!
//! ```no_run
//! use grafana_client::{GrafanaClient, DashboardSaveRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GrafanaClient::new(
//!     "http://grafana.monitoring:3000".to_string(),
//!     "your-service-account-token".to_string(),
//! )?;
//!
//! client.validate_token().await?;
//!
//! let saved = client.save_dashboard(DashboardSaveRequest {
//!     dashboard: serde_json::json!({"uid": "node", "title": "Node Exporter", "panels": []}),
//!     folder_uid: None,
//!     overwrite: true,
//!     message: Some("Synced from Kubernetes".to_string()),
//! }).await?;
//! println!("saved {} at version {}", saved.uid, saved.version);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod grafana_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::GrafanaClient;
pub use error::GrafanaError;
pub use models::*;
pub use grafana_trait::GrafanaClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockGrafanaClient;
