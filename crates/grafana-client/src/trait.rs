//! GrafanaClient trait for mocking
//!
//! The controller talks to Grafana only through this trait, so reconcilers can
//! be unit tested against `MockGrafanaClient`.

use crate::error::GrafanaError;
use crate::models::*;

/// Trait for Grafana API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait GrafanaClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Validate the API token
    async fn validate_token(&self) -> Result<(), GrafanaError>;

    /// Grafana server health
    async fn health(&self) -> Result<HealthResponse, GrafanaError>;

    // Dashboards
    /// Fetch a dashboard and its metadata by uid
    async fn get_dashboard_by_uid(&self, uid: &str) -> Result<DashboardFullResponse, GrafanaError>;
    /// Create or overwrite a dashboard
    async fn save_dashboard(&self, request: DashboardSaveRequest) -> Result<DashboardSaveResponse, GrafanaError>;
    /// Delete a dashboard by uid
    async fn delete_dashboard_by_uid(&self, uid: &str) -> Result<DeleteResponse, GrafanaError>;

    // Data sources
    /// Look up a data source by name; `None` when Grafana has none
    async fn get_datasource_by_name(&self, name: &str) -> Result<Option<Datasource>, GrafanaError>;
    /// Create a data source
    async fn create_datasource(&self, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError>;
    /// Replace the data source with this uid; fields missing from the request are cleared
    async fn update_datasource(&self, uid: &str, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError>;
}
