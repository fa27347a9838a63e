//! Grafana API client
//!
//! Implements the subset of the Grafana HTTP API the dashboard controller needs:
//! `/api/dashboards/...` and `/api/datasources/...`, plus health and token checks.

use crate::error::GrafanaError;
use crate::grafana_trait::GrafanaClientTrait;
use crate::models::*;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Grafana API client
pub struct GrafanaClient {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for GrafanaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrafanaClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GrafanaClient {
    /// Create a new Grafana client
    ///
    /// # Arguments
    /// * `base_url` - Grafana base URL (e.g., "http://grafana.monitoring:3000")
    /// * `token` - Service account token or API key
    pub fn new(base_url: String, token: String) -> Result<Self, GrafanaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
    }

    /// Map the shared error statuses; `context` names the operation for the message.
    async fn check_status(response: Response, context: &str) -> Result<Response, GrafanaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("{}: {} - {}", context, status, body);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GrafanaError::Authentication(message),
            StatusCode::NOT_FOUND => GrafanaError::NotFound(message),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => GrafanaError::Conflict(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => GrafanaError::InvalidRequest(message),
            _ => GrafanaError::Api(message),
        })
    }

    /// Decode a JSON body, keeping the start of the payload in the error for debugging.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GrafanaError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            GrafanaError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }

    /// Validate the API token by fetching the current organization.
    ///
    /// `/api/health` is unauthenticated, so it cannot tell a bad token apart.
    pub async fn validate_token(&self) -> Result<(), GrafanaError> {
        debug!("Validating Grafana token and connectivity");
        let response = self.request(Method::GET, "/api/org").send().await?;
        let response = Self::check_status(response, "Failed to validate token").await?;
        let org: Organization = Self::decode(response).await?;
        debug!("Token validated for organization {} ({})", org.name, org.id);
        Ok(())
    }

    /// Grafana server health
    pub async fn health(&self) -> Result<HealthResponse, GrafanaError> {
        let response = self.request(Method::GET, "/api/health").send().await?;
        let response = Self::check_status(response, "Health check failed").await?;
        Self::decode(response).await
    }

    /// Get a dashboard and its metadata by UID
    ///
    /// # Returns
    /// * `Err(GrafanaError::NotFound)` - No dashboard with this UID
    pub async fn get_dashboard_by_uid(&self, uid: &str) -> Result<DashboardFullResponse, GrafanaError> {
        let path = format!("/api/dashboards/uid/{}", urlencoding::encode(uid));
        let response = self.request(Method::GET, &path).send().await?;
        let response = Self::check_status(response, &format!("Failed to get dashboard {}", uid)).await?;
        Self::decode(response).await
    }

    /// Create or update a dashboard
    ///
    /// Grafana answers 412 when the version or title clashes and `overwrite` is false.
    pub async fn save_dashboard(&self, request: DashboardSaveRequest) -> Result<DashboardSaveResponse, GrafanaError> {
        debug!(
            "Saving dashboard {:?} (overwrite: {})",
            request.dashboard.get("uid"),
            request.overwrite
        );
        let response = self.request(Method::POST, "/api/dashboards/db")
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response, "Failed to save dashboard").await?;
        Self::decode(response).await
    }

    /// Delete a dashboard by UID
    pub async fn delete_dashboard_by_uid(&self, uid: &str) -> Result<DeleteResponse, GrafanaError> {
        let path = format!("/api/dashboards/uid/{}", urlencoding::encode(uid));
        let response = self.request(Method::DELETE, &path).send().await?;
        let response = Self::check_status(response, &format!("Failed to delete dashboard {}", uid)).await?;
        Self::decode(response).await
    }

    /// Look up a data source by name
    ///
    /// # Returns
    /// * `Ok(None)` - No data source with this name
    pub async fn get_datasource_by_name(&self, name: &str) -> Result<Option<Datasource>, GrafanaError> {
        let path = format!("/api/datasources/name/{}", urlencoding::encode(name));
        let response = self.request(Method::GET, &path).send().await?;
        match Self::check_status(response, &format!("Failed to get data source {}", name)).await {
            Ok(response) => Ok(Some(Self::decode(response).await?)),
            Err(GrafanaError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a data source
    pub async fn create_datasource(&self, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError> {
        debug!("Creating data source {} ({})", request.name, request.datasource_type);
        let response = self.request(Method::POST, "/api/datasources")
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response, &format!("Failed to create data source {}", request.name)).await?;
        Self::decode(response).await
    }

    /// Update a data source by UID
    pub async fn update_datasource(&self, uid: &str, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError> {
        debug!("Updating data source {} (UID: {})", request.name, uid);
        let path = format!("/api/datasources/uid/{}", urlencoding::encode(uid));
        let response = self.request(Method::PUT, &path)
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response, &format!("Failed to update data source {}", request.name)).await?;
        Self::decode(response).await
    }
}

#[async_trait::async_trait]
impl GrafanaClientTrait for GrafanaClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn validate_token(&self) -> Result<(), GrafanaError> {
        self.validate_token().await
    }

    async fn health(&self) -> Result<HealthResponse, GrafanaError> {
        self.health().await
    }

    async fn get_dashboard_by_uid(&self, uid: &str) -> Result<DashboardFullResponse, GrafanaError> {
        self.get_dashboard_by_uid(uid).await
    }

    async fn save_dashboard(&self, request: DashboardSaveRequest) -> Result<DashboardSaveResponse, GrafanaError> {
        self.save_dashboard(request).await
    }

    async fn delete_dashboard_by_uid(&self, uid: &str) -> Result<DeleteResponse, GrafanaError> {
        self.delete_dashboard_by_uid(uid).await
    }

    async fn get_datasource_by_name(&self, name: &str) -> Result<Option<Datasource>, GrafanaError> {
        self.get_datasource_by_name(name).await
    }

    async fn create_datasource(&self, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError> {
        self.create_datasource(request).await
    }

    async fn update_datasource(&self, uid: &str, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError> {
        self.update_datasource(uid, request).await
    }
}
