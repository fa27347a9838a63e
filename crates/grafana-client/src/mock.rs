//! Mock GrafanaClient for unit testing
//!
//! In-memory implementation of `GrafanaClientTrait` that follows Grafana's
//! behavior closely enough for reconciler tests: UID generation, version bumps
//! on save, 412-style conflicts without `overwrite`, and name-unique data sources.

use crate::error::GrafanaError;
use crate::grafana_trait::GrafanaClientTrait;
use crate::models::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock GrafanaClient for testing
#[derive(Clone, Debug)]
pub struct MockGrafanaClient {
    base_url: String,
    dashboards: Arc<Mutex<HashMap<String, StoredDashboard>>>,
    datasources: Arc<Mutex<HashMap<String, Datasource>>>,
    next_id: Arc<Mutex<u64>>,
    save_count: Arc<Mutex<u64>>,
    save_failure: Arc<Mutex<Option<String>>>,
}

#[derive(Clone, Debug)]
struct StoredDashboard {
    id: u64,
    version: u64,
    model: serde_json::Value,
}

fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

impl MockGrafanaClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            dashboards: Arc::new(Mutex::new(HashMap::new())),
            datasources: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            save_count: Arc::new(Mutex::new(0)),
            save_failure: Arc::new(Mutex::new(None)),
        }
    }

    fn allocate_id(&self) -> u64 {
        let mut next = self.next_id.lock().unwrap();
        let id = *next;
        *next += 1;
        id
    }

    /// Add a dashboard to the mock store (for test setup)
    pub fn add_dashboard(&self, uid: &str, model: serde_json::Value) -> u64 {
        let id = self.allocate_id();
        self.dashboards.lock().unwrap().insert(
            uid.to_string(),
            StoredDashboard { id, version: 1, model },
        );
        id
    }

    /// Add a data source to the mock store (for test setup)
    pub fn add_datasource(&self, datasource: Datasource) {
        self.datasources.lock().unwrap().insert(datasource.name.clone(), datasource);
    }

    /// Stored dashboard model by UID
    pub fn dashboard(&self, uid: &str) -> Option<serde_json::Value> {
        self.dashboards.lock().unwrap().get(uid).map(|d| d.model.clone())
    }

    /// Number of stored dashboards
    pub fn dashboard_count(&self) -> usize {
        self.dashboards.lock().unwrap().len()
    }

    /// Stored data source by name
    pub fn datasource(&self, name: &str) -> Option<Datasource> {
        self.datasources.lock().unwrap().get(name).cloned()
    }

    /// Number of stored data sources
    pub fn datasource_count(&self) -> usize {
        self.datasources.lock().unwrap().len()
    }

    /// Number of successful `save_dashboard` calls
    pub fn save_count(&self) -> u64 {
        *self.save_count.lock().unwrap()
    }

    /// Make every following `save_dashboard` fail with an API error
    pub fn fail_saves_with(&self, message: impl Into<String>) {
        *self.save_failure.lock().unwrap() = Some(message.into());
    }

    fn apply_request(&self, existing: Option<&Datasource>, uid: String, request: DatasourceRequest) -> Datasource {
        Datasource {
            id: existing.map_or_else(|| self.allocate_id(), |d| d.id),
            uid,
            org_id: 1,
            name: request.name,
            datasource_type: request.datasource_type,
            access: request.access.unwrap_or_else(|| "proxy".to_string()),
            url: request.url.unwrap_or_default(),
            user: request.user.unwrap_or_default(),
            database: request.database.unwrap_or_default(),
            basic_auth: request.basic_auth.unwrap_or(false),
            is_default: request.is_default.unwrap_or(false),
            json_data: request.json_data,
            read_only: false,
            version: existing.map_or(1, |d| d.version + 1),
        }
    }
}

#[async_trait::async_trait]
impl GrafanaClientTrait for MockGrafanaClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), GrafanaError> {
        Ok(())
    }

    async fn health(&self) -> Result<HealthResponse, GrafanaError> {
        Ok(HealthResponse {
            commit: "mock".to_string(),
            database: "ok".to_string(),
            version: "11.0.0".to_string(),
        })
    }

    async fn get_dashboard_by_uid(&self, uid: &str) -> Result<DashboardFullResponse, GrafanaError> {
        let dashboards = self.dashboards.lock().unwrap();
        let stored = dashboards
            .get(uid)
            .ok_or_else(|| GrafanaError::NotFound(format!("Dashboard {} not found", uid)))?;
        let title = stored.model.get("title").and_then(|t| t.as_str()).unwrap_or_default();
        Ok(DashboardFullResponse {
            dashboard: stored.model.clone(),
            meta: DashboardMeta {
                url: format!("/d/{}/{}", uid, slugify(title)),
                slug: slugify(title),
                version: stored.version,
                ..Default::default()
            },
        })
    }

    async fn save_dashboard(&self, request: DashboardSaveRequest) -> Result<DashboardSaveResponse, GrafanaError> {
        if let Some(message) = self.save_failure.lock().unwrap().clone() {
            return Err(GrafanaError::Api(message));
        }

        let mut model = request.dashboard;
        let title = model
            .get("title")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GrafanaError::InvalidRequest("Dashboard title cannot be empty".to_string()))?;
        let uid = match model.get("uid").and_then(|u| u.as_str()) {
            Some(uid) => uid.to_string(),
            None => format!("mock{}", self.allocate_id()),
        };

        let mut dashboards = self.dashboards.lock().unwrap();
        let (id, version) = match dashboards.get(&uid) {
            Some(_) if !request.overwrite => {
                return Err(GrafanaError::Conflict(format!(
                    "A dashboard with the same uid already exists: {}",
                    uid
                )));
            }
            Some(existing) => (existing.id, existing.version + 1),
            None => (self.allocate_id(), 1),
        };

        if let Some(object) = model.as_object_mut() {
            object.insert("id".to_string(), serde_json::json!(id));
            object.insert("uid".to_string(), serde_json::json!(uid));
            object.insert("version".to_string(), serde_json::json!(version));
        }
        dashboards.insert(uid.clone(), StoredDashboard { id, version, model });
        *self.save_count.lock().unwrap() += 1;

        let slug = slugify(&title);
        Ok(DashboardSaveResponse {
            id,
            url: format!("/d/{}/{}", uid, slug),
            uid,
            status: "success".to_string(),
            version,
            slug: Some(slug),
        })
    }

    async fn delete_dashboard_by_uid(&self, uid: &str) -> Result<DeleteResponse, GrafanaError> {
        let removed = self
            .dashboards
            .lock()
            .unwrap()
            .remove(uid)
            .ok_or_else(|| GrafanaError::NotFound(format!("Dashboard {} not found", uid)))?;
        let title = removed.model.get("title").and_then(|t| t.as_str()).map(str::to_string);
        Ok(DeleteResponse {
            message: format!("Dashboard {} deleted", title.as_deref().unwrap_or(uid)),
            title,
        })
    }

    async fn get_datasource_by_name(&self, name: &str) -> Result<Option<Datasource>, GrafanaError> {
        Ok(self.datasource(name))
    }

    async fn create_datasource(&self, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError> {
        if self.datasources.lock().unwrap().contains_key(&request.name) {
            return Err(GrafanaError::Conflict(format!(
                "data source with the same name already exists: {}",
                request.name
            )));
        }

        let uid = request.uid.clone().unwrap_or_else(|| format!("ds{}", *self.next_id.lock().unwrap()));
        let created = self.apply_request(None, uid, request);
        self.add_datasource(created.clone());
        Ok(DatasourceMutationResponse {
            id: created.id,
            name: created.name.clone(),
            message: "Datasource added".to_string(),
            datasource: Some(created),
        })
    }

    async fn update_datasource(&self, uid: &str, request: DatasourceRequest) -> Result<DatasourceMutationResponse, GrafanaError> {
        let existing = self
            .datasources
            .lock()
            .unwrap()
            .values()
            .find(|d| d.uid == uid)
            .cloned()
            .ok_or_else(|| GrafanaError::NotFound(format!("Data source {} not found", uid)))?;

        let updated = self.apply_request(Some(&existing), uid.to_string(), request);
        let mut datasources = self.datasources.lock().unwrap();
        datasources.remove(&existing.name);
        datasources.insert(updated.name.clone(), updated.clone());
        Ok(DatasourceMutationResponse {
            id: updated.id,
            name: updated.name.clone(),
            message: "Datasource updated".to_string(),
            datasource: Some(updated),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_request(model: serde_json::Value, overwrite: bool) -> DashboardSaveRequest {
        DashboardSaveRequest {
            dashboard: model,
            folder_uid: None,
            overwrite,
            message: None,
        }
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let mock = MockGrafanaClient::new("http://test-grafana");
        let model = serde_json::json!({"uid": "node", "title": "Node Exporter"});

        let first = mock.save_dashboard(save_request(model.clone(), true)).await.unwrap();
        let second = mock.save_dashboard(save_request(model, true)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(second.url, "/d/node/node-exporter");
        assert_eq!(mock.save_count(), 2);
    }

    #[tokio::test]
    async fn test_save_without_overwrite_conflicts() {
        let mock = MockGrafanaClient::new("http://test-grafana");
        mock.add_dashboard("node", serde_json::json!({"uid": "node", "title": "Node"}));

        let result = mock
            .save_dashboard(save_request(serde_json::json!({"uid": "node", "title": "Node"}), false))
            .await;
        assert!(matches!(result, Err(GrafanaError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_requires_title() {
        let mock = MockGrafanaClient::new("http://test-grafana");
        let result = mock.save_dashboard(save_request(serde_json::json!({"uid": "x"}), true)).await;
        assert!(matches!(result, Err(GrafanaError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_dashboard() {
        let mock = MockGrafanaClient::new("http://test-grafana");
        let result = mock.delete_dashboard_by_uid("missing").await;
        assert!(matches!(result, Err(GrafanaError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_datasource_create_then_update() {
        let mock = MockGrafanaClient::new("http://test-grafana");
        let request = DatasourceRequest {
            name: "prometheus".to_string(),
            datasource_type: "prometheus".to_string(),
            url: Some("http://old:9090".to_string()),
            ..Default::default()
        };
        let created = mock.create_datasource(request.clone()).await.unwrap();
        let uid = created.datasource.unwrap().uid;

        let duplicate = mock.create_datasource(request.clone()).await;
        assert!(matches!(duplicate, Err(GrafanaError::Conflict(_))));

        let updated = mock
            .update_datasource(
                &uid,
                DatasourceRequest { url: Some("http://new:9090".to_string()), ..request },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(mock.datasource("prometheus").unwrap().url, "http://new:9090");
        assert_eq!(mock.datasource_count(), 1);
    }
}
