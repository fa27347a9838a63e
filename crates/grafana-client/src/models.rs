//! Grafana API models
//!
//! These models match the Grafana HTTP API payloads.
//! See: https://grafana.com/docs/grafana/latest/developers/http_api/

use serde::{Deserialize, Serialize};

/// Response of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    #[serde(default)]
    pub commit: String,
    pub database: String,
    pub version: String,
}

/// Current organization (`GET /api/org`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub id: u64,
    pub name: String,
}

/// Body of `POST /api/dashboards/db`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSaveRequest {
    /// Complete dashboard model
    pub dashboard: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
    /// Replace a dashboard with the same uid/title
    pub overwrite: bool,
    /// Commit message shown in the dashboard version history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of `POST /api/dashboards/db`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSaveResponse {
    pub id: u64,
    pub uid: String,
    pub url: String,
    pub status: String,
    pub version: u64,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Response of `GET /api/dashboards/uid/{uid}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardFullResponse {
    pub dashboard: serde_json::Value,
    pub meta: DashboardMeta,
}

/// Dashboard metadata returned alongside the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMeta {
    pub url: String,
    pub slug: String,
    pub version: u64,
    pub folder_uid: String,
    pub folder_title: String,
    pub provisioned: bool,
    pub created: String,
    pub updated: String,
}

/// Response of `DELETE /api/dashboards/uid/{uid}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub message: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Data source as returned by Grafana
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    pub id: u64,
    pub uid: String,
    #[serde(default)]
    pub org_id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub datasource_type: String,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub basic_auth: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub json_data: Option<serde_json::Value>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub version: u64,
}

/// Body of `POST /api/datasources` and `PUT /api/datasources/uid/{uid}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub datasource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_data: Option<serde_json::Value>,
}

/// Response of data source create/update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasourceMutationResponse {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub datasource: Option<Datasource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasource_from_grafana_payload() {
        let payload = r#"{
            "id": 3,
            "uid": "P1809F7CD0C75ACF3",
            "orgId": 1,
            "name": "prometheus",
            "type": "prometheus",
            "typeLogoUrl": "public/app/plugins/datasource/prometheus/img/prometheus_logo.svg",
            "access": "proxy",
            "url": "http://prometheus:9090",
            "user": "",
            "database": "",
            "basicAuth": false,
            "isDefault": true,
            "jsonData": {"httpMethod": "POST"},
            "readOnly": false,
            "version": 2
        }"#;
        let ds: Datasource = serde_json::from_str(payload).unwrap();
        assert_eq!(ds.id, 3);
        assert_eq!(ds.datasource_type, "prometheus");
        assert!(ds.is_default);
        assert_eq!(ds.json_data, Some(serde_json::json!({"httpMethod": "POST"})));
    }

    #[test]
    fn test_save_request_omits_unset_fields() {
        let request = DashboardSaveRequest {
            dashboard: serde_json::json!({"title": "t"}),
            folder_uid: None,
            overwrite: true,
            message: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"dashboard": {"title": "t"}, "overwrite": true})
        );
    }

    #[test]
    fn test_dashboard_response_tolerates_sparse_meta() {
        let payload = r#"{"dashboard": {"uid": "abc", "title": "t"}, "meta": {"url": "/d/abc/t", "version": 4}}"#;
        let full: DashboardFullResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(full.meta.version, 4);
        assert_eq!(full.meta.url, "/d/abc/t");
        assert!(!full.meta.provisioned);
    }
}
