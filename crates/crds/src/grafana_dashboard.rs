//! GrafanaDashboard CRD
//!
//! A Grafana dashboard definition (JSON text) together with the data sources
//! its panels query. The spec is a plain declarative payload: nothing here
//! validates the dashboard document or ties it to the listed data sources.

use crate::grafana_datasource::GrafanaDatasource;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "dcops.microscaler.io",
    version = "v1alpha1",
    kind = "GrafanaDashboard",
    namespaced,
    status = "GrafanaDashboardStatus",
    shortname = "grafdash",
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"UID","type":"string","jsonPath":".status.dashboardUid"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaDashboardSpec {
    /// Data sources to ensure in Grafana, in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasources: Option<Vec<GrafanaDatasource>>,

    /// Complete dashboard model as JSON text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,
}

impl GrafanaDashboardSpec {
    /// Set the dashboard JSON, leaving data sources untouched
    #[must_use]
    pub fn with_json(mut self, json: impl Into<String>) -> Self {
        self.json = Some(json.into());
        self
    }

    /// Set the data source list, leaving the dashboard JSON untouched
    #[must_use]
    pub fn with_datasources(mut self, datasources: Vec<GrafanaDatasource>) -> Self {
        self.datasources = Some(datasources);
        self
    }

    /// Data sources in declaration order (empty when absent)
    pub fn datasources(&self) -> &[GrafanaDatasource] {
        self.datasources.as_deref().unwrap_or_default()
    }

    /// Dashboard JSON text, if set
    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaDashboardStatus {
    /// Sync state
    pub state: DashboardState,

    /// Dashboard UID in Grafana
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_uid: Option<String>,

    /// Grafana numeric dashboard ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_id: Option<u64>,

    /// Dashboard URL path in Grafana
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,

    /// Dashboard version after the last save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    /// sha256 of the dashboard model last pushed to Grafana
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    /// Names of the data sources ensured in Grafana
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasources: Vec<String>,

    /// Error message if the last reconciliation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Last state change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<chrono::DateTime<chrono::Utc>>,
}

/// Dashboard sync state
///
/// Serializes as PascalCase ("Synced", "Failed", ...) and also accepts the
/// lowercase spelling on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum DashboardState {
    /// Not yet pushed to Grafana
    #[default]
    #[serde(alias = "pending")]
    Pending,

    /// Dashboard and data sources match the resource
    #[serde(alias = "synced")]
    Synced,

    /// Last sync attempt failed
    #[serde(alias = "failed")]
    Failed,
}

impl DashboardState {
    /// Value as written into status patches
    pub fn as_str(self) -> &'static str {
        match self {
            DashboardState::Pending => "Pending",
            DashboardState::Synced => "Synced",
            DashboardState::Failed => "Failed",
        }
    }
}
