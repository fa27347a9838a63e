//! GrafanaDatasource
//!
//! Data-source definition carried inside a `GrafanaDashboard`. The shape mirrors
//! the body Grafana accepts on `POST /api/datasources`, minus secure fields.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Grafana data source a dashboard's panels query
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaDatasource {
    /// Data source name (unique per Grafana organization)
    pub name: String,

    /// Plugin type, e.g. "prometheus", "loki", "elasticsearch"
    #[serde(rename = "type")]
    pub datasource_type: String,

    /// Backend URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// How Grafana reaches the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<DatasourceAccess>,

    /// Fixed data source UID (Grafana generates one when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Mark as the organization default data source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,

    /// Database name (SQL and InfluxDB data sources)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Login user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Enable HTTP basic auth towards the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<bool>,

    /// Plugin-specific settings, passed through to Grafana untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub json_data: Option<serde_json::Value>,
}

/// Data source access mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceAccess {
    /// Requests are proxied through the Grafana server
    #[default]
    Proxy,

    /// Browser talks to the backend directly
    Direct,
}

impl DatasourceAccess {
    /// Wire value used by the Grafana API
    pub fn as_str(self) -> &'static str {
        match self {
            DatasourceAccess::Proxy => "proxy",
            DatasourceAccess::Direct => "direct",
        }
    }
}

impl GrafanaDatasource {
    /// Create a data source with only name and plugin type set
    pub fn new(name: impl Into<String>, datasource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datasource_type: datasource_type.into(),
            url: None,
            access: None,
            uid: None,
            is_default: None,
            database: None,
            user: None,
            basic_auth: None,
            json_data: None,
        }
    }

    /// Set the backend URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the access mode
    #[must_use]
    pub fn with_access(mut self, access: DatasourceAccess) -> Self {
        self.access = Some(access);
        self
    }

    /// Mark (or unmark) as the default data source
    #[must_use]
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = Some(is_default);
        self
    }
}

/// `jsonData` is free-form; keep the structural schema open for it.
fn preserve_unknown_fields(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}
