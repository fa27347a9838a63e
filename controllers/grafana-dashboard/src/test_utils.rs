//! Test utilities for unit testing reconcilers
//!
//! Builders for CRDs and Grafana-side objects used across test modules.

use crds::{GrafanaDashboard, GrafanaDashboardSpec, GrafanaDashboardStatus, GrafanaDatasource};
use grafana_client::Datasource;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Helper to create a test GrafanaDashboard CRD
pub fn create_test_dashboard(
    name: &str,
    namespace: &str,
    spec: GrafanaDashboardSpec,
    status: Option<GrafanaDashboardStatus>,
) -> GrafanaDashboard {
    GrafanaDashboard {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec,
        status,
    }
}

/// Dashboard JSON with the given title and optional explicit uid
pub fn sample_dashboard_json(title: &str, uid: Option<&str>) -> String {
    let mut model = serde_json::json!({
        "title": title,
        "tags": ["kubernetes"],
        "timezone": "browser",
        "schemaVersion": 39,
        "panels": [{
            "id": 1,
            "type": "timeseries",
            "title": "CPU",
            "datasource": {"type": "prometheus", "uid": "prometheus"},
            "targets": [{"expr": "rate(node_cpu_seconds_total[5m])"}]
        }]
    });
    if let Some(uid) = uid {
        model["uid"] = serde_json::json!(uid);
    }
    model.to_string()
}

/// Helper to create a Grafana-side data source (as returned by the API)
pub fn create_test_datasource(id: u64, name: &str, datasource_type: &str, url: &str) -> Datasource {
    Datasource {
        id,
        uid: format!("{}-uid", name),
        org_id: 1,
        name: name.to_string(),
        datasource_type: datasource_type.to_string(),
        access: "proxy".to_string(),
        url: url.to_string(),
        user: String::new(),
        database: String::new(),
        basic_auth: false,
        is_default: false,
        json_data: None,
        read_only: false,
        version: 1,
    }
}

/// Helper to create a CRD data source pointing at a URL
pub fn crd_datasource(name: &str, datasource_type: &str, url: &str) -> GrafanaDatasource {
    GrafanaDatasource::new(name, datasource_type).with_url(url)
}
