//! Integration tests for the Grafana client
//!
//! These tests require a running Grafana instance.
//! Set GRAFANA_URL and GRAFANA_TOKEN environment variables to run.

use grafana_client::{DashboardSaveRequest, DatasourceRequest, GrafanaClient, GrafanaError};

fn client() -> GrafanaClient {
    let url = std::env::var("GRAFANA_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    let token = std::env::var("GRAFANA_TOKEN")
        .expect("GRAFANA_TOKEN environment variable must be set");

    GrafanaClient::new(url, token).expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running Grafana instance
async fn test_validate_token() {
    let client = client();
    client.validate_token().await.expect("Token should be valid");

    let health = client.health().await.expect("Health check failed");
    assert_eq!(health.database, "ok");
}

#[tokio::test]
#[ignore]
async fn test_dashboard_lifecycle() {
    let client = client();
    let uid = "integration-test-dashboard";

    let saved = client.save_dashboard(DashboardSaveRequest {
        dashboard: serde_json::json!({"uid": uid, "title": "Integration Test", "panels": []}),
        folder_uid: None,
        overwrite: true,
        message: None,
    }).await.expect("Failed to save dashboard");
    assert_eq!(saved.uid, uid);

    let fetched = client.get_dashboard_by_uid(uid).await.expect("Failed to get dashboard");
    assert_eq!(fetched.dashboard["title"], "Integration Test");

    client.delete_dashboard_by_uid(uid).await.expect("Failed to delete dashboard");

    let missing = client.get_dashboard_by_uid(uid).await;
    assert!(matches!(missing, Err(GrafanaError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn test_datasource_upsert() {
    let client = client();
    let name = "integration-test-prometheus";

    let request = DatasourceRequest {
        name: name.to_string(),
        datasource_type: "prometheus".to_string(),
        url: Some("http://prometheus:9090".to_string()),
        access: Some("proxy".to_string()),
        ..Default::default()
    };

    let existing = client.get_datasource_by_name(name).await.expect("Lookup failed");
    let uid = match existing {
        Some(ds) => ds.uid,
        None => {
            let created = client.create_datasource(request.clone()).await.expect("Create failed");
            created.datasource.expect("Grafana returns the created data source").uid
        }
    };

    let updated = client.update_datasource(&uid, DatasourceRequest {
        url: Some("http://prometheus-2:9090".to_string()),
        ..request
    }).await.expect("Update failed");
    assert_eq!(updated.name, name);
}
