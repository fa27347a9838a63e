//! Reconciliation logic for GrafanaDashboard CRDs.
//!
//! - `datasource`: ensures the data sources listed in a dashboard exist in Grafana
//! - `dashboard`: pushes the dashboard model, detects drift, handles deletion

pub mod dashboard;
pub mod datasource;

use crate::backoff::ResourceBackoffs;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crds::{GrafanaDashboard, GrafanaDashboardStatus};
use grafana_client::GrafanaClientTrait;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Finalizer that keeps a GrafanaDashboard around until its dashboard is removed from Grafana
pub const FINALIZER: &str = "dcops.microscaler.io/grafana-dashboard";

/// Reconciles GrafanaDashboard resources.
pub struct Reconciler {
    pub(crate) grafana_client: Box<dyn GrafanaClientTrait>,
    kube_client: Client,
    backoffs: ResourceBackoffs,
    pub(crate) metrics: Arc<Metrics>,
    pub(crate) resync_interval: Duration,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("grafana_url", &self.grafana_client.base_url())
            .field("resync_interval", &self.resync_interval)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        grafana_client: impl GrafanaClientTrait + 'static,
        kube_client: Client,
        metrics: Arc<Metrics>,
        resync_interval: Duration,
    ) -> Self {
        Self {
            grafana_client: Box::new(grafana_client),
            kube_client,
            backoffs: ResourceBackoffs::new(),
            metrics,
            resync_interval,
        }
    }

    /// Namespaced API handle for status patches and finalizers
    pub(crate) fn dashboard_api(&self, namespace: &str) -> Api<GrafanaDashboard> {
        Api::namespaced(self.kube_client.clone(), namespace)
    }

    /// Build a merge patch for the status subresource.
    ///
    /// Optional fields are written as explicit nulls so a merge patch clears
    /// values left over from earlier states (e.g. a stale `error`).
    /// `lastReconciled` is only sent when set, which callers do on state changes.
    pub(crate) fn create_status_patch(status: &GrafanaDashboardStatus) -> serde_json::Value {
        let mut patch = serde_json::json!({
            "state": status.state.as_str(),
            "dashboardUid": status.dashboard_uid,
            "dashboardId": status.dashboard_id,
            "dashboardUrl": status.dashboard_url,
            "version": status.version,
            "contentHash": status.content_hash,
            "datasources": status.datasources,
            "error": status.error,
        });
        if let (Some(map), Some(ts)) = (patch.as_object_mut(), status.last_reconciled) {
            map.insert("lastReconciled".to_string(), serde_json::json!(ts));
        }
        serde_json::json!({ "status": patch })
    }

    /// Merge-patch the status subresource of one GrafanaDashboard
    pub(crate) async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &GrafanaDashboardStatus,
    ) -> Result<(), ControllerError> {
        let patch = Self::create_status_patch(status);
        self.dashboard_api(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        debug!("Patched GrafanaDashboard {}/{} status to {}", namespace, name, status.state.as_str());
        Ok(())
    }

    /// Count a failed reconcile and return the delay before the next attempt
    pub fn increment_error(&self, resource_key: &str) -> Duration {
        let (delay, error_count) = self.backoffs.record_failure(resource_key);
        warn!(
            "GrafanaDashboard {} failed {} time(s) in a row, retrying in {}s",
            resource_key,
            error_count,
            delay.as_secs()
        );
        delay
    }

    /// Clear the failure count after a successful reconcile
    pub fn reset_error(&self, resource_key: &str) {
        let error_count = self.backoffs.error_count(resource_key);
        if error_count > 0 {
            info!("GrafanaDashboard {} recovered after {} failed attempt(s)", resource_key, error_count);
        }
        self.backoffs.record_success(resource_key);
    }

    /// Drop all backoff state once the resource is gone
    pub fn forget_resource(&self, resource_key: &str) {
        self.backoffs.forget(resource_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::DashboardState;

    #[test]
    fn test_status_patch_clears_optional_fields() {
        let status = GrafanaDashboardStatus {
            state: DashboardState::Synced,
            dashboard_uid: Some("u".to_string()),
            dashboard_id: Some(4),
            datasources: vec!["prometheus".to_string()],
            ..Default::default()
        };
        let patch = Reconciler::create_status_patch(&status);

        assert_eq!(patch["status"]["state"], "Synced");
        assert_eq!(patch["status"]["dashboardUid"], "u");
        assert_eq!(patch["status"]["dashboardId"], 4);
        assert_eq!(patch["status"]["datasources"], serde_json::json!(["prometheus"]));
        assert!(patch["status"]["error"].is_null());
        assert!(patch["status"].get("error").is_some(), "error must be sent as null");
        assert!(patch["status"].get("lastReconciled").is_none());
    }

    #[test]
    fn test_status_patch_includes_timestamp_when_set() {
        let status = GrafanaDashboardStatus {
            state: DashboardState::Failed,
            error: Some("boom".to_string()),
            last_reconciled: Some(chrono::Utc::now()),
            ..Default::default()
        };
        let patch = Reconciler::create_status_patch(&status);
        assert_eq!(patch["status"]["state"], "Failed");
        assert_eq!(patch["status"]["error"], "boom");
        assert!(patch["status"]["lastReconciled"].is_string());
    }
}
