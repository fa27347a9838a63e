//! GrafanaDashboard reconciliation.
//!
//! Apply pushes the data sources and the dashboard model to Grafana and
//! records the result in status. Cleanup removes the dashboard from Grafana
//! before the finalizer is released.

use super::datasource::sync_datasources;
use super::{Reconciler, FINALIZER};
use crate::error::ControllerError;
use crate::metrics::ReconcileResult;
use crate::reconcile_helpers::{
    dashboard_uid_for_cleanup, prepare_dashboard, resource_key, status_needs_update, PreparedDashboard,
};
use crds::{DashboardState, GrafanaDashboard, GrafanaDashboardStatus};
use grafana_client::{DashboardSaveRequest, GrafanaClientTrait, GrafanaError};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{finalizer, Event};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Dashboard as Grafana reports it after a sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedDashboard {
    pub uid: String,
    pub id: Option<u64>,
    pub url: String,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardOutcome {
    /// Grafana already holds the recorded model
    Unchanged(SyncedDashboard),
    /// The model was (re)written to Grafana
    Saved(SyncedDashboard),
}

impl DashboardOutcome {
    pub fn dashboard(&self) -> &SyncedDashboard {
        match self {
            DashboardOutcome::Unchanged(d) | DashboardOutcome::Saved(d) => d,
        }
    }
}

/// Bring the dashboard in Grafana in line with `prepared`.
///
/// When status already records this content hash and uid, Grafana is only
/// read: the dashboard is re-saved if it was deleted or its version moved
/// (edited in the UI). Otherwise the model is saved with `overwrite`.
pub async fn sync_dashboard(
    client: &dyn GrafanaClientTrait,
    prepared: &PreparedDashboard,
    status: Option<&GrafanaDashboardStatus>,
    message: &str,
) -> Result<DashboardOutcome, ControllerError> {
    let recorded = status.filter(|s| {
        s.content_hash.as_deref() == Some(prepared.content_hash.as_str())
            && s.dashboard_uid.as_deref() == Some(prepared.uid.as_str())
    });

    if let Some(recorded) = recorded {
        match client.get_dashboard_by_uid(&prepared.uid).await {
            Ok(current) if recorded.version.is_none_or(|v| v == current.meta.version) => {
                debug!("Dashboard {} is up to date at version {}", prepared.uid, current.meta.version);
                return Ok(DashboardOutcome::Unchanged(SyncedDashboard {
                    uid: prepared.uid.clone(),
                    id: current.dashboard.get("id").and_then(|id| id.as_u64()).or(recorded.dashboard_id),
                    url: current.meta.url,
                    version: current.meta.version,
                }));
            }
            Ok(current) => {
                info!(
                    "Dashboard {} changed in Grafana (version {} -> {}), restoring",
                    prepared.uid,
                    recorded.version.unwrap_or_default(),
                    current.meta.version
                );
            }
            Err(GrafanaError::NotFound(_)) => {
                info!("Dashboard {} was removed from Grafana, restoring", prepared.uid);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let saved = client
        .save_dashboard(DashboardSaveRequest {
            dashboard: prepared.model.clone(),
            folder_uid: None,
            overwrite: true,
            message: Some(message.to_string()),
        })
        .await?;
    info!("Saved dashboard '{}' (uid {}) at version {}", prepared.title, saved.uid, saved.version);

    Ok(DashboardOutcome::Saved(SyncedDashboard {
        uid: saved.uid,
        id: Some(saved.id),
        url: saved.url,
        version: saved.version,
    }))
}

/// Status computed by one apply pass (without `lastReconciled`)
pub(crate) async fn desired_status(
    client: &dyn GrafanaClientTrait,
    dashboard: &GrafanaDashboard,
    namespace: &str,
    name: &str,
) -> Result<GrafanaDashboardStatus, ControllerError> {
    let current = dashboard.status.as_ref();
    let datasources = sync_datasources(client, dashboard.spec.datasources()).await?;

    let Some(json) = dashboard.spec.json() else {
        debug!("GrafanaDashboard {}/{} has no json, only data sources synced", namespace, name);
        // The dashboard stays in Grafana; keep its identity so cleanup can find it
        return Ok(GrafanaDashboardStatus {
            state: DashboardState::Pending,
            dashboard_uid: current.and_then(|s| s.dashboard_uid.clone()),
            dashboard_id: current.and_then(|s| s.dashboard_id),
            dashboard_url: current.and_then(|s| s.dashboard_url.clone()),
            version: current.and_then(|s| s.version),
            datasources,
            error: Some("spec.json is not set".to_string()),
            ..Default::default()
        });
    };

    let prepared = prepare_dashboard(json, namespace, name)?;
    let message = format!("Synced from GrafanaDashboard {}/{}", namespace, name);
    let outcome = sync_dashboard(client, &prepared, current, &message).await?;
    let synced = outcome.dashboard();

    if let Some(previous) = current.and_then(|s| s.dashboard_uid.as_deref()).filter(|uid| *uid != synced.uid) {
        info!("GrafanaDashboard {}/{} moved from uid {} to {}", namespace, name, previous, synced.uid);
        delete_dashboard_uid(client, previous, namespace, name).await?;
    }

    Ok(GrafanaDashboardStatus {
        state: DashboardState::Synced,
        dashboard_uid: Some(synced.uid.clone()),
        dashboard_id: synced.id,
        dashboard_url: Some(synced.url.clone()),
        version: Some(synced.version),
        content_hash: Some(prepared.content_hash),
        datasources,
        error: None,
        last_reconciled: None,
    })
}

/// Failed status that keeps what is known about the dashboard in Grafana
pub(crate) fn failed_status(current: Option<&GrafanaDashboardStatus>, error: &ControllerError) -> GrafanaDashboardStatus {
    GrafanaDashboardStatus {
        state: DashboardState::Failed,
        error: Some(error.to_string()),
        last_reconciled: None,
        ..current.cloned().unwrap_or_default()
    }
}

/// Stamp `lastReconciled` when the state changes, keep the old value otherwise.
pub(crate) fn with_timestamp(mut status: GrafanaDashboardStatus, current: Option<&GrafanaDashboardStatus>) -> GrafanaDashboardStatus {
    status.last_reconciled = match current {
        Some(c) if c.state == status.state => c.last_reconciled,
        _ => Some(chrono::Utc::now()),
    };
    status
}

impl Reconciler {
    /// Entry point for the watcher: runs apply or cleanup behind the finalizer.
    pub async fn reconcile_grafana_dashboard(&self, dashboard: Arc<GrafanaDashboard>) -> Result<Action, ControllerError> {
        let namespace = dashboard.namespace().unwrap_or_else(|| "default".to_string());
        let api = self.dashboard_api(&namespace);
        let started = Instant::now();

        let result = finalizer(&api, FINALIZER, dashboard, |event| async move {
            match event {
                Event::Apply(dashboard) => self.apply_dashboard(&dashboard).await,
                Event::Cleanup(dashboard) => self.cleanup_dashboard(&dashboard).await,
            }
        })
        .await
        .map_err(ControllerError::from);

        let outcome = if result.is_ok() { ReconcileResult::Success } else { ReconcileResult::Error };
        self.metrics.record(outcome, started.elapsed());
        result
    }

    async fn apply_dashboard(&self, dashboard: &GrafanaDashboard) -> Result<Action, ControllerError> {
        let name = dashboard.name_any();
        let namespace = dashboard.namespace().unwrap_or_else(|| "default".to_string());
        let key = resource_key(&namespace, &name);
        let current = dashboard.status.as_ref();

        info!("Reconciling GrafanaDashboard {}/{}", namespace, name);

        match desired_status(self.grafana_client.as_ref(), dashboard, &namespace, &name).await {
            Ok(desired) => {
                self.reset_error(&key);
                if status_needs_update(current, &desired) {
                    let status = with_timestamp(desired, current);
                    self.patch_status(&namespace, &name, &status).await?;
                    info!("GrafanaDashboard {}/{} is {}", namespace, name, status.state.as_str());
                } else {
                    debug!("GrafanaDashboard {}/{} status unchanged, skipping patch", namespace, name);
                }
                Ok(Action::requeue(self.resync_interval))
            }
            Err(e) => {
                let failed = failed_status(current, &e);
                if status_needs_update(current, &failed) {
                    let status = with_timestamp(failed, current);
                    if let Err(patch_err) = self.patch_status(&namespace, &name, &status).await {
                        error!("Failed to update GrafanaDashboard {}/{} error status: {}", namespace, name, patch_err);
                    }
                }
                Err(e)
            }
        }
    }

    async fn cleanup_dashboard(&self, dashboard: &GrafanaDashboard) -> Result<Action, ControllerError> {
        let name = dashboard.name_any();
        let namespace = dashboard.namespace().unwrap_or_else(|| "default".to_string());

        delete_dashboard(
            self.grafana_client.as_ref(),
            dashboard.status.as_ref(),
            dashboard.spec.json(),
            &namespace,
            &name,
        )
        .await?;

        self.forget_resource(&resource_key(&namespace, &name));
        Ok(Action::await_change())
    }
}

/// Remove the dashboard that belongs to a deleted GrafanaDashboard.
///
/// Data sources are left in place.
pub(crate) async fn delete_dashboard(
    client: &dyn GrafanaClientTrait,
    status: Option<&GrafanaDashboardStatus>,
    json: Option<&str>,
    namespace: &str,
    name: &str,
) -> Result<(), ControllerError> {
    let Some(uid) = dashboard_uid_for_cleanup(status, json, namespace, name) else {
        debug!("GrafanaDashboard {}/{} never produced a dashboard, nothing to delete", namespace, name);
        return Ok(());
    };

    delete_dashboard_uid(client, &uid, namespace, name).await
}

/// Delete one dashboard by uid; a dashboard that is already gone counts as deleted.
async fn delete_dashboard_uid(
    client: &dyn GrafanaClientTrait,
    uid: &str,
    namespace: &str,
    name: &str,
) -> Result<(), ControllerError> {
    match client.delete_dashboard_by_uid(uid).await {
        Ok(deleted) => {
            info!("Deleted dashboard {} for GrafanaDashboard {}/{}: {}", uid, namespace, name, deleted.message);
            Ok(())
        }
        Err(GrafanaError::NotFound(_)) => {
            warn!("Dashboard {} for GrafanaDashboard {}/{} was already gone", uid, namespace, name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
