//! Kubernetes resource watchers.
//!
//! Watches GrafanaDashboard resources and drives reconciliation through
//! `kube_runtime::Controller`, which handles reconnection, requeues and
//! per-object serialization of reconciles.

use crate::error::ControllerError;
use crate::reconcile_helpers::resource_key;
use crate::reconciler::Reconciler;
use crds::GrafanaDashboard;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::{Controller, watcher, controller::{Action, Config as ControllerConfig}};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

type ReconcileFuture = Pin<Box<dyn Future<Output = Result<Action, ControllerError>> + Send>>;

/// Generic watcher helper built on kube_runtime::Controller.
///
/// Failed reconciles are retried after the resource's Fibonacci backoff;
/// successful ones decide their own requeue through the returned `Action`.
async fn watch_resource<K, F>(
    api: Api<K>,
    reconciler: Arc<Reconciler>,
    reconcile_fn: F,
    resource_name: &'static str,
) -> Result<(), ControllerError>
where
    K: kube::Resource + Clone + Send + Sync + 'static + std::fmt::Debug + serde::de::DeserializeOwned,
    K::DynamicType: Default + std::cmp::Eq + std::hash::Hash + Clone + std::fmt::Debug + Unpin,
    F: Fn(Arc<Reconciler>, Arc<K>) -> ReconcileFuture + Send + Sync + Clone + 'static,
{
    info!("Starting {} watcher", resource_name);

    let error_policy = move |obj: Arc<K>, error: &ControllerError, ctx: Arc<Reconciler>| {
        let key = resource_key(obj.namespace().as_deref().unwrap_or("default"), &obj.name_any());
        error!("Reconciliation error for {} {}: {}", resource_name, key, error);
        Action::requeue(ctx.increment_error(&key))
    };

    let reconcile = move |obj: Arc<K>, ctx: Arc<Reconciler>| {
        let reconcile_fn = reconcile_fn.clone();
        async move {
            debug!("Reconciling {} {}", resource_name, obj.name_any());
            reconcile_fn(ctx, obj).await
        }
    };

    // Debounce batches bursts of events (including our own status patches)
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .shutdown_on_signal()
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!("Reconciled {} {}", resource_name, obj.name),
                Err(e) => error!("Controller error for {}: {}", resource_name, e),
            }
        })
        .await;

    info!("{} watcher stopped", resource_name);
    Ok(())
}

/// Watches Kubernetes resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    dashboard_api: Api<GrafanaDashboard>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(reconciler: Arc<Reconciler>, dashboard_api: Api<GrafanaDashboard>) -> Self {
        Self {
            reconciler,
            dashboard_api,
        }
    }

    /// Starts watching GrafanaDashboard resources.
    pub async fn watch_grafana_dashboards(&self) -> Result<(), ControllerError> {
        watch_resource(
            self.dashboard_api.clone(),
            self.reconciler.clone(),
            |reconciler, resource| {
                Box::pin(async move { reconciler.reconcile_grafana_dashboard(resource).await })
            },
            "GrafanaDashboard",
        )
        .await
    }
}
