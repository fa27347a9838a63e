//! Main controller implementation.
//!
//! `Controller` wires the Kubernetes client, the Grafana client, the
//! reconciler, the GrafanaDashboard watcher and the probes/metrics server,
//! and runs them until one of them stops.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::{self, Metrics};
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use crds::GrafanaDashboard;
use grafana_client::GrafanaClient;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Main controller for GrafanaDashboard resources.
pub struct Controller {
    dashboard_watcher: JoinHandle<Result<(), ControllerError>>,
    metrics_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing GrafanaDashboard Controller");

        let kube_client = Client::try_default().await?;

        let grafana_client = GrafanaClient::new(config.grafana_url.clone(), config.grafana_token.clone())?;

        // Validate token and connectivity before proceeding
        info!("Validating Grafana token and connectivity...");
        grafana_client.validate_token().await
            .map_err(|e| {
                error!("Failed to validate Grafana token: {}", e);
                error!("Please ensure:");
                error!("  1. GRAFANA_TOKEN environment variable is set correctly");
                error!("  2. The service account token is valid and has Editor rights");
                error!("  3. Grafana is reachable at {}", config.grafana_url);
                ControllerError::Grafana(e)
            })?;
        info!("Grafana token validated");

        match grafana_client.health().await {
            Ok(health) => info!("Connected to Grafana {} (database: {})", health.version, health.database),
            Err(e) => warn!("Grafana health check failed (will continue): {}", e),
        }

        let metrics = Arc::new(Metrics::new()?);

        let dashboard_api: Api<GrafanaDashboard> = match config.namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client.clone(), ns),
            None => Api::all(kube_client.clone()),
        };

        let reconciler = Arc::new(Reconciler::new(
            grafana_client,
            kube_client,
            metrics.clone(),
            config.resync_interval,
        ));
        let watcher = Watcher::new(reconciler, dashboard_api);

        let dashboard_watcher = tokio::spawn(async move {
            watcher.watch_grafana_dashboards().await
        });
        let metrics_server = tokio::spawn(metrics::serve(config.metrics_addr, metrics.clone()));

        metrics.set_ready(true);
        info!("GrafanaDashboard Controller initialized");

        Ok(Self {
            dashboard_watcher,
            metrics_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("GrafanaDashboard Controller running");

        tokio::select! {
            result = &mut self.dashboard_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("GrafanaDashboard watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("GrafanaDashboard watcher error: {}", e)))?;
                info!("GrafanaDashboard watcher stopped, shutting down");
                self.metrics_server.abort();
                Ok(())
            }
            result = &mut self.metrics_server => {
                result.map_err(|e| ControllerError::Metrics(format!("Metrics server panicked: {}", e)))??;
                Err(ControllerError::Metrics("Metrics server exited unexpectedly".to_string()))
            }
        }
    }
}
