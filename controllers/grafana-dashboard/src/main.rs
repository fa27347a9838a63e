//! GrafanaDashboard Controller
//!
//! Keeps Grafana in sync with GrafanaDashboard custom resources:
//! - data sources listed in a dashboard are created or updated in Grafana
//! - the dashboard JSON is saved to Grafana and restored when it drifts
//! - the dashboard is removed from Grafana when the resource is deleted

mod backoff;
mod config;
mod controller;
mod error;
mod metrics;
mod reconcile_helpers;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube and reqwest both use rustls; pick the provider once for the process
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting GrafanaDashboard Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Grafana URL: {}", config.grafana_url);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Metrics address: {}", config.metrics_addr);
    info!("  Resync interval: {}s", config.resync_interval.as_secs());

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
