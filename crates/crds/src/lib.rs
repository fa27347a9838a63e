//! GrafanaDashboard CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the Grafana dashboard controller.

pub mod grafana_dashboard;
pub mod grafana_datasource;

pub use grafana_dashboard::*;
pub use grafana_datasource::*;
