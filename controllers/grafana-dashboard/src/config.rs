//! Controller configuration loaded from environment variables.

use crate::error::ControllerError;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_GRAFANA_URL: &str = "http://grafana.monitoring:3000";
const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Runtime configuration for the controller
#[derive(Clone)]
pub struct ControllerConfig {
    /// Grafana base URL
    pub grafana_url: String,
    /// Grafana service account token
    pub grafana_token: String,
    /// Namespace to watch (all namespaces when `None`)
    pub namespace: Option<String>,
    /// Bind address of the probes/metrics server
    pub metrics_addr: SocketAddr,
    /// Requeue period after a successful sync
    pub resync_interval: Duration,
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("grafana_url", &self.grafana_url)
            .field("namespace", &self.namespace)
            .field("metrics_addr", &self.metrics_addr)
            .field("resync_interval", &self.resync_interval)
            .finish_non_exhaustive()
    }
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let grafana_url = non_empty("GRAFANA_URL")
            .unwrap_or_else(|| DEFAULT_GRAFANA_URL.to_string());
        let grafana_token = non_empty("GRAFANA_TOKEN")
            .ok_or_else(|| ControllerError::InvalidConfig(
                "GRAFANA_TOKEN environment variable is required".to_string()
            ))?;
        let namespace = non_empty("WATCH_NAMESPACE");

        let metrics_addr_raw = non_empty("METRICS_ADDR")
            .unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string());
        let metrics_addr = metrics_addr_raw.parse::<SocketAddr>()
            .map_err(|e| ControllerError::InvalidConfig(format!(
                "METRICS_ADDR '{}' is not a socket address: {}",
                metrics_addr_raw, e
            )))?;

        let resync_secs = match non_empty("RESYNC_INTERVAL_SECS") {
            Some(raw) => raw.parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ControllerError::InvalidConfig(format!(
                    "RESYNC_INTERVAL_SECS '{}' must be a positive integer",
                    raw
                )))?,
            None => DEFAULT_RESYNC_INTERVAL_SECS,
        };

        Ok(Self {
            grafana_url,
            grafana_token,
            namespace,
            metrics_addr,
            resync_interval: Duration::from_secs(resync_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::from_lookup(lookup(&[("GRAFANA_TOKEN", "glsa_abc")])).unwrap();
        assert_eq!(config.grafana_url, "http://grafana.monitoring:3000");
        assert_eq!(config.grafana_token, "glsa_abc");
        assert!(config.namespace.is_none());
        assert_eq!(config.metrics_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.resync_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_missing_token() {
        let result = ControllerConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ControllerError::InvalidConfig(_))));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("GRAFANA_TOKEN", "t"),
            ("GRAFANA_URL", "  "),
            ("WATCH_NAMESPACE", ""),
        ]))
        .unwrap();
        assert_eq!(config.grafana_url, "http://grafana.monitoring:3000");
        assert!(config.namespace.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("GRAFANA_TOKEN", "t"),
            ("GRAFANA_URL", "https://grafana.example.com"),
            ("WATCH_NAMESPACE", "monitoring"),
            ("METRICS_ADDR", "127.0.0.1:9100"),
            ("RESYNC_INTERVAL_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.grafana_url, "https://grafana.example.com");
        assert_eq!(config.namespace.as_deref(), Some("monitoring"));
        assert_eq!(config.metrics_addr.port(), 9100);
        assert_eq!(config.resync_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_values() {
        let bad_addr = ControllerConfig::from_lookup(lookup(&[
            ("GRAFANA_TOKEN", "t"),
            ("METRICS_ADDR", "not-an-address"),
        ]));
        assert!(matches!(bad_addr, Err(ControllerError::InvalidConfig(_))));

        let zero_interval = ControllerConfig::from_lookup(lookup(&[
            ("GRAFANA_TOKEN", "t"),
            ("RESYNC_INTERVAL_SECS", "0"),
        ]));
        assert!(matches!(zero_interval, Err(ControllerError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_hides_token() {
        let config = ControllerConfig::from_lookup(lookup(&[("GRAFANA_TOKEN", "s3cr3t")])).unwrap();
        assert!(!format!("{:?}", config).contains("s3cr3t"));
    }
}
