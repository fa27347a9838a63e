//! Helper functions for common reconciliation patterns
//!
//! Pure functions shared by the dashboard and data source reconcilers: turning
//! `spec.json` into a Grafana dashboard model, mapping CRD data sources onto
//! API requests, and deciding when Grafana or the CR status needs a write.

use crate::error::ControllerError;
use crds::{GrafanaDashboardStatus, GrafanaDatasource};
use grafana_client::{Datasource, DatasourceRequest};
use sha2::{Digest, Sha256};

/// Grafana rejects dashboard UIDs longer than this
pub const MAX_UID_LEN: usize = 40;

/// Dashboard model ready to be pushed to Grafana
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDashboard {
    /// Model with `uid` set and Grafana-managed fields removed
    pub model: serde_json::Value,
    pub uid: String,
    pub title: String,
    /// sha256 (hex) of the serialized model
    pub content_hash: String,
}

/// Key used for per-resource bookkeeping
pub fn resource_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// UID for dashboards whose JSON does not carry one.
///
/// Hex sha256 of `namespace/name`, cut to Grafana's limit. `namespace-name`
/// is not used: it is ambiguous when either part contains `-`, and `.` in
/// resource names is not a valid uid character.
pub fn derive_dashboard_uid(namespace: &str, name: &str) -> String {
    sha256_hex(resource_key(namespace, name).as_bytes())[..MAX_UID_LEN].to_string()
}

/// Parse `spec.json` into the model sent to Grafana.
///
/// The document must be a JSON object with a non-empty `title`. `id` and
/// `version` are owned by Grafana and dropped. An explicit `uid` is kept,
/// otherwise one is derived from the resource's namespace and name.
pub fn prepare_dashboard(json: &str, namespace: &str, name: &str) -> Result<PreparedDashboard, ControllerError> {
    let mut model: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ControllerError::InvalidDashboard(format!("spec.json is not valid JSON: {}", e)))?;

    let object = model.as_object_mut()
        .ok_or_else(|| ControllerError::InvalidDashboard("spec.json must be a JSON object".to_string()))?;

    let title = object.get("title")
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ControllerError::InvalidDashboard("dashboard model has no title".to_string()))?;

    let uid = match object.get("uid") {
        Some(serde_json::Value::String(uid)) if !uid.is_empty() => {
            if uid.len() > MAX_UID_LEN {
                return Err(ControllerError::InvalidDashboard(format!(
                    "dashboard uid '{}' is longer than {} characters",
                    uid, MAX_UID_LEN
                )));
            }
            uid.clone()
        }
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => derive_dashboard_uid(namespace, name),
        Some(other) => {
            return Err(ControllerError::InvalidDashboard(format!(
                "dashboard uid must be a string, got {}",
                other
            )));
        }
    };

    object.remove("id");
    object.remove("version");
    object.insert("uid".to_string(), serde_json::Value::String(uid.clone()));

    // serde_json maps are key-ordered, so equal models serialize identically
    let serialized = serde_json::to_string(&model)
        .map_err(|e| ControllerError::InvalidDashboard(format!("dashboard model cannot be serialized: {}", e)))?;
    let content_hash = sha256_hex(serialized.as_bytes());

    Ok(PreparedDashboard {
        model,
        uid,
        title,
        content_hash,
    })
}

/// UID to delete when a GrafanaDashboard goes away.
///
/// Prefers what the controller recorded in status. Without a recorded uid only
/// the derived uid is used: an explicit `uid` in the JSON may name a dashboard
/// this resource never saved.
pub fn dashboard_uid_for_cleanup(
    status: Option<&GrafanaDashboardStatus>,
    json: Option<&str>,
    namespace: &str,
    name: &str,
) -> Option<String> {
    if let Some(uid) = status.and_then(|s| s.dashboard_uid.clone()) {
        return Some(uid);
    }
    let derived = derive_dashboard_uid(namespace, name);
    json.and_then(|j| prepare_dashboard(j, namespace, name).ok())
        .filter(|p| p.uid == derived)
        .map(|p| p.uid)
}

/// Map a CRD data source onto the Grafana create/update body
pub fn datasource_request(datasource: &GrafanaDatasource) -> DatasourceRequest {
    DatasourceRequest {
        name: datasource.name.clone(),
        datasource_type: datasource.datasource_type.clone(),
        uid: datasource.uid.clone(),
        url: datasource.url.clone(),
        access: datasource.access.map(|a| a.as_str().to_string()),
        is_default: datasource.is_default,
        database: datasource.database.clone(),
        user: datasource.user.clone(),
        basic_auth: datasource.basic_auth,
        json_data: datasource.json_data.clone(),
    }
}

/// Update body for an existing data source.
///
/// Grafana's PUT replaces the whole record, so fields left unset in the CRD
/// are carried over from `existing`.
pub fn datasource_update_request(existing: &Datasource, desired: &GrafanaDatasource) -> DatasourceRequest {
    DatasourceRequest {
        name: desired.name.clone(),
        datasource_type: desired.datasource_type.clone(),
        uid: Some(existing.uid.clone()),
        url: desired.url.clone().or_else(|| Some(existing.url.clone())),
        access: desired
            .access
            .map(|a| a.as_str().to_string())
            .or_else(|| Some(existing.access.clone())),
        is_default: desired.is_default.or(Some(existing.is_default)),
        database: desired.database.clone().or_else(|| Some(existing.database.clone())),
        user: desired.user.clone().or_else(|| Some(existing.user.clone())),
        basic_auth: desired.basic_auth.or(Some(existing.basic_auth)),
        json_data: desired.json_data.clone().or_else(|| existing.json_data.clone()),
    }
}

/// Whether the data source in Grafana differs from the CRD definition.
///
/// Fields left unset in the CRD are not compared; Grafana keeps its own value.
pub fn datasource_needs_update(existing: &Datasource, desired: &GrafanaDatasource) -> bool {
    fn differs<T: PartialEq + ?Sized>(desired: Option<&T>, actual: &T) -> bool {
        desired.is_some_and(|d| d != actual)
    }

    existing.datasource_type != desired.datasource_type
        || differs(desired.url.as_deref(), existing.url.as_str())
        || differs(desired.access.map(|a| a.as_str()), existing.access.as_str())
        || differs(desired.is_default.as_ref(), &existing.is_default)
        || differs(desired.database.as_deref(), existing.database.as_str())
        || differs(desired.user.as_deref(), existing.user.as_str())
        || differs(desired.basic_auth.as_ref(), &existing.basic_auth)
        || desired.json_data.as_ref().is_some_and(|d| existing.json_data.as_ref() != Some(d))
}

/// Whether writing `desired` would change the recorded status.
///
/// `lastReconciled` is ignored; patching only on real changes avoids
/// reconcile loops driven by our own status writes.
pub fn status_needs_update(current: Option<&GrafanaDashboardStatus>, desired: &GrafanaDashboardStatus) -> bool {
    let Some(current) = current else {
        return true;
    };

    current.state != desired.state
        || current.dashboard_uid != desired.dashboard_uid
        || current.dashboard_id != desired.dashboard_id
        || current.dashboard_url != desired.dashboard_url
        || current.version != desired.version
        || current.content_hash != desired.content_hash
        || current.datasources != desired.datasources
        || current.error != desired.error
}

#[cfg(test)]
#[path = "reconcile_helpers_test.rs"]
mod tests;
