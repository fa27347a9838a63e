//! Data source reconciliation.
//!
//! Data sources listed in `spec.datasources` are created in Grafana when
//! missing and updated when they drift. They are matched by name and never
//! deleted; other dashboards may depend on them.

use crate::error::ControllerError;
use crate::reconcile_helpers::{datasource_needs_update, datasource_request, datasource_update_request};
use crds::GrafanaDatasource;
use grafana_client::{Datasource, GrafanaClientTrait, GrafanaError};
use std::collections::HashSet;
use tracing::{debug, info};

/// What happened to a single data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasourceAction {
    Created,
    Updated,
    Unchanged,
}

async fn update_if_needed(
    client: &dyn GrafanaClientTrait,
    existing: &Datasource,
    desired: &GrafanaDatasource,
) -> Result<DatasourceAction, ControllerError> {
    if !datasource_needs_update(existing, desired) {
        debug!("Data source {} is up to date (uid {})", desired.name, existing.uid);
        return Ok(DatasourceAction::Unchanged);
    }

    client
        .update_datasource(&existing.uid, datasource_update_request(existing, desired))
        .await?;
    info!("Updated Grafana data source {} (uid {})", desired.name, existing.uid);
    Ok(DatasourceAction::Updated)
}

/// Ensure one data source exists in Grafana and matches its definition.
pub async fn sync_datasource(
    client: &dyn GrafanaClientTrait,
    desired: &GrafanaDatasource,
) -> Result<DatasourceAction, ControllerError> {
    if let Some(existing) = client.get_datasource_by_name(&desired.name).await? {
        return update_if_needed(client, &existing, desired).await;
    }

    match client.create_datasource(datasource_request(desired)).await {
        Ok(created) => {
            info!("Created Grafana data source {} (id {})", created.name, created.id);
            Ok(DatasourceAction::Created)
        }
        // Another writer created it between lookup and create
        Err(GrafanaError::Conflict(msg)) => {
            debug!("Data source {} appeared concurrently: {}", desired.name, msg);
            let existing = client
                .get_datasource_by_name(&desired.name)
                .await?
                .ok_or(GrafanaError::Conflict(msg))?;
            update_if_needed(client, &existing, desired).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Reject definitions Grafana would refuse or that are ambiguous.
fn validate_datasources(datasources: &[GrafanaDatasource]) -> Result<(), ControllerError> {
    let mut seen = HashSet::new();
    for datasource in datasources {
        if datasource.name.trim().is_empty() {
            return Err(ControllerError::InvalidDashboard(
                "data source name must not be empty".to_string(),
            ));
        }
        if datasource.datasource_type.trim().is_empty() {
            return Err(ControllerError::InvalidDashboard(format!(
                "data source {} has no type",
                datasource.name
            )));
        }
        if !seen.insert(datasource.name.as_str()) {
            return Err(ControllerError::InvalidDashboard(format!(
                "data source {} is listed more than once",
                datasource.name
            )));
        }
    }
    Ok(())
}

/// Sync every data source of a dashboard, in order.
///
/// Returns the names of the data sources that are now present in Grafana.
/// Validation happens before any API call, so an invalid list changes nothing.
pub async fn sync_datasources(
    client: &dyn GrafanaClientTrait,
    datasources: &[GrafanaDatasource],
) -> Result<Vec<String>, ControllerError> {
    validate_datasources(datasources)?;

    let mut synced = Vec::with_capacity(datasources.len());
    for datasource in datasources {
        sync_datasource(client, datasource).await?;
        synced.push(datasource.name.clone());
    }
    Ok(synced)
}
