// Per-edge dashboard reconciliation: render the template, then upsert with
// overwrite so every run refreshes the dashboard body.

use serde::Serialize;
use tracing::info;

use edgedash_api::{DashboardUpsert, GrafanaClient};

use crate::config::Edge;
use crate::error::{CoreError, ResourceKind};
use crate::template::{DashboardTemplate, TemplateValues};

/// Grafana rejects longer dashboard uids once a prefix is added, so the
/// edge-derived part is capped here.
pub const UID_SUFFIX_MAX_LEN: usize = 36;

/// Derive a Grafana-safe uid fragment from an edge.
///
/// Lower-cases, maps everything outside `[a-z0-9_-]` to `-`, and keeps at
/// most [`UID_SUFFIX_MAX_LEN`] characters. Total for any input.
pub fn uid_safe(edge: &str) -> String {
    edge.chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .take(UID_SUFFIX_MAX_LEN)
        .collect()
}

/// Result of one dashboard upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardOutcome {
    pub uid: String,
    pub url: Option<String>,
    pub version: Option<i64>,
    /// Grafana reports version 1 for a dashboard it has never seen.
    pub created: bool,
}

/// Render the template for `edge` and upsert it into `folder_uid`.
pub async fn ensure_dashboard(
    client: &GrafanaClient,
    edge: &Edge,
    datasource_uid: &str,
    template: &DashboardTemplate,
    folder_uid: &str,
) -> Result<DashboardOutcome, CoreError> {
    let uid_suffix = uid_safe(edge.as_str());
    let dashboard = template
        .render_document(&TemplateValues {
            edge_name: edge.as_str(),
            datasource_uid,
            uid_suffix: &uid_suffix,
        })
        .map_err(|source| CoreError::Template {
            edge: edge.to_string(),
            source,
        })?;

    let body = DashboardUpsert {
        dashboard,
        folder_uid: folder_uid.to_owned(),
        message: format!("edgedash: update for {edge}"),
        overwrite: true,
    };

    let resp = client
        .upsert_dashboard(&body)
        .await
        .map_err(|source| CoreError::api(ResourceKind::Dashboard, edge.as_str(), source))?;

    info!(
        %edge,
        uid = %resp.uid,
        version = ?resp.version,
        url = resp.url.as_deref().unwrap_or(""),
        "upserted dashboard"
    );

    Ok(DashboardOutcome {
        created: resp.version == Some(1),
        uid: resp.uid,
        url: resp.url,
        version: resp.version,
    })
}
