// ── Reconciliation orchestrator ──
//
// Folder once, template once, then per edge in configuration order:
// datasource, then dashboard. Every step awaits its request before the next
// one starts. Grafana is not transactional across these calls; a rerun is
// the recovery path for a run that stopped halfway.

use tracing::{error, info, warn};

use edgedash_api::GrafanaClient;

use crate::config::{Edge, FailurePolicy, ReconcileConfig};
use crate::dashboard::ensure_dashboard;
use crate::datasource::ensure_datasource;
use crate::error::CoreError;
use crate::folder::ensure_folder;
use crate::report::{Action, DatasourceReport, EdgeReport, FolderReport, RunReport};
use crate::template::DashboardTemplate;

/// Runs one reconciliation pass against a Grafana instance.
pub struct Reconciler<'a> {
    client: &'a GrafanaClient,
    config: &'a ReconcileConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a GrafanaClient, config: &'a ReconcileConfig) -> Self {
        Self { client, config }
    }

    /// Reconcile the folder and every configured edge.
    ///
    /// Folder and template failures always abort. Edge failures abort under
    /// [`FailurePolicy::FailFast`] and are recorded in the report under
    /// [`FailurePolicy::Continue`].
    pub async fn run(&self) -> Result<RunReport, CoreError> {
        let folder = ensure_folder(self.client, &self.config.folder).await?;
        let folder = FolderReport {
            uid: folder.value.uid,
            title: folder.value.title,
            action: created_or_existing(folder.created),
        };

        let template = DashboardTemplate::load(&self.config.template_path).await?;
        template.warn_on_missing_tokens();

        if self.config.edges.is_empty() {
            warn!("no edges configured; only the folder was reconciled");
        }

        let mut edges = Vec::with_capacity(self.config.edges.len());
        for edge in &self.config.edges {
            let mut report = EdgeReport::new(edge.as_str());
            if let Err(err) = self.reconcile_edge(edge, &template, &mut report).await {
                match self.config.failure_policy {
                    FailurePolicy::FailFast => return Err(err),
                    FailurePolicy::Continue => {
                        error!(%edge, error = %err, "edge failed, continuing with the next one");
                        report.error = Some(err.to_string());
                    }
                }
            }
            edges.push(report);
        }

        let report = RunReport { folder, edges };
        info!(
            edges = report.edges.len(),
            created = report.created_count(),
            failed = report.failed_edges().count(),
            "reconciliation finished"
        );
        Ok(report)
    }

    async fn reconcile_edge(
        &self,
        edge: &Edge,
        template: &DashboardTemplate,
        report: &mut EdgeReport,
    ) -> Result<(), CoreError> {
        let settings = &self.config.datasource;
        let ds = ensure_datasource(self.client, edge, settings).await?;
        report.datasource = Some(DatasourceReport {
            name: settings.datasource_name(edge),
            uid: ds.value.clone(),
            action: created_or_existing(ds.created),
        });

        let dashboard = ensure_dashboard(
            self.client,
            edge,
            &ds.value,
            template,
            &self.config.folder.uid,
        )
        .await?;
        report.dashboard = Some(dashboard.into());
        Ok(())
    }
}

fn created_or_existing(created: bool) -> Action {
    if created {
        Action::Created
    } else {
        Action::Existing
    }
}
