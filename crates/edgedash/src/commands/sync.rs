//! `edgedash sync`: one reconciliation pass.

use std::fmt::Write as _;

use tabled::Tabled;
use tracing::debug;

use edgedash_core::{EdgeReport, Reconciler, RunReport};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct EdgeRow {
    #[tabled(rename = "Edge")]
    edge: String,
    #[tabled(rename = "Data source")]
    datasource: String,
    #[tabled(rename = "Data source UID")]
    datasource_uid: String,
    #[tabled(rename = "Dashboard")]
    dashboard: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&EdgeReport> for EdgeRow {
    fn from(e: &EdgeReport) -> Self {
        let (datasource, datasource_uid) = e.datasource.as_ref().map_or_else(
            || ("-".to_owned(), "-".to_owned()),
            |ds| (format!("{} ({})", ds.name, ds.action), ds.uid.clone()),
        );
        let dashboard = e.dashboard.as_ref().map_or_else(
            || "-".to_owned(),
            |d| match d.version {
                Some(v) => format!("{} (v{v}, {})", d.uid, d.action),
                None => format!("{} ({})", d.uid, d.action),
            },
        );
        Self {
            edge: e.edge.clone(),
            datasource,
            datasource_uid,
            dashboard,
            status: e
                .error
                .as_ref()
                .map_or_else(|| "ok".to_owned(), |err| format!("failed: {err}")),
        }
    }
}

fn detail(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Folder: {} ({}, {})",
        report.folder.title, report.folder.uid, report.folder.action
    );
    if report.edges.is_empty() {
        out.push_str("No edges configured.");
        return out;
    }
    let rows: Vec<EdgeRow> = report.edges.iter().map(EdgeRow::from).collect();
    out.push_str(&output::render_table(&rows));
    out
}

pub async fn handle(args: &SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut settings = config::load(global)?;
    config::apply_sync(&mut settings, args);

    let connection = settings.connection()?;
    let reconcile = settings.reconcile_config()?;
    let client = connection.client()?;
    debug!(url = %connection.url, edges = reconcile.edges.len(), "starting sync");

    let report = Reconciler::new(&client, &reconcile).run().await?;

    let rendered = output::render_single(global.output, &report, detail)?;
    output::print_output(&rendered, global.quiet);

    if report.has_failures() {
        let failed: Vec<&str> = report.failed_edges().map(|e| e.edge.as_str()).collect();
        return Err(CliError::PartialFailure {
            failed: failed.len(),
            total: report.edges.len(),
            edges: failed.join(", "),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use edgedash_core::{Action, DashboardReport, DatasourceReport, FolderReport};

    use super::*;

    fn report() -> RunReport {
        let mut ok = EdgeReport::new("edge-a");
        ok.datasource = Some(DatasourceReport {
            name: "Mimir - edge-a".into(),
            uid: "ds-a".into(),
            action: Action::Created,
        });
        ok.dashboard = Some(DashboardReport {
            uid: "edge-edge-a".into(),
            url: None,
            version: Some(1),
            action: Action::Created,
        });
        let mut failed = EdgeReport::new("edge-b");
        failed.error = Some("boom".into());
        RunReport {
            folder: FolderReport {
                uid: "edges-folder".into(),
                title: "Edges".into(),
                action: Action::Existing,
            },
            edges: vec![ok, failed],
        }
    }

    #[test]
    fn table_shows_folder_and_every_edge() {
        let out = detail(&report());
        assert!(out.starts_with("Folder: Edges (edges-folder, existing)"), "{out}");
        assert!(out.contains("Mimir - edge-a (created)"), "{out}");
        assert!(out.contains("edge-edge-a (v1, created)"), "{out}");
        assert!(out.contains("failed: boom"), "{out}");
    }

    #[test]
    fn empty_run_says_so() {
        let mut r = report();
        r.edges.clear();
        assert!(detail(&r).ends_with("No edges configured."));
    }
}
