// What a reconciliation run did, per resource. Serializable so the CLI can
// print it as a table, JSON, or YAML.

use std::fmt;

use serde::Serialize;

use crate::dashboard::DashboardOutcome;

/// What happened to one resource during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Created by this run.
    Created,
    /// Already present; left untouched.
    Existing,
    /// Present and overwritten.
    Updated,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Existing => "existing",
            Self::Updated => "updated",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderReport {
    pub uid: String,
    pub title: String,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasourceReport {
    pub name: String,
    pub uid: String,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardReport {
    pub uid: String,
    pub url: Option<String>,
    pub version: Option<i64>,
    pub action: Action,
}

impl From<DashboardOutcome> for DashboardReport {
    fn from(outcome: DashboardOutcome) -> Self {
        Self {
            action: if outcome.created {
                Action::Created
            } else {
                Action::Updated
            },
            uid: outcome.uid,
            url: outcome.url,
            version: outcome.version,
        }
    }
}

/// Everything that happened for one edge. Steps that never ran are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeReport {
    pub edge: String,
    pub datasource: Option<DatasourceReport>,
    pub dashboard: Option<DashboardReport>,
    pub error: Option<String>,
}

impl EdgeReport {
    pub fn new(edge: impl Into<String>) -> Self {
        Self {
            edge: edge.into(),
            datasource: None,
            dashboard: None,
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub folder: FolderReport,
    pub edges: Vec<EdgeReport>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.edges.iter().any(EdgeReport::is_failed)
    }

    pub fn failed_edges(&self) -> impl Iterator<Item = &EdgeReport> {
        self.edges.iter().filter(|e| e.is_failed())
    }

    /// Number of folders and data sources created by this run.
    ///
    /// Dashboards are excluded: they are rewritten on every run.
    pub fn created_count(&self) -> usize {
        let folder = usize::from(self.folder.action == Action::Created);
        folder
            + self
                .edges
                .iter()
                .filter_map(|e| e.datasource.as_ref())
                .filter(|ds| ds.action == Action::Created)
                .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(edges: Vec<EdgeReport>, folder_action: Action) -> RunReport {
        RunReport {
            folder: FolderReport {
                uid: "edges-folder".into(),
                title: "Edges".into(),
                action: folder_action,
            },
            edges,
        }
    }

    fn ds(action: Action) -> Option<DatasourceReport> {
        Some(DatasourceReport {
            name: "Mimir - a".into(),
            uid: "u".into(),
            action,
        })
    }

    #[test]
    fn counts_created_folder_and_datasources() {
        let mut a = EdgeReport::new("a");
        a.datasource = ds(Action::Created);
        let mut b = EdgeReport::new("b");
        b.datasource = ds(Action::Existing);
        let r = report(vec![a, b], Action::Created);
        assert_eq!(r.created_count(), 2);
        assert!(!r.has_failures());
    }

    #[test]
    fn failures_are_visible() {
        let mut a = EdgeReport::new("a");
        a.error = Some("boom".into());
        let r = report(vec![a, EdgeReport::new("b")], Action::Existing);
        assert!(r.has_failures());
        let failed: Vec<_> = r.failed_edges().map(|e| e.edge.as_str()).collect();
        assert_eq!(failed, ["a"]);
    }

    #[test]
    fn dashboard_version_one_means_created() {
        let created = DashboardReport::from(DashboardOutcome {
            uid: "edge-a".into(),
            url: None,
            version: Some(1),
            created: true,
        });
        assert_eq!(created.action, Action::Created);

        let updated = DashboardReport::from(DashboardOutcome {
            uid: "edge-a".into(),
            url: None,
            version: Some(4),
            created: false,
        });
        assert_eq!(updated.action, Action::Updated);
    }

    #[test]
    fn serializes_actions_lowercase() {
        let json = serde_json::to_value(report(Vec::new(), Action::Existing)).unwrap();
        assert_eq!(json["folder"]["action"], "existing");
    }
}
