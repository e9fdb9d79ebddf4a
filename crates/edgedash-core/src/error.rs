// ── Core error types ──
//
// A 404 from Grafana never shows up here: reconcilers turn it into a create.
// Every other API failure is wrapped with the resource it concerned and
// aborts the current step.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The kind of Grafana resource a reconciliation step works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Folder,
    Datasource,
    Dashboard,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Folder => "folder",
            Self::Datasource => "datasource",
            Self::Dashboard => "dashboard",
        })
    }
}

/// The rendered dashboard template is not a usable dashboard document.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("rendered template is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rendered template must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("rendered dashboard has no string \"uid\" field")]
    MissingUid,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} '{key}': {source}")]
    Api {
        kind: ResourceKind,
        key: String,
        #[source]
        source: edgedash_api::Error,
    },

    #[error("{kind} '{key}' was created but Grafana did not return its uid")]
    MissingUid { kind: ResourceKind, key: String },

    #[error("dashboard template for edge '{edge}': {source}")]
    Template {
        edge: String,
        #[source]
        source: TemplateError,
    },

    #[error("cannot read dashboard template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot set up Grafana client: {0}")]
    Connection(#[source] edgedash_api::Error),

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CoreError {
    pub(crate) fn api(kind: ResourceKind, key: &str, source: edgedash_api::Error) -> Self {
        Self::Api {
            kind,
            key: key.to_owned(),
            source,
        }
    }

    /// The underlying API error, if this failure came from a Grafana call.
    pub fn api_error(&self) -> Option<&edgedash_api::Error> {
        match self {
            Self::Api { source, .. } | Self::Connection(source) => Some(source),
            _ => None,
        }
    }
}
