//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text
//! and a stable exit code per failure class.

use miette::Diagnostic;
use thiserror::Error;

use edgedash_config::ConfigError;
use edgedash_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const TEMPLATE: i32 = 9;
    pub const PARTIAL: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach Grafana ({context})")]
    #[diagnostic(
        code(edgedash::connection_failed),
        help(
            "Check that Grafana is running and GRAFANA_URL is correct.\n\
             For a self-signed certificate set EDGEDASH_GRAFANA_CA_CERT, or use --insecure (-k)."
        )
    )]
    ConnectionFailed {
        context: String,
        #[source]
        source: edgedash_api::Error,
    },

    #[error("Request timed out after {seconds}s ({context})")]
    #[diagnostic(
        code(edgedash::timeout),
        help("Increase the timeout with --timeout or EDGEDASH_TIMEOUT.")
    )]
    Timeout { context: String, seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Grafana rejected the token ({context}): {reason}")]
    #[diagnostic(
        code(edgedash::auth_failed),
        help(
            "Check GRAFANA_TOKEN. The service account needs permission to create \
             folders, data sources, and dashboards (Admin role)."
        )
    )]
    AuthFailed { context: String, reason: String },

    // ── Grafana ──────────────────────────────────────────────────────

    #[error("{context} not found: {message}")]
    #[diagnostic(
        code(edgedash::not_found),
        help("The folder may have been deleted while the run was in progress. Rerun sync.")
    )]
    NotFound { context: String, message: String },

    #[error("Grafana request failed ({context})")]
    #[diagnostic(
        code(edgedash::api_error),
        help("Resources created so far are kept; rerunning sync continues from here.")
    )]
    Grafana {
        context: String,
        #[source]
        source: edgedash_api::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(edgedash::reconcile))]
    Reconcile(CoreError),

    // ── Template ─────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(edgedash::template),
        help(
            "The template must be a JSON object with a top-level \"uid\" after \
             ${{EDGE_NAME}}, ${{DATASOURCE_UID}} and ${{UID_SUFFIX}} are substituted.\n\
             Try: edgedash render --edge <EDGE> --datasource-uid test"
        )
    )]
    Template(CoreError),

    // ── Partial failure ──────────────────────────────────────────────

    #[error("{failed} of {total} edges failed: {edges}")]
    #[diagnostic(
        code(edgedash::partial_failure),
        help("Completed edges are in place. Fix the errors above and rerun sync.")
    )]
    PartialFailure {
        failed: usize,
        total: usize,
        edges: String,
    },

    // ── Validation / configuration ───────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(edgedash::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(
        code(edgedash::config),
        help(
            "Inspect the effective settings with: edgedash config show\n\
             Environment variables override the config file; flags override both."
        )
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(edgedash::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(edgedash::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Template(_) => exit_code::TEMPLATE,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Classify an API failure by what went wrong on the wire.
    pub fn from_api(context: String, err: edgedash_api::Error) -> Self {
        use edgedash_api::Error as ApiError;

        match err {
            ApiError::Timeout { timeout_secs } => Self::Timeout {
                context,
                seconds: timeout_secs,
            },
            ApiError::InvalidToken { message } => Self::AuthFailed {
                context,
                reason: message,
            },
            ref e if e.is_unauthorized() => Self::AuthFailed {
                context,
                reason: e.to_string(),
            },
            ApiError::Api {
                status: 404,
                message,
                ..
            } => Self::NotFound { context, message },
            e @ (ApiError::Transport(_) | ApiError::Tls(_)) => Self::ConnectionFailed {
                context,
                source: e,
            },
            e => Self::Grafana { context, source: e },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api { kind, key, source } => Self::from_api(format!("{kind} '{key}'"), source),
            CoreError::Connection(source) => Self::from_api("client setup".into(), source),
            err @ (CoreError::Template { .. } | CoreError::TemplateRead { .. }) => Self::Template(err),
            CoreError::InvalidConfig { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
            err @ CoreError::MissingUid { .. } => Self::Reconcile(err),
        }
    }
}
