//! Clap derive structures for the `edgedash` CLI.
//!
//! Only clap and clap_complete may be used here: build.rs includes this file
//! to generate man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// edgedash -- per-edge Grafana provisioning
#[derive(Debug, Parser)]
#[command(
    name = "edgedash",
    version,
    about = "Reconcile per-edge Grafana folders, data sources, and dashboards",
    long_about = "Ensures a shared dashboard folder exists, then creates one Mimir data \
        source per edge (tenant routed through the tenant header) and upserts one \
        dashboard per edge rendered from a JSON template.\n\n\
        Every run is idempotent: existing folders and data sources are left \
        untouched, dashboards are overwritten.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (default: platform config dir, edgedash/config.toml)
    #[arg(long, env = "EDGEDASH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Grafana base URL (overrides GRAFANA_URL and the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Grafana service account token (overrides EDGEDASH_GRAFANA_TOKEN and GRAFANA_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates from Grafana
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "EDGEDASH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// What to do when one edge fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Abort the run on the first failure
    FailFast,
    /// Record the failure and move on to the next edge
    Continue,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile the folder and every edge against Grafana
    #[command(alias = "s")]
    Sync(SyncArgs),

    /// Render the dashboard for one edge without contacting Grafana
    #[command(long_about = "Render the dashboard for one edge without contacting Grafana.\n\n\
        The template must render to a JSON object carrying a top-level \"uid\" string; \
        documents without one are rejected with a template error.")]
    Render(RenderArgs),

    /// Check that Grafana is reachable and the token is accepted
    Check,

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Comma-separated edges (overrides EDGES and the config file)
    #[arg(long, short = 'e', value_name = "EDGE,...")]
    pub edges: Option<String>,

    /// Dashboard template file; must render to a JSON object with a top-level uid
    #[arg(long, short = 't')]
    pub template: Option<PathBuf>,

    /// Failure handling across edges
    #[arg(long, value_enum)]
    pub on_error: Option<OnError>,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Edge to render the dashboard for
    #[arg(long, short = 'e')]
    pub edge: String,

    /// Data source uid substituted for ${DATASOURCE_UID}
    #[arg(long, short = 'd')]
    pub datasource_uid: String,

    /// Dashboard template file; must render to a JSON object with a top-level uid
    #[arg(long, short = 't')]
    pub template: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (token redacted)
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
