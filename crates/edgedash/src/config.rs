//! CLI configuration: `edgedash_config` settings plus flag overrides.
//!
//! Flags are the last layer; anything set here wins over the config file and
//! the environment.

use edgedash_config::{Settings, load_settings, split_edges};
use edgedash_core::FailurePolicy;

use crate::cli::{GlobalOpts, OnError, SyncArgs};
use crate::error::CliError;

pub use edgedash_config::config_path;

/// Load layered settings and apply the global flags.
pub fn load(global: &GlobalOpts) -> Result<Settings, CliError> {
    let mut settings = load_settings(global.config.as_deref())?;
    apply_global(&mut settings, global);
    Ok(settings)
}

fn apply_global(settings: &mut Settings, global: &GlobalOpts) {
    if let Some(ref url) = global.url {
        settings.grafana_url = Some(url.clone());
    }
    if let Some(ref token) = global.token {
        settings.grafana_token = Some(token.clone());
    }
    if let Some(timeout) = global.timeout {
        settings.timeout = timeout;
    }
    if global.insecure {
        settings.insecure = true;
    }
}

/// Apply `sync` flags.
pub fn apply_sync(settings: &mut Settings, args: &SyncArgs) {
    if let Some(ref edges) = args.edges {
        settings.edges = split_edges(edges);
    }
    if let Some(ref template) = args.template {
        settings.template_path.clone_from(template);
    }
    if let Some(on_error) = args.on_error {
        settings.on_error = match on_error {
            OnError::FailFast => FailurePolicy::FailFast,
            OnError::Continue => FailurePolicy::Continue,
        };
    }
}
