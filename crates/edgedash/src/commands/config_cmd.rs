//! Config subcommand handlers.

use serde::Serialize;

use edgedash_config::Settings;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

/// Effective settings for display. The token itself never reaches this type.
#[derive(Serialize)]
struct ConfigView<'a> {
    #[serde(flatten)]
    settings: &'a Settings,
    #[serde(skip_serializing_if = "Option::is_none")]
    grafana_token: Option<&'static str>,
}

fn view(settings: &Settings) -> ConfigView<'_> {
    ConfigView {
        settings,
        grafana_token: settings.token_configured().then_some(REDACTED),
    }
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let settings = config::load(global)?;
            let toml = settings.to_toml()?;
            let rendered = output::render_single(global.output, &view(&settings), |v| {
                match v.grafana_token {
                    Some(token) => format!("{toml}grafana_token = \"{token}\""),
                    None => toml.trim_end().to_owned(),
                }
            })?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        ConfigCommand::Path => {
            let path = global.config.clone().unwrap_or_else(config::config_path);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
