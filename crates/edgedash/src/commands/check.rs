//! `edgedash check`: reachability and token check via `/api/health`.

use serde::Serialize;

use edgedash_api::Health;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct CheckResult {
    url: String,
    #[serde(flatten)]
    health: Health,
}

fn detail(result: &CheckResult) -> String {
    format!(
        "Grafana {} at {}\nDatabase: {}",
        result.health.version.as_deref().unwrap_or("(version hidden)"),
        result.url,
        result.health.database,
    )
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let settings = config::load(global)?;
    let connection = settings.connection()?;
    let client = connection.client()?;

    let health = client
        .health()
        .await
        .map_err(|e| CliError::from_api("health check".into(), e))?;

    let result = CheckResult {
        url: connection.url.to_string(),
        health,
    };
    let rendered = output::render_single(global.output, &result, detail)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
