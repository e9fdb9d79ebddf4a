//! `edgedash render`: offline template preview.

use edgedash_core::{CoreError, DashboardTemplate, Edge, TemplateValues, uid_safe};

use crate::cli::{GlobalOpts, OutputFormat, RenderArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &RenderArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let template_path = match args.template {
        Some(ref path) => path.clone(),
        None => config::load(global)?.template_path,
    };
    let edge = Edge::new(&args.edge)?;

    let template = DashboardTemplate::load(&template_path).await?;
    template.warn_on_missing_tokens();

    let uid_suffix = uid_safe(edge.as_str());
    let document = template
        .render_document(&TemplateValues {
            edge_name: edge.as_str(),
            datasource_uid: &args.datasource_uid,
            uid_suffix: &uid_suffix,
        })
        .map_err(|source| CoreError::Template {
            edge: edge.to_string(),
            source,
        })?;

    // The rendered dashboard is JSON; a table view adds nothing.
    let rendered = match global.output {
        OutputFormat::Table | OutputFormat::Json => output::render_json_pretty(&document)?,
        OutputFormat::Yaml => output::render_yaml(&document)?,
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
