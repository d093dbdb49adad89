//! `sqlward prompt`: print the rendered instruction.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use sqlward_core::catalog;
use sqlward_runtime::PromptTemplate;

use super::load_settings;

pub fn run(config: Option<&Path>, schema: &Path, request: Option<&str>) -> anyhow::Result<ExitCode> {
    let settings = load_settings(config)?;
    let template = PromptTemplate::new(settings.dialect.clone());

    let description = catalog::load_description(schema)
        .with_context(|| format!("failed to load schema from {}", schema.display()))?;

    println!("{}", template.render(&description));
    if let Some(request) = request {
        println!();
        println!("{}", template.render_user_turn(request));
    }

    Ok(ExitCode::SUCCESS)
}
