//! `sqlward generate`: full pipeline.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use sqlward_core::{catalog, ValidationPolicy};
use sqlward_runtime::{GenerationRequest, Pipeline};

use super::{load_settings, PrintedReport};

pub async fn run(
    config: Option<&Path>,
    request: &str,
    schema: &Path,
    policy: ValidationPolicy,
) -> anyhow::Result<ExitCode> {
    let settings = load_settings(config)?;
    let pipeline = Pipeline::from_settings(&settings).context("failed to build pipeline")?;

    tracing::debug!(
        provider = %settings.provider,
        policy = %policy,
        timeout = ?settings.timeout,
        "Pipeline ready"
    );

    let description = catalog::load_description(schema)
        .with_context(|| format!("failed to load schema from {}", schema.display()))?;
    tracing::debug!(schema = %schema.display(), chars = description.len(), "Loaded schema description");

    let outcome = pipeline
        .generate_and_validate(&GenerationRequest::new(request, description), policy)
        .await;

    PrintedReport::new(outcome.report(), policy)
        .with_provider(settings.provider.as_str())
        .emit()
}
