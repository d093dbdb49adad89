pub mod check;
pub mod doctor;
pub mod generate;
pub mod prompt;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlward_core::{OutcomeReport, ValidationPolicy};
use sqlward_runtime::Settings;

/// Report printed to stdout.
#[derive(Debug, Serialize)]
pub struct PrintedReport {
    #[serde(flatten)]
    pub report: OutcomeReport,

    pub policy: ValidationPolicy,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    pub generated_at: DateTime<Utc>,
}

impl PrintedReport {
    pub fn new(report: OutcomeReport, policy: ValidationPolicy) -> Self {
        Self {
            report,
            policy,
            provider: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Print as pretty JSON; exit status reflects acceptance.
    pub fn emit(&self) -> anyhow::Result<ExitCode> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(if self.report.accepted {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

pub fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = Settings::load(config).context("failed to load settings")?;
    tracing::debug!(
        config = ?config,
        provider = %settings.provider,
        dialect = %settings.dialect,
        "Loaded settings"
    );
    Ok(settings)
}
