//! `sqlward validate` and `sqlward clean`: deterministic checks, no model.

use std::path::Path;
use std::process::ExitCode;

use sqlward_core::{OutcomeCategory, OutcomeReport, PolicyTable, ValidationPolicy, ValidationResult};

use super::{load_settings, PrintedReport};

fn policy_table(config: Option<&Path>) -> anyhow::Result<PolicyTable> {
    match config {
        Some(_) => Ok(load_settings(config)?.policy_table()?),
        None => Ok(PolicyTable::builtin().clone()),
    }
}

pub fn validate(
    config: Option<&Path>,
    sql: &str,
    policy: ValidationPolicy,
    clean: bool,
) -> anyhow::Result<ExitCode> {
    let table = policy_table(config)?;

    let candidate = if clean {
        table.clean(sql, policy)
    } else {
        sql.trim().to_string()
    };

    let report = match table.validate(&candidate, policy) {
        ValidationResult::Valid(statement) => OutcomeReport::accepted(statement),
        ValidationResult::Invalid(rejection) => {
            let category = if rejection.is_sentinel() {
                OutcomeCategory::Sentinel
            } else {
                OutcomeCategory::Safety
            };
            OutcomeReport::rejected(
                category,
                (!candidate.is_empty()).then_some(candidate),
                rejection.reason(),
            )
        }
    };

    PrintedReport::new(report, policy).emit()
}

pub fn clean(config: Option<&Path>, text: &str, policy: ValidationPolicy) -> anyhow::Result<ExitCode> {
    let table = policy_table(config)?;
    println!("{}", table.clean(text, policy));
    Ok(ExitCode::SUCCESS)
}
