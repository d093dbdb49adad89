//! `sqlward doctor`: show provider configuration.

use std::path::Path;
use std::process::ExitCode;

use sqlward_runtime::{ProviderKind, Settings};

pub async fn run(config: Option<&Path>) -> anyhow::Result<ExitCode> {
    println!("sqlward doctor");
    println!("==============\n");

    let settings = match Settings::load(config) {
        Ok(settings) => {
            println!("  [ok]   settings valid");
            settings
        }
        Err(e) => {
            println!("  [fail] settings invalid: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut issues = 0;

    match settings.policy_table() {
        Ok(table) => println!("  [ok]   policy table loaded ({} policies)", table.policies().count()),
        Err(e) => {
            println!("  [fail] policy table invalid: {e}");
            issues += 1;
        }
    }

    println!("         active provider: {}", settings.provider);
    println!("         timeout: {:?}", settings.timeout);
    println!("         dialect: {}", settings.dialect);
    println!();

    for kind in ProviderKind::ALL {
        let provider = kind.build(&settings);
        let marker = if kind == settings.provider { "*" } else { " " };
        println!(
            "  {} {:<7} model={} endpoint={}",
            marker,
            kind.as_str(),
            provider.model(),
            provider.base_url()
        );

        if provider.health_check().await {
            println!("           credential configured");
        } else if kind == settings.provider {
            println!("           credential missing");
            issues += 1;
        } else {
            println!("           credential not set");
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("  {issues} issue(s) found.");
        Ok(ExitCode::FAILURE)
    }
}
