//! sqlward CLI.
//!
//! Commands:
//! - `generate`: natural language to a validated statement
//! - `validate`: run the safety validator on a statement
//! - `clean`: run the response sanitizer on raw text
//! - `prompt`: print the rendered instruction
//! - `doctor`: show provider configuration

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sqlward_core::ValidationPolicy;

mod commands;

#[derive(Parser)]
#[command(
    name = "sqlward",
    about = "Natural-language SQL generation with a safety gate",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a statement for a request and validate it
    Generate {
        /// The natural-language request
        request: String,

        /// Schema description: YAML/JSON table metadata, or plain text
        #[arg(short, long)]
        schema: PathBuf,

        /// Validation policy (strict or restricted)
        #[arg(short, long, default_value = "strict")]
        policy: ValidationPolicy,
    },

    /// Validate a statement without calling a model
    Validate {
        /// The statement to check
        sql: String,

        /// Validation policy (strict or restricted)
        #[arg(short, long, default_value = "strict")]
        policy: ValidationPolicy,

        /// Sanitize the text before validating
        #[arg(long)]
        clean: bool,
    },

    /// Reduce raw model output to a candidate statement
    Clean {
        /// Raw model output
        text: String,

        /// Extract statements with this policy's leading verbs
        #[arg(short, long, default_value = "strict")]
        policy: ValidationPolicy,
    },

    /// Print the instruction sent to the model
    Prompt {
        /// Schema description: YAML/JSON table metadata, or plain text
        #[arg(short, long)]
        schema: PathBuf,

        /// Also print the user turn for this request
        #[arg(short, long)]
        request: Option<String>,
    },

    /// Show provider configuration and credential status
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Generate {
            request,
            schema,
            policy,
        } => commands::generate::run(config, &request, &schema, policy).await,
        Commands::Validate { sql, policy, clean } => {
            commands::check::validate(config, &sql, policy, clean)
        }
        Commands::Clean { text, policy } => commands::check::clean(config, &text, policy),
        Commands::Prompt { schema, request } => {
            commands::prompt::run(config, &schema, request.as_deref())
        }
        Commands::Doctor => commands::doctor::run(config).await,
    }
}
