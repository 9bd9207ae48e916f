//! Regflow Validation Agent CLI
//!
//! # Usage
//!
//! ```bash
//! # Validate an intake record
//! regflow validate intake --file intake.yaml
//!
//! # Validate statements and record the decision
//! regflow --ledger audit.jsonl validate evidence --file statements.json --record --actor qa-lead
//!
//! # Verify the audit chain
//! regflow --ledger audit.jsonl audit verify
//!
//! # Start the HTTP server
//! regflow serve --host 127.0.0.1 --port 8080
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success - validation passed
//! - 1: Validation failed with blocking issues
//! - 2: Validation passed with advisories
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 6: Audit chain integrity failure
//! - 10: Internal error

use clap::Parser;
use regflow_validation::cli::commands::load_config;
use regflow_validation::{init_tracing, run_cli, RegflowCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = RegflowCli::parse();

    // Config errors surface again from run_cli with the right exit code
    let mut logging = load_config(&cli)
        .map(|config| config.logging)
        .unwrap_or_default();
    if cli.quiet {
        logging.level = "error".to_string();
    } else {
        match cli.verbose {
            0 => {}
            1 => logging.level = "debug".to_string(),
            _ => logging.level = "trace".to_string(),
        }
    }
    init_tracing(&logging)?;

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
