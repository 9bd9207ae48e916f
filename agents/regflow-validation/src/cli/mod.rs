//! CLI module for the Regflow Validation Agent
//!
//! Validates intake records, evidence statements and handoff packets from
//! files, inspects and extends the audit ledger, and starts the HTTP server.

pub mod commands;
pub mod output;

pub use commands::{AuditAction, RegflowCli, RegflowCommands, ValidateArgs, ValidateTarget};
pub use output::OutputFormat;

use crate::contracts::DecisionOutcome;
use crate::error::ValidationError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution, all validations passed
    Success = 0,
    /// Validation produced blocking issues
    ValidationError = 1,
    /// Validation passed with advisories
    ValidationWarning = 2,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Audit chain failed verification
    IntegrityFailure = 6,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Determine exit code from a decision outcome
    pub fn from_outcome(outcome: DecisionOutcome) -> Self {
        match outcome {
            DecisionOutcome::Passed => ExitCode::Success,
            DecisionOutcome::PassedWithAdvisories => ExitCode::ValidationWarning,
            DecisionOutcome::Failed => ExitCode::ValidationError,
        }
    }

    /// Determine exit code for an error that aborted a command
    pub fn from_error(err: &ValidationError) -> Self {
        if err.is_integrity_violation() {
            ExitCode::IntegrityFailure
        } else if err.is_unreadable() {
            ExitCode::FileError
        } else if err.is_user_error() {
            ExitCode::InvalidInput
        } else {
            ExitCode::InternalError
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: RegflowCli) -> Result<ExitCode, ValidationError> {
    let config = commands::load_config(&cli)?;
    match cli.command {
        RegflowCommands::Validate { target } => commands::execute_validate(target, &config).await,
        RegflowCommands::Audit { action } => commands::execute_audit(action, &config).await,
        RegflowCommands::Serve { host, port } => {
            commands::execute_serve(config, host, port).await
        }
    }
}
