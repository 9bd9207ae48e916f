//! Regflow Validation Agent
//!
//! Deterministic validation for medical-device regulatory workflows, with
//! every recorded decision kept in a hash-chained audit ledger.
//!
//! ## Features
//!
//! - **Intake validation**: gate checks GATE-01 to GATE-05 over a device
//!   intake record, plus advisory consistency checks
//! - **Evidence statements**: each regulatory statement must resolve to
//!   evidence objects; confidence is the weakest link
//! - **Handoff packets**: acceptance rules for design handoff packets,
//!   including effective approvals per signer role
//! - **Audit ledger**: decisions become tamper-evident events via
//!   `regflow-audit`
//! - **Telemetry**: Prometheus metrics and structured tracing
//!
//! ## Architecture
//!
//! 1. **Contracts** (`contracts/`): input and output types shared by the
//!    CLI, the HTTP surface and the ledger payloads.
//!
//! 2. **Engine** (`engine/`): rule-based validators. Pure functions of their
//!    input; they never touch the ledger.
//!
//! 3. **Handler** (`handler/`): axum router over the engines and the ledger.
//!
//! 4. **CLI** (`cli/`): file-based validation, ledger inspection and `serve`.
//!
//! 5. **Telemetry** (`telemetry/`): metrics registry and tracing setup.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Validate an intake record and record the decision
//! regflow --ledger audit.jsonl validate intake --file intake.yaml --record --actor qa-lead
//!
//! # Check a handoff packet
//! regflow validate packet --file packet.json --format json
//!
//! # Verify the ledger chain
//! regflow --ledger audit.jsonl audit verify
//!
//! # Serve the HTTP API
//! regflow serve --port 8080
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use regflow_validation::contracts::{IntakeRecord, ValidationDecision};
//! use regflow_validation::engine::IntakeValidationEngine;
//! use regflow_audit::AuditLedger;
//!
//! # async fn example(record: IntakeRecord) -> Result<(), Box<dyn std::error::Error>> {
//! let response = IntakeValidationEngine::new().validate(&record);
//! let decision = ValidationDecision::for_intake(&record, &response)?;
//!
//! let ledger = AuditLedger::in_memory().await?;
//! ledger.append(decision.into_append_request("qa-lead")).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod telemetry;

// Contracts module - located at ../contracts relative to src/
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use config::{AgentConfig, LoggingConfig, ServerConfig};
pub use error::{Result, ValidationError};

pub use engine::{
    effective_approvals, superseded_approvals, IntakeValidationEngine, PacketValidationEngine,
    Rule, StatementValidationEngine,
};

pub use handler::{create_router, ApiError, AppState, HealthResponse};

pub use telemetry::{init_tracing, TelemetryError, ValidationMetrics, ValidationMetricsRegistry};

pub use contracts::{
    ConfidenceLevel, DecisionOutcome, DecisionType, DeviceClass, EvidenceObject, HandoffPacket,
    IntakeRecord, IntakeValidationResponse, PacketValidationResponse, StatementCandidate,
    StatementStatus, StatementValidationRequest, StatementValidationResult, ValidationDecision,
    ValidationIssue,
};

pub use cli::{ExitCode, OutputFormat, RegflowCli, RegflowCommands};

/// Agent version (from Cargo.toml)
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Agent identifier
pub const AGENT_ID: &str = "regflow-validation-agent";

/// Run the CLI application
///
/// This is the main entry point for the CLI binary.
///
/// # Example
///
/// ```rust,no_run
/// use clap::Parser;
/// use regflow_validation::{run_cli, RegflowCli};
///
/// #[tokio::main]
/// async fn main() {
///     let cli = RegflowCli::parse();
///     let exit_code = run_cli(cli).await;
///     std::process::exit(exit_code.into());
/// }
/// ```
pub async fn run_cli(cli: RegflowCli) -> ExitCode {
    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}
