//! CLI command definitions for the Regflow Validation Agent
//!
//! Provides Clap-based command definitions for validating intake records,
//! evidence statements and handoff packets, working with the audit ledger,
//! and serving the HTTP API.

use clap::{Args, Parser, Subcommand};
use regflow_audit::{AppendRequest, AuditLedger};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::output::{self, OutputFormat};
use super::ExitCode;
use crate::config::AgentConfig;
use crate::contracts::{
    HandoffPacket, IntakeRecord, StatementValidationRequest, ValidationDecision,
};
use crate::engine::{IntakeValidationEngine, PacketValidationEngine, StatementValidationEngine};
use crate::error::ValidationError;
use crate::handler::{create_router, AppState};

/// Regflow Validation Agent CLI
///
/// Check regulatory intake records, evidence-backed statements and design
/// handoff packets, and keep a tamper-evident record of every decision.
#[derive(Parser, Debug)]
#[command(name = "regflow")]
#[command(about = "Regflow Validation Agent - Regulatory validation with an audit ledger", long_about = None)]
#[command(version)]
pub struct RegflowCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JSON-lines audit ledger
    ///
    /// Overrides the configured ledger path. Without either, the ledger is
    /// held in memory and discarded on exit.
    #[arg(long, env = "REGFLOW_LEDGER_PATH", global = true)]
    pub ledger: Option<PathBuf>,

    #[command(subcommand)]
    pub command: RegflowCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum RegflowCommands {
    /// Run one of the validation engines against a file
    Validate {
        #[command(subcommand)]
        target: ValidateTarget,
    },

    /// Inspect or extend the audit ledger
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },
}

/// What to validate
#[derive(Subcommand, Debug)]
pub enum ValidateTarget {
    /// Validate a device intake record (GATE-01 to GATE-05)
    Intake(ValidateArgs),

    /// Validate statements against evidence objects
    ///
    /// The file holds `statements` and `evidence_objects`.
    Evidence(ValidateArgs),

    /// Check a design handoff packet for acceptance
    Packet(ValidateArgs),
}

/// Arguments shared by the validate subcommands
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the JSON or YAML input file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output format for validation results
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Append the decision to the audit ledger
    #[arg(long, requires = "actor")]
    pub record: bool,

    /// Actor recorded with the decision
    #[arg(long)]
    pub actor: Option<String>,
}

/// Audit ledger actions
#[derive(Subcommand, Debug)]
pub enum AuditAction {
    /// List events in append order
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Append a single event
    Append {
        /// Event type
        #[arg(long = "type")]
        event_type: String,

        /// Actor responsible for the event
        #[arg(long)]
        actor: String,

        /// JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,

        /// Explicit event id (generated when omitted)
        #[arg(long)]
        event_id: Option<String>,
    },

    /// Recompute and check the hash chain
    Verify {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Resolve the agent configuration for a CLI invocation
///
/// File and environment first, then the `--ledger` flag on top.
pub fn load_config(cli: &RegflowCli) -> Result<AgentConfig, ValidationError> {
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.ledger {
        config.ledger.path = Some(path.clone());
    }
    Ok(config)
}

/// Execute a validate subcommand
pub async fn execute_validate(
    target: ValidateTarget,
    config: &AgentConfig,
) -> Result<ExitCode, ValidationError> {
    match target {
        ValidateTarget::Intake(args) => {
            let record: IntakeRecord = read_input(&args.file)?;
            let response = IntakeValidationEngine::new().validate(&record);
            let decision = ValidationDecision::for_intake(&record, &response)
                .map_err(ValidationError::render)?;

            if !output::render_structured(&response, args.format)? {
                output::print_issue_table(
                    "Intake Validation",
                    &decision.subject,
                    response.valid,
                    &response.issues,
                    &[],
                );
            }
            finish(decision, &args, config).await
        }
        ValidateTarget::Evidence(args) => {
            let request: StatementValidationRequest = read_input(&args.file)?;
            let results = StatementValidationEngine::new()
                .validate(&request.statements, &request.evidence_objects);
            let decision = ValidationDecision::for_statements(&request, &results)
                .map_err(ValidationError::render)?;

            if !output::render_structured(&results, args.format)? {
                output::print_statement_table(&results);
            }
            finish(decision, &args, config).await
        }
        ValidateTarget::Packet(args) => {
            let packet: HandoffPacket = read_input(&args.file)?;
            let response = PacketValidationEngine::new().validate(&packet);
            let decision = ValidationDecision::for_packet(&packet, &response)
                .map_err(ValidationError::render)?;

            if !output::render_structured(&response, args.format)? {
                output::print_issue_table(
                    "Handoff Packet Acceptance",
                    &decision.subject,
                    response.acceptable,
                    &response.issues,
                    &response.superseded_approvals,
                );
            }
            finish(decision, &args, config).await
        }
    }
}

/// Record the decision if asked, then map its outcome to an exit code
async fn finish(
    decision: ValidationDecision,
    args: &ValidateArgs,
    config: &AgentConfig,
) -> Result<ExitCode, ValidationError> {
    tracing::info!(decision = %decision.summary(), "Validation complete");
    let exit = ExitCode::from_outcome(decision.outcome);

    if args.record {
        let actor = args
            .actor
            .as_deref()
            .ok_or_else(|| ValidationError::invalid_input("--record requires --actor"))?;
        let ledger = AuditLedger::open_configured(config.ledger.clone()).await?;
        let event = ledger.append(decision.into_append_request(actor)).await?;
        if args.format == OutputFormat::Table {
            output::print_appended(&event);
        }
    }

    Ok(exit)
}

/// Execute an audit subcommand
pub async fn execute_audit(
    action: AuditAction,
    config: &AgentConfig,
) -> Result<ExitCode, ValidationError> {
    let ledger = AuditLedger::open_configured(config.ledger.clone()).await?;

    match action {
        AuditAction::List { format } => {
            let events = ledger.list().await?;
            if !output::render_structured(&events, format)? {
                output::print_event_table(&events);
            }
            Ok(ExitCode::Success)
        }
        AuditAction::Append {
            event_type,
            actor,
            payload,
            event_id,
        } => {
            let payload: serde_json::Value = serde_json::from_str(&payload)
                .map_err(|e| ValidationError::malformed("JSON", format!("--payload: {}", e)))?;
            let mut request = AppendRequest::new(event_type, actor, payload);
            if let Some(id) = event_id {
                request = request.with_event_id(id);
            }
            let event = ledger.append(request).await?;
            output::print_appended(&event);
            Ok(ExitCode::Success)
        }
        AuditAction::Verify { format } => {
            let report = ledger.verify().await?;
            if !output::render_structured(&report, format)? {
                output::print_verification(&report);
            }
            if report.intact {
                Ok(ExitCode::Success)
            } else {
                tracing::error!(
                    first_broken_index = ?report.first_broken_index,
                    "Audit chain verification failed"
                );
                Ok(ExitCode::IntegrityFailure)
            }
        }
    }
}

/// Start the HTTP server and run until shutdown
pub async fn execute_serve(
    mut config: AgentConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<ExitCode, ValidationError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let ledger = Arc::new(AuditLedger::open_configured(config.ledger.clone()).await?);
    let state = AppState::new(ledger).map_err(ValidationError::server)?;
    let app = create_router(Arc::new(state));

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ValidationError::server(format!("failed to bind {}: {}", addr, e)))?;
    tracing::info!(
        addr = %addr,
        agent_id = crate::AGENT_ID,
        agent_version = crate::AGENT_VERSION,
        "Regflow validation agent listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(ValidationError::server)?;
    Ok(ExitCode::Success)
}

/// Read and parse an input file based on its extension
fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T, ValidationError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ValidationError::unreadable(path, e))?;
    parse_input(path, &content)
}

fn parse_input<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, ValidationError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(content)
            .map_err(|e| ValidationError::malformed("JSON", e)),
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| ValidationError::malformed("YAML", e)),
        _ => Err(ValidationError::invalid_input(format!(
            "Unsupported file format: {}. Supported formats: json, yaml, yml",
            extension
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        RegflowCli::command().debug_assert();
    }

    #[test]
    fn test_parse_validate_intake() {
        let cli = RegflowCli::try_parse_from([
            "regflow", "validate", "intake", "--file", "intake.json", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            RegflowCommands::Validate {
                target: ValidateTarget::Intake(args),
            } => {
                assert_eq!(args.file, PathBuf::from("intake.json"));
                assert_eq!(args.format, OutputFormat::Json);
                assert!(!args.record);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_record_requires_actor() {
        let result = RegflowCli::try_parse_from([
            "regflow", "validate", "packet", "--file", "packet.json", "--record",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_audit_append() {
        let cli = RegflowCli::try_parse_from([
            "regflow", "audit", "append", "--type", "note", "--actor", "qa", "--payload",
            r#"{"k":1}"#,
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            RegflowCommands::Audit {
                action: AuditAction::Append { .. }
            }
        ));
    }

    #[test]
    fn test_parse_input_json() {
        let record: IntakeRecord = parse_input(
            Path::new("intake.json"),
            r#"{"device_class": "II", "target_markets": ["US"]}"#,
        )
        .unwrap();
        assert_eq!(record.target_markets, vec!["US".to_string()]);
    }

    #[test]
    fn test_parse_input_yaml() {
        let packet: HandoffPacket = parse_input(
            Path::new("packet.yml"),
            "packet_id: PKT-1\nowner_agent: design\ntarget_agent: verification\n",
        )
        .unwrap();
        assert_eq!(packet.packet_id, "PKT-1");
    }

    #[test]
    fn test_parse_input_unsupported() {
        let result: Result<IntakeRecord, _> = parse_input(Path::new("intake.toml"), "x = 1");
        assert!(matches!(result, Err(ValidationError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_input_malformed() {
        let result: Result<IntakeRecord, _> = parse_input(Path::new("intake.json"), "{");
        assert!(matches!(result, Err(ValidationError::Malformed { .. })));
    }

    #[test]
    fn test_read_input_missing_file() {
        let result: Result<IntakeRecord, _> = read_input(Path::new("/nonexistent/intake.json"));
        assert!(matches!(result, Err(ValidationError::Unreadable { .. })));
    }
}
