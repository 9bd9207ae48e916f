//! Errors raised by the agent around the engines
//!
//! A failing intake record, statement or packet is not an error; it comes
//! back as an issue list. What lands here is everything that stops a verdict
//! from being produced or recorded: an unreadable or malformed input file, a
//! bad setting, an HTTP server that cannot start, or a ledger fault.

use std::fmt;
use std::path::{Path, PathBuf};

use regflow_audit::LedgerError;
use thiserror::Error;

/// Agent error
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Arguments that do not describe a runnable command
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input or configuration file that could not be read
    #[error("Cannot read '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record that does not match the contract shape
    #[error("Malformed {format} input: {reason}")]
    Malformed { format: &'static str, reason: String },

    /// A verdict could not be rendered or hashed
    #[error("Cannot render verdict: {0}")]
    Render(String),

    /// Audit ledger refused or failed an operation
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Bad configuration file or `REGFLOW_*` value
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP surface failed to start or stopped abnormally
    #[error("Server error: {0}")]
    Server(String),
}

impl ValidationError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ValidationError::InvalidInput(msg.into())
    }

    pub fn unreadable(path: &Path, source: std::io::Error) -> Self {
        ValidationError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }

    /// `format` names the wire format (`JSON`, `YAML`)
    pub fn malformed(format: &'static str, reason: impl fmt::Display) -> Self {
        ValidationError::Malformed {
            format,
            reason: reason.to_string(),
        }
    }

    pub fn render(reason: impl fmt::Display) -> Self {
        ValidationError::Render(reason.to_string())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ValidationError::Config(msg.into())
    }

    pub fn server(reason: impl fmt::Display) -> Self {
        ValidationError::Server(reason.to_string())
    }

    /// The caller can fix this by changing arguments, files or settings
    pub fn is_user_error(&self) -> bool {
        match self {
            ValidationError::InvalidInput(_)
            | ValidationError::Unreadable { .. }
            | ValidationError::Malformed { .. }
            | ValidationError::Config(_) => true,
            ValidationError::Ledger(err) => err.is_caller_error(),
            ValidationError::Render(_) | ValidationError::Server(_) => false,
        }
    }

    /// An input or config file could not be read at all
    pub fn is_unreadable(&self) -> bool {
        matches!(self, ValidationError::Unreadable { .. })
    }

    /// The audit chain is broken; never retry
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, ValidationError::Ledger(err) if err.is_integrity_violation())
    }
}

impl From<toml::de::Error> for ValidationError {
    fn from(err: toml::de::Error) -> Self {
        ValidationError::Config(format!("TOML error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_names_the_file() {
        let err = ValidationError::unreadable(
            Path::new("intake.yaml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.to_string(), "Cannot read 'intake.yaml': no such file");
        assert!(err.is_unreadable());
        assert!(err.is_user_error());
    }

    #[test]
    fn test_malformed_record() {
        let err = ValidationError::malformed("YAML", "missing field `device_class`");
        assert_eq!(
            err.to_string(),
            "Malformed YAML input: missing field `device_class`"
        );
        assert!(err.is_user_error());
        assert!(!err.is_unreadable());
    }

    #[test]
    fn test_ledger_faults_split_by_cause() {
        assert!(ValidationError::from(LedgerError::DuplicateEventId("evt-1".into())).is_user_error());
        assert!(!ValidationError::from(LedgerError::storage("disk full")).is_user_error());

        let broken = ValidationError::from(LedgerError::ChainBroken {
            index: 3,
            reason: "hash mismatch".into(),
        });
        assert!(broken.is_integrity_violation());
        assert!(!broken.is_user_error());
        assert!(!ValidationError::invalid_input("x").is_integrity_violation());
    }

    #[test]
    fn test_server_and_render_are_internal() {
        assert!(!ValidationError::server("address in use").is_user_error());
        assert!(!ValidationError::render("non-string map key").is_user_error());
    }
}
