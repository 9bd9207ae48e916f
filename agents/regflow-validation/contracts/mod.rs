//! Regflow Validation Agent Contract Definitions
//!
//! This module defines the typed records the validation engines consume and
//! the verdicts they return. Wire shapes mirror these types field-for-field.
//!
//! # Design Principles
//!
//! - **Read-only**: Engines never modify the records they inspect
//! - **Stateless**: Each validation is independent and deterministic
//! - **Findings, not faults**: Failing business data yields issues, never errors
//! - **Traceable**: Verdicts can be recorded via `ValidationDecision`

pub mod decision_event;
pub mod evidence;
pub mod intake;
pub mod packet;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use decision_event::{compute_inputs_hash, DecisionOutcome, DecisionType, ValidationDecision};
pub use evidence::{
    EvidenceObject, JurisdictionMismatchDetail, StatementCandidate, StatementStatus,
    StatementValidationRequest, StatementValidationResult,
};
pub use intake::{
    ClinicalStrategy, DeviceClass, IntakeRecord, IntakeValidationResponse, IntendedUse,
    ManufacturingContext, RiskClassEntry, SoftwareHardwareScope, Technology, TechnologyValue,
    INTENDED_USE_REQUIRED_KEYS, TECHNOLOGY_REQUIRED_KEYS,
};
pub use packet::{
    AcceptanceCriterion, ApprovalDecision, ApprovalLogEntry, HandoffPacket,
    PacketValidationResponse, RequirementLink, RiskControlLink, RiskSeverity, SupersededApproval,
};

/// A single validation finding
///
/// Created by an engine and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Stable issue code (e.g. "GATE-01-INTENDED-USE")
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Whether this finding forces the verdict to fail
    #[serde(default = "default_blocking")]
    pub blocking: bool,
}

fn default_blocking() -> bool {
    true
}

impl ValidationIssue {
    /// Create a blocking issue
    pub fn blocking(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            blocking: true,
        }
    }

    /// Create a non-blocking advisory issue
    pub fn advisory(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            blocking: false,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.blocking { "blocking" } else { "advisory" };
        write!(f, "[{}] {}: {}", kind, self.code, self.message)
    }
}

/// True when no issue in the list is blocking
pub fn no_blocking_issues(issues: &[ValidationIssue]) -> bool {
    !issues.iter().any(|issue| issue.blocking)
}

/// Ordinal strength of evidentiary support
///
/// Declaration order defines the ranking: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a string is missing in substance
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_ordering() {
        assert!(ConfidenceLevel::High > ConfidenceLevel::Medium);
        assert!(ConfidenceLevel::Medium > ConfidenceLevel::Low);
        assert_eq!(
            [ConfidenceLevel::High, ConfidenceLevel::Low, ConfidenceLevel::Medium]
                .into_iter()
                .min(),
            Some(ConfidenceLevel::Low)
        );
    }

    #[test]
    fn test_confidence_serialization() {
        assert_eq!(serde_json::to_string(&ConfidenceLevel::High).unwrap(), "\"high\"");
        let parsed: ConfidenceLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_issue_constructors() {
        let issue = ValidationIssue::blocking("CODE", "message");
        assert!(issue.blocking);
        assert_eq!(issue.to_string(), "[blocking] CODE: message");

        let issue = ValidationIssue::advisory("CODE", "message");
        assert!(!issue.blocking);
    }

    #[test]
    fn test_issue_blocking_defaults_true_on_wire() {
        let issue: ValidationIssue =
            serde_json::from_str(r#"{"code": "X", "message": "m"}"#).unwrap();
        assert!(issue.blocking);
    }

    #[test]
    fn test_no_blocking_issues() {
        assert!(no_blocking_issues(&[]));
        assert!(no_blocking_issues(&[ValidationIssue::advisory("A", "a")]));
        assert!(!no_blocking_issues(&[
            ValidationIssue::advisory("A", "a"),
            ValidationIssue::blocking("B", "b"),
        ]));
    }
}
