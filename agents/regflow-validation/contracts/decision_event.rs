//! Validation decisions as audit ledger events
//!
//! Engines never append to the ledger. A caller that wants a verdict on the
//! record builds a [`ValidationDecision`] from the engine output and turns it
//! into an [`AppendRequest`]. The ledger owns the event id, timestamp default
//! and chain linkage.
//!
//! Payload layout:
//!
//! ```json
//! { "subject": "...", "outcome": "passed", "inputs_hash": "<sha256>", "verdict": { ... } }
//! ```

use regflow_audit::{canonical_json, AppendRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{
    HandoffPacket, IntakeRecord, IntakeValidationResponse, PacketValidationResponse,
    StatementStatus, StatementValidationRequest, StatementValidationResult, ValidationIssue,
};

/// Types of decisions the validation agent records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    /// Result of validating a device intake record
    IntakeValidated,

    /// Result of validating evidence-backed statements
    EvidenceStatementsValidated,

    /// Result of checking a handoff packet for acceptance
    PacketValidated,
}

impl DecisionType {
    /// Get the string representation (used as the ledger event type)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntakeValidated => "intake_validated",
            Self::EvidenceStatementsValidated => "evidence_statements_validated",
            Self::PacketValidated => "packet_validated",
        }
    }
}

/// Coarse outcome of a validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Passed,
    PassedWithAdvisories,
    Failed,
}

impl DecisionOutcome {
    /// Derive the outcome from an issue list
    pub fn from_issues(issues: &[ValidationIssue]) -> Self {
        if issues.iter().any(|issue| issue.blocking) {
            Self::Failed
        } else if issues.is_empty() {
            Self::Passed
        } else {
            Self::PassedWithAdvisories
        }
    }

    /// Derive the outcome from statement results
    ///
    /// Missing evidence fails the run; low confidence or a jurisdiction gap
    /// is reported as an advisory.
    pub fn from_statements(results: &[StatementValidationResult]) -> Self {
        if results
            .iter()
            .any(|r| r.status == StatementStatus::MissingEvidence)
        {
            Self::Failed
        } else if results.iter().any(|r| {
            r.status == StatementStatus::LowConfidence || r.jurisdiction_mismatch.is_some()
        }) {
            Self::PassedWithAdvisories
        } else {
            Self::Passed
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::PassedWithAdvisories => "passed_with_advisories",
            Self::Failed => "failed",
        }
    }
}

/// A validation verdict ready to be recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDecision {
    /// Type of decision made
    pub decision_type: DecisionType,

    /// What was validated (packet id, market scope, statement count)
    pub subject: String,

    /// Coarse outcome
    pub outcome: DecisionOutcome,

    /// SHA-256 of the canonical JSON of the validated input
    pub inputs_hash: String,

    /// Full engine output
    pub verdict: Value,
}

impl ValidationDecision {
    /// Decision for an intake validation
    pub fn for_intake(
        record: &IntakeRecord,
        response: &IntakeValidationResponse,
    ) -> serde_json::Result<Self> {
        let subject = format!(
            "intake:class-{}:{}",
            record.device_class.as_str(),
            if record.primary_launch_market.trim().is_empty() {
                "unscoped"
            } else {
                record.primary_launch_market.trim()
            }
        );
        Ok(Self {
            decision_type: DecisionType::IntakeValidated,
            subject,
            outcome: DecisionOutcome::from_issues(&response.issues),
            inputs_hash: compute_inputs_hash(record)?,
            verdict: serde_json::to_value(response)?,
        })
    }

    /// Decision for a statement validation
    pub fn for_statements(
        request: &StatementValidationRequest,
        results: &[StatementValidationResult],
    ) -> serde_json::Result<Self> {
        Ok(Self {
            decision_type: DecisionType::EvidenceStatementsValidated,
            subject: format!("statements:{}", request.statements.len()),
            outcome: DecisionOutcome::from_statements(results),
            inputs_hash: compute_inputs_hash(request)?,
            verdict: serde_json::to_value(results)?,
        })
    }

    /// Decision for a packet acceptance check
    pub fn for_packet(
        packet: &HandoffPacket,
        response: &PacketValidationResponse,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            decision_type: DecisionType::PacketValidated,
            subject: packet.packet_id.clone(),
            outcome: DecisionOutcome::from_issues(&response.issues),
            inputs_hash: compute_inputs_hash(packet)?,
            verdict: serde_json::to_value(response)?,
        })
    }

    /// Ledger payload for this decision
    pub fn payload(&self) -> Value {
        let mut payload = serde_json::Map::new();
        payload.insert("subject".into(), Value::String(self.subject.clone()));
        payload.insert("outcome".into(), Value::String(self.outcome.as_str().into()));
        payload.insert("inputs_hash".into(), Value::String(self.inputs_hash.clone()));
        payload.insert("verdict".into(), self.verdict.clone());
        Value::Object(payload)
    }

    /// Build the ledger append request on behalf of `actor`
    pub fn into_append_request(self, actor: impl Into<String>) -> AppendRequest {
        let payload = self.payload();
        AppendRequest::new(self.decision_type.as_str(), actor, payload)
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        format!(
            "{} {} - outcome={}, inputs_hash={}",
            self.decision_type.as_str(),
            self.subject,
            self.outcome.as_str(),
            self.inputs_hash.chars().take(12).collect::<String>(),
        )
    }
}

/// Compute deterministic hash of an engine input
///
/// Hashes the key-sorted JSON form so equivalent inputs hash identically.
pub fn compute_inputs_hash<T: Serialize>(input: &T) -> serde_json::Result<String> {
    let value = serde_json::to_value(input)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&value).as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ConfidenceLevel, StatementCandidate};

    fn packet() -> HandoffPacket {
        serde_json::from_value(serde_json::json!({
            "packet_id": "PKT-7",
            "owner_agent": "design",
            "target_agent": "verification",
            "blocker_defects_open": 2
        }))
        .unwrap()
    }

    #[test]
    fn test_decision_type_strings() {
        assert_eq!(DecisionType::IntakeValidated.as_str(), "intake_validated");
        assert_eq!(
            serde_json::to_string(&DecisionType::EvidenceStatementsValidated).unwrap(),
            "\"evidence_statements_validated\""
        );
    }

    #[test]
    fn test_outcome_from_issues() {
        assert_eq!(DecisionOutcome::from_issues(&[]), DecisionOutcome::Passed);
        assert_eq!(
            DecisionOutcome::from_issues(&[ValidationIssue::advisory("A", "a")]),
            DecisionOutcome::PassedWithAdvisories
        );
        assert_eq!(
            DecisionOutcome::from_issues(&[
                ValidationIssue::advisory("A", "a"),
                ValidationIssue::blocking("B", "b"),
            ]),
            DecisionOutcome::Failed
        );
    }

    #[test]
    fn test_outcome_from_statements() {
        let result = |status, confidence| StatementValidationResult {
            statement: "s".into(),
            status,
            confidence,
            reason: None,
            unresolved_evidence_ids: vec![],
            jurisdiction_mismatch: None,
        };
        assert_eq!(
            DecisionOutcome::from_statements(&[result(
                StatementStatus::Validated,
                Some(ConfidenceLevel::High)
            )]),
            DecisionOutcome::Passed
        );
        assert_eq!(
            DecisionOutcome::from_statements(&[
                result(StatementStatus::LowConfidence, Some(ConfidenceLevel::Low)),
                result(StatementStatus::MissingEvidence, None),
            ]),
            DecisionOutcome::Failed
        );
    }

    #[test]
    fn test_inputs_hash_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": {"b": 2, "a": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": {"a": 3, "b": 2}, "x": 1}"#).unwrap();
        assert_eq!(compute_inputs_hash(&a).unwrap(), compute_inputs_hash(&b).unwrap());
        assert_eq!(compute_inputs_hash(&a).unwrap().len(), 64);
    }

    #[test]
    fn test_packet_decision_payload() {
        let packet = packet();
        let response = PacketValidationResponse {
            acceptable: false,
            issues: vec![ValidationIssue::blocking("PACKET-BLOCKER-DEFECTS", "m")],
            superseded_approvals: vec![],
        };
        let decision = ValidationDecision::for_packet(&packet, &response).unwrap();
        assert_eq!(decision.subject, "PKT-7");
        assert_eq!(decision.outcome, DecisionOutcome::Failed);

        let request = decision.into_append_request("ra-lead");
        assert_eq!(request.event_type, "packet_validated");
        assert_eq!(request.actor, "ra-lead");
        assert_eq!(request.payload["outcome"], "failed");
        assert_eq!(request.payload["verdict"]["acceptable"], false);
        assert!(request.event_id.is_none());
        assert!(!request.carries_client_linkage());
    }

    #[test]
    fn test_statement_decision_subject() {
        let request = StatementValidationRequest {
            statements: vec![
                StatementCandidate::new("a", ["EV-1"]),
                StatementCandidate::new("b", Vec::<String>::new()),
            ],
            evidence_objects: vec![],
        };
        let decision = ValidationDecision::for_statements(&request, &[]).unwrap();
        assert_eq!(decision.subject, "statements:2");
        assert!(decision.summary().starts_with("evidence_statements_validated statements:2"));
    }
}
