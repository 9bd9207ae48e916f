//! Cross-team handoff packet contracts
//!
//! Severity and approval decisions are accepted case-insensitively on the
//! wire and always emitted in lowercase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationIssue;

/// Severity of a risk addressed by a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskSeverity {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// High and critical risks need a verified control before handoff
    pub fn requires_verified_control(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl FromStr for RiskSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!(
                "unknown severity '{}', expected one of: low, medium, high, critical",
                other
            )),
        }
    }
}

impl TryFrom<String> for RiskSeverity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RiskSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision recorded by a signer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
    Deferred,
}

impl ApprovalDecision {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Deferred => "deferred",
        }
    }
}

impl FromStr for ApprovalDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "deferred" => Ok(Self::Deferred),
            other => Err(format!(
                "unknown approval decision '{}', expected one of: approved, rejected, deferred",
                other
            )),
        }
    }
}

impl TryFrom<String> for ApprovalDecision {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requirement carried by a packet, pinned to a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementLink {
    pub id: String,
    pub version: String,
}

/// Link between a risk and the control that mitigates it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskControlLink {
    pub risk_id: String,
    pub control_id: String,
    pub verified: bool,
    pub severity: RiskSeverity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub id: String,
    pub statement: String,
    pub verification_method: String,
    pub evidence_ref: String,
}

/// One entry of the approval log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLogEntry {
    pub signer_role: String,
    pub decision: ApprovalDecision,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Bundle transferred between workflow stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffPacket {
    pub packet_id: String,
    #[serde(default)]
    pub title: String,
    pub owner_agent: String,
    pub target_agent: String,
    #[serde(default)]
    pub source_requirements: Vec<RequirementLink>,
    #[serde(default)]
    pub risk_controls: Vec<RiskControlLink>,
    #[serde(default)]
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    #[serde(default)]
    pub evidence_index: Vec<String>,
    #[serde(default)]
    pub required_approvers: Vec<String>,
    #[serde(default)]
    pub approval_log: Vec<ApprovalLogEntry>,
    #[serde(default)]
    pub blocker_defects_open: u32,
    #[serde(default)]
    pub approved_exception: bool,
}

/// An approval log entry overridden by a later, different decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersededApproval {
    pub signer_role: String,
    /// Decision that no longer counts
    pub superseded_decision: ApprovalDecision,
    pub superseded_at: DateTime<Utc>,
    /// Decision that counts for the role
    pub effective_decision: ApprovalDecision,
    pub effective_at: DateTime<Utc>,
}

/// Packet acceptance verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketValidationResponse {
    /// True iff no blocking issue exists
    pub acceptable: bool,
    pub issues: Vec<ValidationIssue>,
    #[serde(default)]
    pub superseded_approvals: Vec<SupersededApproval>,
}
