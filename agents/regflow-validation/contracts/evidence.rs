//! Evidence object and statement contracts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ConfidenceLevel;

/// A versioned piece of evidence referenced by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceObject {
    pub id: String,
    pub source: String,
    pub version: String,
    pub owner: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub jurisdiction_relevance: Vec<String>,
    pub confidence: ConfidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A claim to be checked against supplied evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementCandidate {
    pub statement: String,
    #[serde(default)]
    pub evidence_ids: Vec<String>,
    /// Jurisdictions the claim is meant to hold in
    #[serde(default)]
    pub target_jurisdictions: Vec<String>,
}

impl StatementCandidate {
    /// Create a statement with the given evidence links
    pub fn new<I, S>(statement: impl Into<String>, evidence_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statement: statement.into(),
            evidence_ids: evidence_ids.into_iter().map(Into::into).collect(),
            target_jurisdictions: Vec::new(),
        }
    }

    /// Require coverage of the given jurisdictions
    pub fn with_target_jurisdictions<I, S>(mut self, jurisdictions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_jurisdictions = jurisdictions.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of a single statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementStatus {
    Validated,
    LowConfidence,
    MissingEvidence,
}

impl StatementStatus {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validated => "validated",
            Self::LowConfidence => "low-confidence",
            Self::MissingEvidence => "missing-evidence",
        }
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Jurisdiction coverage gap for a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionMismatchDetail {
    pub required_jurisdictions: Vec<String>,
    pub covered_jurisdictions: Vec<String>,
    pub missing_jurisdictions: Vec<String>,
    /// Jurisdictions declared by each resolved evidence object
    pub evidence_jurisdictions: BTreeMap<String, Vec<String>>,
}

/// Per-statement verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementValidationResult {
    pub statement: String,
    pub status: StatementStatus,
    /// Weakest confidence among resolved evidence; `None` when nothing resolved
    pub confidence: Option<ConfidenceLevel>,
    pub reason: Option<String>,
    #[serde(default)]
    pub unresolved_evidence_ids: Vec<String>,
    #[serde(default)]
    pub jurisdiction_mismatch: Option<JurisdictionMismatchDetail>,
}

/// Wire request for statement validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementValidationRequest {
    pub statements: Vec<StatementCandidate>,
    #[serde(default)]
    pub evidence_objects: Vec<EvidenceObject>,
}
