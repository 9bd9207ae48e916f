//! Device intake record contracts
//!
//! Mapping-shaped sections (`intended_use`, `technology`) are fixed records
//! with optional named fields plus a residual map for forward-compatible keys.
//! Required-key checks go through the static key lists below, never through
//! free-form map lookups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{is_blank, ConfidenceLevel, ValidationIssue};

/// Intended-use keys that must be present and non-blank
pub const INTENDED_USE_REQUIRED_KEYS: [&str; 6] = [
    "clinical_condition",
    "target_population",
    "intended_user",
    "use_environment",
    "primary_output_and_decision_impact",
    "exclusions_or_contraindications",
];

/// Technology keys expected to describe the product boundary
pub const TECHNOLOGY_REQUIRED_KEYS: [&str; 4] = [
    "product_modality",
    "primary_technical_mechanism",
    "data_inputs_and_dependencies",
    "ai_ml_behavior",
];

/// Device classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    I,
    II,
    III,
    Unclassified,
}

impl DeviceClass {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::Unclassified => "Unclassified",
        }
    }
}

/// Intended use statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntendedUse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_population: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intended_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_output_and_decision_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusions_or_contraindications: Option<String>,

    /// Additional keys not (yet) modelled
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl IntendedUse {
    /// Look up one of the named fields
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "clinical_condition" => &self.clinical_condition,
            "target_population" => &self.target_population,
            "intended_user" => &self.intended_user,
            "use_environment" => &self.use_environment,
            "primary_output_and_decision_impact" => &self.primary_output_and_decision_impact,
            "exclusions_or_contraindications" => &self.exclusions_or_contraindications,
            _ => return self.extra.get(key).map(String::as_str),
        };
        value.as_deref()
    }

    /// Required keys that are absent or blank, in declaration order
    pub fn missing_required_keys(&self) -> Vec<&'static str> {
        INTENDED_USE_REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| self.field(key).map_or(true, is_blank))
            .collect()
    }
}

/// A technology attribute: free text or a list of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TechnologyValue {
    Text(String),
    List(Vec<String>),
}

impl TechnologyValue {
    /// Whether the value carries no content
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => is_blank(text),
            Self::List(items) => items.iter().all(|item| is_blank(item)),
        }
    }

    /// Flatten into a single lowercase string for keyword checks
    pub fn to_lowercase_text(&self) -> String {
        match self {
            Self::Text(text) => text.to_lowercase(),
            Self::List(items) => items.join(" ").to_lowercase(),
        }
    }
}

/// Technology boundary description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_modality: Option<TechnologyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_technical_mechanism: Option<TechnologyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_inputs_and_dependencies: Option<TechnologyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_ml_behavior: Option<TechnologyValue>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, TechnologyValue>,
}

impl Technology {
    /// Look up one of the named fields
    pub fn field(&self, key: &str) -> Option<&TechnologyValue> {
        match key {
            "product_modality" => self.product_modality.as_ref(),
            "primary_technical_mechanism" => self.primary_technical_mechanism.as_ref(),
            "data_inputs_and_dependencies" => self.data_inputs_and_dependencies.as_ref(),
            "ai_ml_behavior" => self.ai_ml_behavior.as_ref(),
            _ => self.extra.get(key),
        }
    }

    /// Expected keys that are absent or blank, in declaration order
    pub fn missing_required_keys(&self) -> Vec<&'static str> {
        TECHNOLOGY_REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| self.field(key).map_or(true, TechnologyValue::is_blank))
            .collect()
    }
}

/// Software and hardware scope of the device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftwareHardwareScope {
    #[serde(default)]
    pub software_components: Vec<String>,
    #[serde(default)]
    pub hardware_components: Vec<String>,
    #[serde(default)]
    pub external_interfaces: Vec<String>,
    #[serde(default)]
    pub cybersecurity_trust_boundaries: Vec<String>,
}

/// Proposed risk classification for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskClassEntry {
    pub market: String,
    #[serde(default)]
    pub proposed_classification: String,
    #[serde(default)]
    pub rationale: String,
    pub confidence: ConfidenceLevel,
    #[serde(default)]
    pub open_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_plan: Option<String>,
}

impl RiskClassEntry {
    /// Whether a non-blank mitigation plan is present
    pub fn has_mitigation_plan(&self) -> bool {
        self.mitigation_plan.as_deref().map_or(false, |plan| !is_blank(plan))
    }
}

/// Clinical evidence strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalStrategy {
    #[serde(default)]
    pub evidence_sources: Vec<String>,
    #[serde(default)]
    pub study_design_assumptions: Vec<String>,
    #[serde(default)]
    pub primary_endpoints: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub gaps_and_mitigation_plan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_monitoring_plan: Option<String>,
}

/// Manufacturing and quality-system context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingContext {
    #[serde(default)]
    pub organization_model: String,
    #[serde(default)]
    pub qms_status: String,
    #[serde(default)]
    pub critical_suppliers: Vec<String>,
    #[serde(default)]
    pub process_controls: Vec<String>,
    #[serde(default)]
    pub post_market_change_control_owner: String,
}

/// Device intake record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub device_class: DeviceClass,
    #[serde(default)]
    pub intended_use: IntendedUse,
    #[serde(default)]
    pub technology: Technology,
    #[serde(default)]
    pub software_hardware_scope: SoftwareHardwareScope,
    #[serde(default)]
    pub target_markets: Vec<String>,
    #[serde(default)]
    pub primary_launch_market: String,
    #[serde(default)]
    pub risk_class: Vec<RiskClassEntry>,
    #[serde(default)]
    pub clinical_strategy: ClinicalStrategy,
    #[serde(default)]
    pub manufacturing_context: ManufacturingContext,
}

impl IntakeRecord {
    /// Non-blank target markets, trimmed
    pub fn target_market_names(&self) -> impl Iterator<Item = &str> {
        self.target_markets
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
    }
}

/// Intake validation verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeValidationResponse {
    /// True iff no blocking issue exists
    pub valid: bool,
    /// Issues in check-declaration order
    pub issues: Vec<ValidationIssue>,
}

impl IntakeValidationResponse {
    /// Build a verdict from an issue list
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: super::no_blocking_issues(&issues),
            issues,
        }
    }
}
