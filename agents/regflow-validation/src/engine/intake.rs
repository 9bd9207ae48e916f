//! Intake validation rules
//!
//! Checks run in a fixed order and each produces a distinct issue code.
//! Structural gaps that make a record unfit for regulatory planning are
//! blocking; completeness hints about technology and clinical strategy are
//! advisory.

use std::collections::{BTreeMap, BTreeSet};

use super::{list, run_rules, Rule};
use crate::contracts::{
    is_blank, ConfidenceLevel, DeviceClass, IntakeRecord, IntakeValidationResponse,
    ValidationIssue,
};

pub const CODE_INTENDED_USE: &str = "GATE-01-INTENDED-USE";
pub const CODE_DEVICE_UNCLASSIFIED: &str = "GATE-01-DEVICE-UNCLASSIFIED";
pub const CODE_MARKET_SCOPE: &str = "GATE-02-MARKET-SCOPE";
pub const CODE_PRIMARY_MARKET: &str = "GATE-02-PRIMARY-MARKET";
pub const CODE_RISK_CLASS_DUPLICATE: &str = "GATE-03-RISK-CLASS-DUPLICATE";
pub const CODE_RISK_CLASS_MISSING: &str = "GATE-03-RISK-CLASS-MISSING-TARGET-MARKET";
pub const CODE_RISK_CLASS_EXTRANEOUS: &str = "GATE-03-RISK-CLASS-EXTRANEOUS-MARKET";
pub const CODE_LOW_CONFIDENCE_UNMITIGATED: &str = "RISK-LOW-CONFIDENCE-WITHOUT-MITIGATION";
pub const CODE_TECH_BOUNDARY: &str = "GATE-04-TECH-BOUNDARY";
pub const CODE_CLINICAL_STRATEGY: &str = "GATE-05-CLINICAL-STRATEGY";
pub const CODE_CLINICAL_GAPS: &str = "CLINICAL-GAPS-MITIGATION-BLANK";
pub const CODE_ADAPTIVE_ML: &str = "CONSISTENCY-ADAPTIVE-ML-MONITORING";

/// Intake validation engine
pub struct IntakeValidationEngine {
    rules: Vec<Box<dyn Rule<IntakeRecord>>>,
}

impl Default for IntakeValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeValidationEngine {
    /// Create new engine with the standard rule set
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(IntendedUseRule),
                Box::new(DeviceClassificationRule),
                Box::new(MarketScopeRule),
                Box::new(RiskClassCoverageRule),
                Box::new(RiskMitigationRule),
                Box::new(TechnologyBoundaryRule),
                Box::new(ClinicalStrategyRule),
                Box::new(AdaptiveMlMonitoringRule),
            ],
        }
    }

    /// Validate an intake record
    pub fn validate(&self, record: &IntakeRecord) -> IntakeValidationResponse {
        let response = IntakeValidationResponse::from_issues(run_rules(&self.rules, record));
        tracing::debug!(
            valid = response.valid,
            issues = response.issues.len(),
            "Intake validation complete"
        );
        response
    }

    /// Identifiers of the rules applied, in order
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

/// Trimmed, non-blank target markets as a set
fn target_set(record: &IntakeRecord) -> BTreeSet<&str> {
    record.target_market_names().collect()
}

/// Every required intended-use key is present and non-blank
pub struct IntendedUseRule;

impl Rule<IntakeRecord> for IntendedUseRule {
    fn id(&self) -> &str {
        "intended_use"
    }

    fn name(&self) -> &str {
        "Intended Use Completeness"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        let missing = record.intended_use.missing_required_keys();
        if missing.is_empty() {
            return Vec::new();
        }
        vec![ValidationIssue::blocking(
            CODE_INTENDED_USE,
            format!("Missing or blank intended_use sub-elements: {}", list(missing)),
        )]
    }
}

/// Classification must precede market targeting
pub struct DeviceClassificationRule;

impl Rule<IntakeRecord> for DeviceClassificationRule {
    fn id(&self) -> &str {
        "device_classification"
    }

    fn name(&self) -> &str {
        "Device Classification Before Market Targeting"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        if record.device_class == DeviceClass::Unclassified
            && record.target_market_names().next().is_some()
        {
            return vec![ValidationIssue::blocking(
                CODE_DEVICE_UNCLASSIFIED,
                "Device must be classified before target markets are selected.",
            )];
        }
        Vec::new()
    }
}

/// Target markets exist and contain the primary launch market
pub struct MarketScopeRule;

impl Rule<IntakeRecord> for MarketScopeRule {
    fn id(&self) -> &str {
        "market_scope"
    }

    fn name(&self) -> &str {
        "Market Scope"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        let targets = target_set(record);
        let primary = record.primary_launch_market.trim();

        if targets.is_empty() || primary.is_empty() {
            return vec![ValidationIssue::blocking(
                CODE_MARKET_SCOPE,
                "Target markets and primary launch market are required.",
            )];
        }

        if !targets.contains(primary) {
            return vec![ValidationIssue::blocking(
                CODE_PRIMARY_MARKET,
                format!(
                    "Primary launch market '{}' is not one of target markets {}",
                    primary,
                    list(&targets)
                ),
            )];
        }

        Vec::new()
    }
}

/// Exactly one risk-class entry per target market, and none outside them
pub struct RiskClassCoverageRule;

impl Rule<IntakeRecord> for RiskClassCoverageRule {
    fn id(&self) -> &str {
        "risk_class_coverage"
    }

    fn name(&self) -> &str {
        "Risk Class Market Coverage"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let targets = target_set(record);

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &record.risk_class {
            *counts.entry(entry.market.trim()).or_default() += 1;
        }

        let duplicates: Vec<&str> = counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(market, _)| *market)
            .collect();
        if !duplicates.is_empty() {
            issues.push(ValidationIssue::blocking(
                CODE_RISK_CLASS_DUPLICATE,
                format!(
                    "Duplicate risk class entries found for markets: {}",
                    list(duplicates)
                ),
            ));
        }

        let missing: Vec<&str> = targets
            .iter()
            .copied()
            .filter(|market| !counts.contains_key(market))
            .collect();
        if !missing.is_empty() {
            issues.push(ValidationIssue::blocking(
                CODE_RISK_CLASS_MISSING,
                format!(
                    "Missing risk class entries for target markets: {}",
                    list(missing)
                ),
            ));
        }

        let extraneous: Vec<&str> = counts
            .keys()
            .copied()
            .filter(|market| !targets.contains(market))
            .collect();
        if !extraneous.is_empty() {
            issues.push(ValidationIssue::blocking(
                CODE_RISK_CLASS_EXTRANEOUS,
                format!(
                    "Risk class entries found for non-target markets: {}",
                    list(extraneous)
                ),
            ));
        }

        issues
    }
}

/// Low-confidence classifications need a mitigation plan
pub struct RiskMitigationRule;

impl Rule<IntakeRecord> for RiskMitigationRule {
    fn id(&self) -> &str {
        "risk_mitigation"
    }

    fn name(&self) -> &str {
        "Low Confidence Mitigation"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        record
            .risk_class
            .iter()
            .filter(|entry| entry.confidence == ConfidenceLevel::Low && !entry.has_mitigation_plan())
            .map(|entry| {
                ValidationIssue::blocking(
                    CODE_LOW_CONFIDENCE_UNMITIGATED,
                    format!(
                        "Low-confidence risk class for {} requires mitigation plan.",
                        entry.market.trim()
                    ),
                )
            })
            .collect()
    }
}

/// Technology boundary description is complete
pub struct TechnologyBoundaryRule;

impl Rule<IntakeRecord> for TechnologyBoundaryRule {
    fn id(&self) -> &str {
        "technology_boundary"
    }

    fn name(&self) -> &str {
        "Technology Boundary"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        let missing = record.technology.missing_required_keys();
        if missing.is_empty() {
            return Vec::new();
        }
        vec![ValidationIssue::advisory(
            CODE_TECH_BOUNDARY,
            format!("Missing technology sub-elements: {}", list(missing)),
        )]
    }
}

/// Clinical strategy has endpoints, acceptance criteria and a gap narrative
pub struct ClinicalStrategyRule;

impl Rule<IntakeRecord> for ClinicalStrategyRule {
    fn id(&self) -> &str {
        "clinical_strategy"
    }

    fn name(&self) -> &str {
        "Clinical Strategy"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        let strategy = &record.clinical_strategy;
        let mut issues = Vec::new();

        if strategy.primary_endpoints.is_empty() || strategy.acceptance_criteria.is_empty() {
            issues.push(ValidationIssue::advisory(
                CODE_CLINICAL_STRATEGY,
                "Clinical strategy requires primary endpoints and acceptance criteria.",
            ));
        }

        let has_targets =
            !strategy.primary_endpoints.is_empty() || !strategy.acceptance_criteria.is_empty();
        if has_targets && is_blank(&strategy.gaps_and_mitigation_plan) {
            issues.push(ValidationIssue::advisory(
                CODE_CLINICAL_GAPS,
                "Endpoints or acceptance criteria are defined but the gaps and mitigation plan is blank.",
            ));
        }

        issues
    }
}

/// Adaptive ML needs a lifecycle monitoring plan
pub struct AdaptiveMlMonitoringRule;

impl Rule<IntakeRecord> for AdaptiveMlMonitoringRule {
    fn id(&self) -> &str {
        "adaptive_ml_monitoring"
    }

    fn name(&self) -> &str {
        "Adaptive ML Monitoring"
    }

    fn evaluate(&self, record: &IntakeRecord) -> Vec<ValidationIssue> {
        let adaptive = record
            .technology
            .ai_ml_behavior
            .as_ref()
            .map_or(false, |value| value.to_lowercase_text().contains("adaptive"));
        let monitored = record
            .clinical_strategy
            .lifecycle_monitoring_plan
            .as_deref()
            .map_or(false, |plan| !is_blank(plan));

        if adaptive && !monitored {
            return vec![ValidationIssue::advisory(
                CODE_ADAPTIVE_ML,
                "Adaptive ML requires lifecycle performance monitoring plan.",
            )];
        }
        Vec::new()
    }
}
