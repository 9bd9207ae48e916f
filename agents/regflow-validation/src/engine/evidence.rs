//! Evidence statement validation
//!
//! A statement is only as strong as its weakest resolved evidence. Unknown
//! evidence ids are dropped and reported on the result, never raised.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::contracts::{
    ConfidenceLevel, EvidenceObject, JurisdictionMismatchDetail, StatementCandidate,
    StatementStatus, StatementValidationResult,
};

/// Statement validation engine
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementValidationEngine;

impl StatementValidationEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }

    /// Validate statements against a set of evidence objects
    ///
    /// Returns one result per statement, in input order.
    pub fn validate(
        &self,
        statements: &[StatementCandidate],
        evidence_objects: &[EvidenceObject],
    ) -> Vec<StatementValidationResult> {
        let mut index: HashMap<&str, &EvidenceObject> = HashMap::new();
        for evidence in evidence_objects {
            index.entry(evidence.id.as_str()).or_insert(evidence);
        }

        let results: Vec<_> = statements
            .iter()
            .map(|statement| validate_statement(statement, &index))
            .collect();

        tracing::debug!(
            statements = results.len(),
            evidence_objects = evidence_objects.len(),
            "Statement validation complete"
        );
        results
    }
}

fn validate_statement(
    statement: &StatementCandidate,
    index: &HashMap<&str, &EvidenceObject>,
) -> StatementValidationResult {
    let mut seen = HashSet::new();
    let mut resolved: Vec<&EvidenceObject> = Vec::new();
    let mut unresolved: Vec<String> = Vec::new();

    for id in &statement.evidence_ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match index.get(id.as_str()).copied() {
            Some(evidence) => resolved.push(evidence),
            None => unresolved.push(id.clone()),
        }
    }

    let jurisdiction_mismatch = jurisdiction_gap(&statement.target_jurisdictions, &resolved);
    let weakest = resolved.iter().map(|e| e.confidence).min();

    let mut reasons = Vec::new();
    let status = match weakest {
        None => {
            if statement.evidence_ids.is_empty() {
                reasons.push("No linked evidence object found.".to_string());
            } else {
                reasons.push(format!(
                    "No linked evidence could be resolved; unknown evidence IDs: {}",
                    super::list(&unresolved)
                ));
            }
            StatementStatus::MissingEvidence
        }
        Some(ConfidenceLevel::Low) => {
            let weak: Vec<&str> = resolved
                .iter()
                .filter(|e| e.confidence == ConfidenceLevel::Low)
                .map(|e| e.id.as_str())
                .collect();
            reasons.push(format!(
                "Confidence limited to low by evidence: {}",
                super::list(weak)
            ));
            StatementStatus::LowConfidence
        }
        Some(_) => StatementStatus::Validated,
    };

    if weakest.is_some() && !unresolved.is_empty() {
        reasons.push(format!(
            "Unresolved evidence IDs dropped: {}",
            super::list(&unresolved)
        ));
    }
    if let Some(gap) = &jurisdiction_mismatch {
        reasons.push(format!(
            "Evidence does not cover target jurisdictions: {}",
            super::list(&gap.missing_jurisdictions)
        ));
    }

    StatementValidationResult {
        statement: statement.statement.clone(),
        status,
        confidence: weakest,
        reason: if reasons.is_empty() {
            None
        } else {
            Some(reasons.join(" "))
        },
        unresolved_evidence_ids: unresolved,
        jurisdiction_mismatch,
    }
}

/// Coverage gap between target jurisdictions and resolved evidence
fn jurisdiction_gap(
    targets: &[String],
    resolved: &[&EvidenceObject],
) -> Option<JurisdictionMismatchDetail> {
    let mut required: Vec<String> = Vec::new();
    for target in targets.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !required.iter().any(|r| r == target) {
            required.push(target.to_string());
        }
    }
    if required.is_empty() {
        return None;
    }

    let covered: BTreeSet<&str> = resolved
        .iter()
        .flat_map(|e| e.jurisdiction_relevance.iter().map(|j| j.trim()))
        .filter(|j| !j.is_empty())
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|r| !covered.contains(r.as_str()))
        .cloned()
        .collect();
    if missing.is_empty() {
        return None;
    }

    let evidence_jurisdictions: BTreeMap<String, Vec<String>> = resolved
        .iter()
        .map(|e| (e.id.clone(), e.jurisdiction_relevance.clone()))
        .collect();

    Some(JurisdictionMismatchDetail {
        required_jurisdictions: required,
        covered_jurisdictions: covered.into_iter().map(String::from).collect(),
        missing_jurisdictions: missing,
        evidence_jurisdictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn evidence(id: &str, confidence: ConfidenceLevel, jurisdictions: &[&str]) -> EvidenceObject {
        EvidenceObject {
            id: id.to_string(),
            source: "bench".to_string(),
            version: "1".to_string(),
            owner: "V&V".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            jurisdiction_relevance: jurisdictions.iter().map(|j| j.to_string()).collect(),
            confidence,
            notes: None,
        }
    }

    fn pool() -> Vec<EvidenceObject> {
        vec![
            evidence("EV-H", ConfidenceLevel::High, &["US", "EU"]),
            evidence("EV-M", ConfidenceLevel::Medium, &["US"]),
            evidence("EV-L", ConfidenceLevel::Low, &["EU"]),
        ]
    }

    #[test]
    fn test_weakest_confidence_wins() {
        let results = StatementValidationEngine::new().validate(
            &[
                StatementCandidate::new("high only", ["EV-H"]),
                StatementCandidate::new("high and medium", ["EV-H", "EV-M"]),
                StatementCandidate::new("with low", ["EV-H", "EV-L"]),
            ],
            &pool(),
        );
        assert_eq!(results[0].confidence, Some(ConfidenceLevel::High));
        assert_eq!(results[0].status, StatementStatus::Validated);
        assert!(results[0].reason.is_none());
        assert_eq!(results[1].confidence, Some(ConfidenceLevel::Medium));
        assert_eq!(results[1].status, StatementStatus::Validated);
        assert_eq!(results[2].confidence, Some(ConfidenceLevel::Low));
        assert_eq!(results[2].status, StatementStatus::LowConfidence);
        assert!(results[2].reason.as_deref().unwrap().contains("[EV-L]"));
    }

    #[test]
    fn test_no_evidence_is_missing() {
        let results = StatementValidationEngine::new().validate(
            &[
                StatementCandidate::new("none", Vec::<String>::new()),
                StatementCandidate::new("unknown", ["EV-X"]),
            ],
            &pool(),
        );
        for result in &results {
            assert_eq!(result.status, StatementStatus::MissingEvidence);
            assert!(result.confidence.is_none());
            assert!(result.reason.is_some());
        }
        assert_eq!(results[1].unresolved_evidence_ids, vec!["EV-X"]);
    }

    #[test]
    fn test_unresolved_ids_dropped_not_fatal() {
        let results = StatementValidationEngine::new().validate(
            &[StatementCandidate::new("partial", ["EV-X", "EV-H", "EV-Y", "EV-X"])],
            &pool(),
        );
        assert_eq!(results[0].status, StatementStatus::Validated);
        assert_eq!(results[0].confidence, Some(ConfidenceLevel::High));
        assert_eq!(results[0].unresolved_evidence_ids, vec!["EV-X", "EV-Y"]);
        assert!(results[0].reason.as_deref().unwrap().contains("EV-Y"));
    }

    #[test]
    fn test_duplicate_evidence_ids_first_wins() {
        let mut objects = pool();
        objects.push(evidence("EV-H", ConfidenceLevel::Low, &[]));
        let results = StatementValidationEngine::new()
            .validate(&[StatementCandidate::new("dup", ["EV-H"])], &objects);
        assert_eq!(results[0].confidence, Some(ConfidenceLevel::High));
    }

    #[test]
    fn test_jurisdiction_mismatch_reported() {
        let results = StatementValidationEngine::new().validate(
            &[StatementCandidate::new("us claim", ["EV-M"]).with_target_jurisdictions(["US", "EU", "JP"])],
            &pool(),
        );
        let result = &results[0];
        assert_eq!(result.status, StatementStatus::Validated);
        let gap = result.jurisdiction_mismatch.as_ref().unwrap();
        assert_eq!(gap.required_jurisdictions, vec!["US", "EU", "JP"]);
        assert_eq!(gap.covered_jurisdictions, vec!["US"]);
        assert_eq!(gap.missing_jurisdictions, vec!["EU", "JP"]);
        assert_eq!(gap.evidence_jurisdictions["EV-M"], vec!["US"]);
        assert!(result.reason.as_deref().unwrap().contains("[EU, JP]"));
    }

    #[test]
    fn test_jurisdictions_covered() {
        let results = StatementValidationEngine::new().validate(
            &[StatementCandidate::new("covered", ["EV-M", "EV-L"]).with_target_jurisdictions(["EU", "US"])],
            &pool(),
        );
        assert!(results[0].jurisdiction_mismatch.is_none());
    }

    #[test]
    fn test_order_preserved() {
        let statements: Vec<_> = (0..5)
            .map(|i| StatementCandidate::new(format!("s{}", i), ["EV-H"]))
            .collect();
        let results = StatementValidationEngine::new().validate(&statements, &pool());
        let names: Vec<_> = results.iter().map(|r| r.statement.as_str()).collect();
        assert_eq!(names, vec!["s0", "s1", "s2", "s3", "s4"]);
    }
}
