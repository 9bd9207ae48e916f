//! Handoff packet acceptance rules
//!
//! All checks run independently and accumulate, so a caller sees the full
//! remediation list in one pass.

use std::collections::{BTreeMap, HashSet};

use super::{list, run_rules, Rule};
use crate::contracts::{
    no_blocking_issues, ApprovalDecision, ApprovalLogEntry, HandoffPacket,
    PacketValidationResponse, SupersededApproval, ValidationIssue,
};

pub const CODE_AC_EVIDENCE: &str = "PACKET-AC-EVIDENCE";
pub const CODE_HIGH_RISK_CONTROLS: &str = "PACKET-HIGH-RISK-CONTROLS";
pub const CODE_REQUIRED_APPROVALS: &str = "PACKET-REQUIRED-APPROVALS";
pub const CODE_BLOCKER_DEFECTS: &str = "PACKET-BLOCKER-DEFECTS";

/// Packet acceptance engine
pub struct PacketValidationEngine {
    rules: Vec<Box<dyn Rule<HandoffPacket>>>,
}

impl Default for PacketValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketValidationEngine {
    /// Create new engine with the standard rule set
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(AcceptanceEvidenceRule),
                Box::new(HighRiskControlRule),
                Box::new(RequiredApprovalsRule),
                Box::new(BlockerDefectRule),
            ],
        }
    }

    /// Validate a packet for handoff
    pub fn validate(&self, packet: &HandoffPacket) -> PacketValidationResponse {
        let issues = run_rules(&self.rules, packet);
        let superseded_approvals = superseded_approvals(packet);

        tracing::debug!(
            packet_id = %packet.packet_id,
            issues = issues.len(),
            superseded = superseded_approvals.len(),
            "Packet validation complete"
        );

        PacketValidationResponse {
            acceptable: no_blocking_issues(&issues),
            issues,
            superseded_approvals,
        }
    }

    /// Identifiers of the rules applied, in order
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

/// Effective approval log entry per signer role
///
/// The most recent entry by timestamp wins; on equal timestamps the later
/// log position wins.
pub fn effective_approvals(log: &[ApprovalLogEntry]) -> BTreeMap<&str, &ApprovalLogEntry> {
    let mut effective: BTreeMap<&str, &ApprovalLogEntry> = BTreeMap::new();
    for entry in log {
        let role = entry.signer_role.trim();
        let newer = effective
            .get(role)
            .map_or(true, |current| entry.timestamp >= current.timestamp);
        if newer {
            effective.insert(role, entry);
        }
    }
    effective
}

/// Required roles in first-seen order, trimmed and deduplicated
fn required_roles(packet: &HandoffPacket) -> Vec<&str> {
    let mut seen = HashSet::new();
    packet
        .required_approvers
        .iter()
        .map(|role| role.trim())
        .filter(|role| !role.is_empty() && seen.insert(*role))
        .collect()
}

/// Earlier entries of required roles whose decision differs from the effective one
pub fn superseded_approvals(packet: &HandoffPacket) -> Vec<SupersededApproval> {
    let effective = effective_approvals(&packet.approval_log);
    let mut superseded = Vec::new();

    for role in required_roles(packet) {
        let Some(winner) = effective.get(role) else {
            continue;
        };
        for entry in &packet.approval_log {
            if entry.signer_role.trim() != role || std::ptr::eq(entry, *winner) {
                continue;
            }
            if entry.decision != winner.decision {
                superseded.push(SupersededApproval {
                    signer_role: role.to_string(),
                    superseded_decision: entry.decision,
                    superseded_at: entry.timestamp,
                    effective_decision: winner.decision,
                    effective_at: winner.timestamp,
                });
            }
        }
    }

    superseded
}

/// Every acceptance criterion references in-scope evidence
pub struct AcceptanceEvidenceRule;

impl Rule<HandoffPacket> for AcceptanceEvidenceRule {
    fn id(&self) -> &str {
        "acceptance_evidence"
    }

    fn name(&self) -> &str {
        "Acceptance Criteria Evidence"
    }

    fn evaluate(&self, packet: &HandoffPacket) -> Vec<ValidationIssue> {
        let index: HashSet<&str> = packet.evidence_index.iter().map(|e| e.trim()).collect();
        let missing: Vec<&str> = packet
            .acceptance_criteria
            .iter()
            .filter(|ac| !index.contains(ac.evidence_ref.trim()))
            .map(|ac| ac.id.as_str())
            .collect();

        if missing.is_empty() {
            return Vec::new();
        }
        vec![ValidationIssue::blocking(
            CODE_AC_EVIDENCE,
            format!(
                "Acceptance criteria reference evidence outside the evidence index: {}",
                list(missing)
            ),
        )]
    }
}

/// High and critical risks have verified controls
pub struct HighRiskControlRule;

impl Rule<HandoffPacket> for HighRiskControlRule {
    fn id(&self) -> &str {
        "high_risk_controls"
    }

    fn name(&self) -> &str {
        "High Risk Control Verification"
    }

    fn evaluate(&self, packet: &HandoffPacket) -> Vec<ValidationIssue> {
        let unverified: Vec<String> = packet
            .risk_controls
            .iter()
            .filter(|rc| rc.severity.requires_verified_control() && !rc.verified)
            .map(|rc| format!("{} ({})", rc.risk_id, rc.severity))
            .collect();

        if unverified.is_empty() {
            return Vec::new();
        }
        vec![ValidationIssue::blocking(
            CODE_HIGH_RISK_CONTROLS,
            format!(
                "High-severity risks without verified controls: {}",
                list(unverified)
            ),
        )]
    }
}

/// Every required role has an effective approval
pub struct RequiredApprovalsRule;

impl Rule<HandoffPacket> for RequiredApprovalsRule {
    fn id(&self) -> &str {
        "required_approvals"
    }

    fn name(&self) -> &str {
        "Required Approvals"
    }

    fn evaluate(&self, packet: &HandoffPacket) -> Vec<ValidationIssue> {
        let effective = effective_approvals(&packet.approval_log);
        let missing: Vec<String> = required_roles(packet)
            .into_iter()
            .filter_map(|role| match effective.get(role) {
                Some(entry) if entry.decision == ApprovalDecision::Approved => None,
                Some(entry) => Some(format!("{} ({})", role, entry.decision)),
                None => Some(format!("{} (no decision)", role)),
            })
            .collect();

        if missing.is_empty() {
            return Vec::new();
        }
        vec![ValidationIssue::blocking(
            CODE_REQUIRED_APPROVALS,
            format!("Missing required approvals: {}", list(missing)),
        )]
    }
}

/// Open blocker defects need an approved exception
pub struct BlockerDefectRule;

impl Rule<HandoffPacket> for BlockerDefectRule {
    fn id(&self) -> &str {
        "blocker_defects"
    }

    fn name(&self) -> &str {
        "Blocker Defects"
    }

    fn evaluate(&self, packet: &HandoffPacket) -> Vec<ValidationIssue> {
        if packet.blocker_defects_open > 0 && !packet.approved_exception {
            return vec![ValidationIssue::blocking(
                CODE_BLOCKER_DEFECTS,
                format!(
                    "{} open blocker defect(s) present without approved exception.",
                    packet.blocker_defects_open
                ),
            )];
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{AcceptanceCriterion, RiskControlLink, RiskSeverity};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0).unwrap()
    }

    fn approval(role: &str, decision: ApprovalDecision, hour: u32) -> ApprovalLogEntry {
        ApprovalLogEntry {
            signer_role: role.to_string(),
            decision,
            timestamp: at(hour),
            comment: None,
        }
    }

    fn acceptable_packet() -> HandoffPacket {
        HandoffPacket {
            packet_id: "PKT-2026-001".into(),
            title: "Arrhythmia classifier v2 verification handoff".into(),
            owner_agent: "design-controls".into(),
            target_agent: "verification".into(),
            source_requirements: vec![],
            risk_controls: vec![
                RiskControlLink {
                    risk_id: "R-1".into(),
                    control_id: "C-1".into(),
                    verified: true,
                    severity: RiskSeverity::Critical,
                },
                RiskControlLink {
                    risk_id: "R-2".into(),
                    control_id: "C-2".into(),
                    verified: false,
                    severity: RiskSeverity::Low,
                },
            ],
            acceptance_criteria: vec![AcceptanceCriterion {
                id: "AC-1".into(),
                statement: "Sensitivity >= 0.9".into(),
                verification_method: "test".into(),
                evidence_ref: "EV-1".into(),
            }],
            evidence_index: vec!["EV-1".into()],
            required_approvers: vec!["quality".into(), "regulatory".into()],
            approval_log: vec![
                approval("quality", ApprovalDecision::Approved, 9),
                approval("regulatory", ApprovalDecision::Approved, 10),
            ],
            blocker_defects_open: 0,
            approved_exception: false,
        }
    }

    fn codes(response: &PacketValidationResponse) -> Vec<&str> {
        response.issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn test_acceptable_packet() {
        let response = PacketValidationEngine::new().validate(&acceptable_packet());
        assert!(response.acceptable);
        assert!(response.issues.is_empty());
        assert!(response.superseded_approvals.is_empty());
    }

    #[test]
    fn test_blocker_defects_and_exception() {
        let mut packet = acceptable_packet();
        packet.blocker_defects_open = 2;
        packet.acceptance_criteria[0].evidence_ref = "EV-9".into();

        let response = PacketValidationEngine::new().validate(&packet);
        assert_eq!(codes(&response), vec![CODE_AC_EVIDENCE, CODE_BLOCKER_DEFECTS]);

        packet.approved_exception = true;
        let response = PacketValidationEngine::new().validate(&packet);
        assert_eq!(codes(&response), vec![CODE_AC_EVIDENCE]);
    }

    #[test]
    fn test_unverified_high_risk_controls() {
        let mut packet = acceptable_packet();
        packet.risk_controls[0].verified = false;
        packet.risk_controls[1].severity = RiskSeverity::High;

        let response = PacketValidationEngine::new().validate(&packet);
        assert!(!response.acceptable);
        assert_eq!(codes(&response), vec![CODE_HIGH_RISK_CONTROLS]);
        assert!(response.issues[0].message.contains("R-1 (critical)"));
        assert!(response.issues[0].message.contains("R-2 (high)"));
    }

    #[test]
    fn test_missing_and_rejected_approvals() {
        let mut packet = acceptable_packet();
        packet.required_approvers.push("clinical".into());
        packet.approval_log[1].decision = ApprovalDecision::Rejected;

        let response = PacketValidationEngine::new().validate(&packet);
        assert_eq!(codes(&response), vec![CODE_REQUIRED_APPROVALS]);
        let message = &response.issues[0].message;
        assert!(message.contains("regulatory (rejected)"));
        assert!(message.contains("clinical (no decision)"));
        assert!(!message.contains("quality"));
    }

    #[test]
    fn test_most_recent_approval_wins() {
        let mut packet = acceptable_packet();
        // Later log position but earlier timestamp: the approval at 10h still wins.
        packet
            .approval_log
            .push(approval("regulatory", ApprovalDecision::Rejected, 8));

        let response = PacketValidationEngine::new().validate(&packet);
        assert!(response.acceptable);
        assert_eq!(response.superseded_approvals.len(), 1);
        let superseded = &response.superseded_approvals[0];
        assert_eq!(superseded.signer_role, "regulatory");
        assert_eq!(superseded.superseded_decision, ApprovalDecision::Rejected);
        assert_eq!(superseded.effective_decision, ApprovalDecision::Approved);

        packet
            .approval_log
            .push(approval("regulatory", ApprovalDecision::Deferred, 11));
        let response = PacketValidationEngine::new().validate(&packet);
        assert!(!response.acceptable);
        assert_eq!(response.superseded_approvals.len(), 2);
    }

    #[test]
    fn test_timestamp_tie_later_position_wins() {
        let log = vec![
            approval("quality", ApprovalDecision::Approved, 9),
            approval("quality", ApprovalDecision::Rejected, 9),
        ];
        let effective = effective_approvals(&log);
        assert_eq!(effective["quality"].decision, ApprovalDecision::Rejected);
    }

    #[test]
    fn test_unrequired_roles_not_reported() {
        let mut packet = acceptable_packet();
        packet.approval_log.push(approval("marketing", ApprovalDecision::Rejected, 7));
        packet.approval_log.push(approval("marketing", ApprovalDecision::Approved, 12));
        let response = PacketValidationEngine::new().validate(&packet);
        assert!(response.acceptable);
        assert!(response.superseded_approvals.is_empty());
    }

    #[test]
    fn test_all_checks_accumulate() {
        let mut packet = acceptable_packet();
        packet.acceptance_criteria[0].evidence_ref = "EV-404".into();
        packet.risk_controls[0].verified = false;
        packet.approval_log.clear();
        packet.blocker_defects_open = 1;

        let response = PacketValidationEngine::new().validate(&packet);
        assert_eq!(
            codes(&response),
            vec![
                CODE_AC_EVIDENCE,
                CODE_HIGH_RISK_CONTROLS,
                CODE_REQUIRED_APPROVALS,
                CODE_BLOCKER_DEFECTS
            ]
        );
        assert_eq!(
            PacketValidationEngine::new().rule_ids(),
            vec![
                "acceptance_evidence",
                "high_risk_controls",
                "required_approvals",
                "blocker_defects"
            ]
        );
    }
}
