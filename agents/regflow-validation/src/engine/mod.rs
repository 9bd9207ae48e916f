//! Validation engines
//!
//! Deterministic, read-only validation of intake records, evidence-backed
//! statements and handoff packets. Engines hold no mutable state and never
//! touch the audit ledger, so a single instance can be shared across tasks.

mod evidence;
mod intake;
mod packet;

pub use evidence::StatementValidationEngine;
pub use intake::*;
pub use packet::*;

use crate::contracts::ValidationIssue;

/// A single validation rule over an input record
pub trait Rule<T>: Send + Sync {
    /// Rule identifier
    fn id(&self) -> &str;

    /// Rule name
    fn name(&self) -> &str;

    /// Evaluate the input and return findings in a stable order
    fn evaluate(&self, input: &T) -> Vec<ValidationIssue>;
}

/// Run rules in declaration order and accumulate their findings
fn run_rules<T>(rules: &[Box<dyn Rule<T>>], input: &T) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for rule in rules {
        let findings = rule.evaluate(input);
        if !findings.is_empty() {
            tracing::debug!(
                rule = rule.id(),
                findings = findings.len(),
                "Rule produced findings"
            );
        }
        issues.extend(findings);
    }
    issues
}

/// Render a list of names for issue messages: `[A, B]`
pub(crate) fn list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    format!("[{}]", joined.join(", "))
}
