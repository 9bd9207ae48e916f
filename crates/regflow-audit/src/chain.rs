//! Hash chain verification
//!
//! Walks a sequence of stored events and reports the first position where
//! either the stored hash no longer matches the event content or the stored
//! `previous_event_hash` no longer matches the predecessor's hash.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::event::StoredEvent;

/// Chain verification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// Whether every event verified
    pub intact: bool,
    /// Index of the first event that failed verification
    pub first_broken_index: Option<usize>,
    /// Number of events examined (up to and including a broken one)
    pub events_checked: usize,
    /// Why verification failed, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ChainVerification {
    fn intact(events_checked: usize) -> Self {
        Self {
            intact: true,
            first_broken_index: None,
            events_checked,
            reason: None,
        }
    }

    fn broken(index: usize, reason: String) -> Self {
        Self {
            intact: false,
            first_broken_index: Some(index),
            events_checked: index + 1,
            reason: Some(reason),
        }
    }
}

/// Verify a chain of events in stored order
///
/// An empty chain is trivially intact.
pub fn verify_chain(events: &[StoredEvent]) -> ChainVerification {
    let mut expected_previous: Option<&str> = None;

    for (index, event) in events.iter().enumerate() {
        if event.previous_event_hash.as_deref() != expected_previous {
            warn!(
                index,
                event_id = %event.event_id,
                expected = ?expected_previous,
                actual = ?event.previous_event_hash,
                "Hash chain broken: previous_event_hash mismatch"
            );
            return ChainVerification::broken(
                index,
                format!("previous_event_hash mismatch at event '{}'", event.event_id),
            );
        }

        let recomputed = event.recompute_hash();
        if recomputed != event.hash {
            warn!(
                index,
                event_id = %event.event_id,
                stored = %event.hash,
                recomputed = %recomputed,
                "Hash chain broken: event hash mismatch"
            );
            return ChainVerification::broken(
                index,
                format!("hash mismatch at event '{}'", event.event_id),
            );
        }

        expected_previous = Some(event.hash.as_str());
    }

    ChainVerification::intact(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn build_chain(n: usize) -> Vec<StoredEvent> {
        let mut events: Vec<StoredEvent> = Vec::with_capacity(n);
        for i in 0..n {
            let previous = events.last().map(|e| e.hash.clone());
            events.push(StoredEvent::seal(
                format!("evt-{}", i),
                "packet_validated".into(),
                "ra-qa".into(),
                Utc::now(),
                json!({ "seq": i }),
                previous,
            ));
        }
        events
    }

    #[test]
    fn test_empty_chain_is_intact() {
        let report = verify_chain(&[]);
        assert!(report.intact);
        assert_eq!(report.first_broken_index, None);
        assert_eq!(report.events_checked, 0);
    }

    #[test]
    fn test_valid_chain() {
        let events = build_chain(5);
        let report = verify_chain(&events);
        assert!(report.intact);
        assert_eq!(report.events_checked, 5);
    }

    #[test]
    fn test_detects_tampered_payload() {
        let mut events = build_chain(4);
        events[1].payload = json!({ "seq": 99 });

        let report = verify_chain(&events);
        assert!(!report.intact);
        assert_eq!(report.first_broken_index, Some(1));
        assert!(report.reason.unwrap().contains("hash mismatch"));
    }

    #[test]
    fn test_detects_rehashed_tampering_via_link() {
        // Tamper and re-seal event 1: its own hash is consistent again, but
        // event 2 still points at the old hash.
        let mut events = build_chain(4);
        let e = &events[1];
        events[1] = StoredEvent::seal(
            e.event_id.clone(),
            e.event_type.clone(),
            "mallory".into(),
            e.timestamp,
            e.payload.clone(),
            e.previous_event_hash.clone(),
        );

        let report = verify_chain(&events);
        assert!(!report.intact);
        assert_eq!(report.first_broken_index, Some(2));
        assert!(report.reason.unwrap().contains("previous_event_hash"));
    }

    #[test]
    fn test_first_event_must_have_null_previous() {
        let mut events = build_chain(2);
        events[0].previous_event_hash = Some("genesis".into());

        let report = verify_chain(&events);
        assert_eq!(report.first_broken_index, Some(0));
    }

    #[test]
    fn test_removed_event_detected() {
        let mut events = build_chain(3);
        events.remove(1);

        let report = verify_chain(&events);
        assert_eq!(report.first_broken_index, Some(1));
    }
}
