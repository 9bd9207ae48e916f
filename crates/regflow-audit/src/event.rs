//! Audit event model and canonical hashing
//!
//! The hash of an event covers its identifier, type, actor, timestamp,
//! payload and the hash of its predecessor. Hash material is a canonical JSON
//! object: keys sorted at every depth, no insignificant whitespace, timestamps
//! as RFC 3339 UTC with nanoseconds.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Caller-side request to append an event
///
/// `previous_event_hash` and `hash` are accepted on the wire for compatibility
/// but are never trusted: the ledger discards them and derives both itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    /// Event identifier; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Kind of event (e.g. "packet_validated")
    pub event_type: String,

    /// Already-authenticated actor identifier
    pub actor: String,

    /// When the event happened; defaults to the append time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Opaque structured payload owned by the caller
    #[serde(default)]
    pub payload: Value,

    /// Ignored; the ledger derives linkage from its own head
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_event_hash: Option<String>,

    /// Ignored; the ledger computes the hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl AppendRequest {
    /// Create a new append request
    pub fn new(event_type: impl Into<String>, actor: impl Into<String>, payload: Value) -> Self {
        Self {
            event_id: None,
            event_type: event_type.into(),
            actor: actor.into(),
            timestamp: None,
            payload,
            previous_event_hash: None,
            hash: None,
        }
    }

    /// Set an explicit event identifier
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Set an explicit timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Whether the caller tried to supply linkage fields
    pub fn carries_client_linkage(&self) -> bool {
        self.previous_event_hash.is_some() || self.hash.is_some()
    }
}

/// An event as committed to the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: String,
    pub event_type: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
    /// Hash of the preceding event; `None` only for the first event
    pub previous_event_hash: Option<String>,
    /// SHA-256 of the canonical material, lowercase hex
    pub hash: String,
}

impl StoredEvent {
    /// Build a sealed event: computes the hash over all other fields
    pub fn seal(
        event_id: String,
        event_type: String,
        actor: String,
        timestamp: DateTime<Utc>,
        payload: Value,
        previous_event_hash: Option<String>,
    ) -> Self {
        let hash = compute_event_hash(
            &event_id,
            &event_type,
            &actor,
            &timestamp,
            &payload,
            previous_event_hash.as_deref(),
        );
        Self {
            event_id,
            event_type,
            actor,
            timestamp,
            payload,
            previous_event_hash,
            hash,
        }
    }

    /// Recompute the hash from the stored fields
    pub fn recompute_hash(&self) -> String {
        compute_event_hash(
            &self.event_id,
            &self.event_type,
            &self.actor,
            &self.timestamp,
            &self.payload,
            self.previous_event_hash.as_deref(),
        )
    }

    /// Whether the stored hash matches the stored content
    pub fn is_self_consistent(&self) -> bool {
        self.recompute_hash() == self.hash
    }
}

/// Build the canonical hash material for an event
pub fn canonical_material(
    event_id: &str,
    event_type: &str,
    actor: &str,
    timestamp: &DateTime<Utc>,
    payload: &Value,
    previous_event_hash: Option<&str>,
) -> String {
    let previous = match previous_event_hash {
        Some(hash) => Value::String(hash.to_string()),
        None => Value::Null,
    };

    // Keys listed here in sorted order; write_canonical sorts nested objects.
    let fields: [(&str, Value); 6] = [
        ("actor", Value::String(actor.to_string())),
        ("event_id", Value::String(event_id.to_string())),
        ("event_type", Value::String(event_type.to_string())),
        ("payload", payload.clone()),
        ("previous_event_hash", previous),
        (
            "timestamp",
            Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        ),
    ];

    let mut out = String::with_capacity(256);
    out.push('{');
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_json_string(key, &mut out);
        out.push(':');
        write_canonical(value, &mut out);
    }
    out.push('}');
    out
}

/// Compute the SHA-256 event hash as lowercase hex
pub fn compute_event_hash(
    event_id: &str,
    event_type: &str,
    actor: &str,
    timestamp: &DateTime<Utc>,
    payload: &Value,
    previous_event_hash: Option<&str>,
) -> String {
    let material = canonical_material(
        event_id,
        event_type,
        actor,
        timestamp,
        payload,
        previous_event_hash,
    );
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize())
}

/// Render any JSON value in canonical form (keys sorted at every depth)
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_json_string(s, out),
        // Null, Bool and Number have a single compact rendering.
        other => out.push_str(&other.to_string()),
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_string()).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn hash_for(payload: Value) -> String {
        compute_event_hash(
            "evt-1",
            "intake_validated",
            "qa-lead",
            &fixed_timestamp(),
            &payload,
            Some("prev-123"),
        )
    }

    #[test]
    fn test_same_payload_same_hash() {
        let a = json!({"subject": "intake:class-II:US", "verdict": {"valid": true, "issues": 2}});
        let b = json!({"subject": "intake:class-II:US", "verdict": {"valid": true, "issues": 2}});
        assert_eq!(hash_for(a), hash_for(b));
    }

    #[test]
    fn test_key_order_does_not_change_hash() {
        let a: Value =
            serde_json::from_str(r#"{"a": 1, "b": {"x": true, "y": [1, 2, 3]}}"#).unwrap();
        let b: Value =
            serde_json::from_str(r#"{"b": {"y": [1, 2, 3], "x": true}, "a": 1}"#).unwrap();
        assert_eq!(hash_for(a), hash_for(b));
    }

    #[test]
    fn test_changed_payload_changes_hash() {
        let a = json!({"subject": "intake:class-II:US", "verdict": {"valid": true, "issues": 2}});
        let b = json!({"subject": "intake:class-II:US", "verdict": {"valid": true, "issues": 3}});
        assert_ne!(hash_for(a), hash_for(b));
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        let hash = hash_for(json!({}));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_previous_hash_participates() {
        let ts = fixed_timestamp();
        let payload = json!({"k": "v"});
        let first = compute_event_hash("evt-1", "t", "a", &ts, &payload, None);
        let linked = compute_event_hash("evt-1", "t", "a", &ts, &payload, Some(&first));
        assert_ne!(first, linked);
    }

    #[test]
    fn test_canonical_material_layout() {
        let material = canonical_material(
            "evt-1",
            "t",
            "a",
            &fixed_timestamp(),
            &json!({"z": 1, "a": [null, "x"]}),
            None,
        );
        assert_eq!(
            material,
            r#"{"actor":"a","event_id":"evt-1","event_type":"t","payload":{"a":[null,"x"],"z":1},"previous_event_hash":null,"timestamp":"2026-01-01T12:00:00.000000000Z"}"#
        );
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value: Value = serde_json::from_str(r#"{"b": {"d": 1, "c": 2}, "a": [3, {"f": 4, "e": 5}]}"#).unwrap();
        assert_eq!(
            canonical_json(&value),
            r#"{"a":[3,{"e":5,"f":4}],"b":{"c":2,"d":1}}"#
        );
    }

    #[test]
    fn test_seal_and_recompute() {
        let event = StoredEvent::seal(
            "evt-1".into(),
            "t".into(),
            "a".into(),
            fixed_timestamp(),
            json!({"n": 1}),
            None,
        );
        assert!(event.is_self_consistent());

        let mut tampered = event.clone();
        tampered.actor = "mallory".into();
        assert!(!tampered.is_self_consistent());
    }

    #[test]
    fn test_stored_event_serde_preserves_hash() {
        let event = StoredEvent::seal(
            "evt-1".into(),
            "t".into(),
            "a".into(),
            Utc::now(),
            json!({"nested": {"b": 2, "a": 1}}),
            Some("abc".into()),
        );
        let line = serde_json::to_string(&event).unwrap();
        let decoded: StoredEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(decoded, event);
        assert!(decoded.is_self_consistent());
    }

    #[test]
    fn test_append_request_linkage_detection() {
        let req = AppendRequest::new("t", "a", json!({}));
        assert!(!req.carries_client_linkage());

        let mut forged = req.clone();
        forged.previous_event_hash = Some("forged".into());
        assert!(forged.carries_client_linkage());
    }
}
