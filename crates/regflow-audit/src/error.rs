//! Error types for the audit ledger
//!
//! Every variant here is an integrity or environment fault. Validation findings
//! never travel through this type.

use thiserror::Error;

/// Main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The storage medium could not durably commit or read events
    #[error("Storage error: {0}")]
    Storage(String),

    /// An event could not be serialized or a stored record could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An event with the same identifier already exists in the chain
    #[error("Duplicate event id: {0}")]
    DuplicateEventId(String),

    /// The append request is not representable as an audit event
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The stored chain no longer verifies
    #[error("Hash chain broken at index {index}: {reason}")]
    ChainBroken { index: usize, reason: String },
}

impl LedgerError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        LedgerError::Storage(msg.into())
    }

    /// Create an invalid event error
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        LedgerError::InvalidEvent(msg.into())
    }

    /// Whether this error signals tampering or corruption.
    ///
    /// Integrity errors must be surfaced; retrying the operation cannot fix them.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, LedgerError::ChainBroken { .. })
    }

    /// Whether the caller supplied an unacceptable request
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            LedgerError::DuplicateEventId(_) | LedgerError::InvalidEvent(_)
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(format!("JSON error: {}", err))
    }
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::ChainBroken {
            index: 3,
            reason: "hash mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Hash chain broken at index 3: hash mismatch");
    }

    #[test]
    fn test_error_classification() {
        assert!(LedgerError::ChainBroken {
            index: 0,
            reason: String::new()
        }
        .is_integrity_violation());
        assert!(!LedgerError::storage("disk full").is_integrity_violation());
        assert!(LedgerError::DuplicateEventId("evt-1".into()).is_caller_error());
        assert!(LedgerError::invalid_event("blank actor").is_caller_error());
        assert!(!LedgerError::storage("disk full").is_caller_error());
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let err: LedgerError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, LedgerError::Storage(_)));
    }
}
