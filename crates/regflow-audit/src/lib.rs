//! Regflow Audit Ledger
//!
//! Append-only, hash-chained event store for regulatory workflow decisions.
//!
//! ## Features
//!
//! - **Ledger-owned linkage**: `previous_event_hash` and `hash` are always
//!   derived by the ledger, never accepted from the caller
//! - **Canonical hashing**: SHA-256 over a key-sorted JSON form, so payload key
//!   order never changes a hash
//! - **Serialized appends**: at most one append is in flight, so the chain can
//!   never fork under concurrent callers
//! - **Snapshot reads**: `list()` and `verify()` observe a consistent snapshot
//!   and never see a half-written event
//! - **Pluggable storage**: in-memory and durable JSON-lines backends behind
//!   the [`LedgerStorage`] trait
//!
//! ## Example
//!
//! ```rust,no_run
//! use regflow_audit::{AppendRequest, AuditLedger, LedgerConfig, MemoryStorage};
//!
//! #[tokio::main]
//! async fn main() -> regflow_audit::Result<()> {
//!     let ledger = AuditLedger::open(MemoryStorage::new(), LedgerConfig::default()).await?;
//!
//!     ledger
//!         .append(AppendRequest::new(
//!             "packet_validated",
//!             "ra-qa-lead",
//!             serde_json::json!({ "packet_id": "PKT-2026-001", "acceptable": true }),
//!         ))
//!         .await?;
//!
//!     let report = ledger.verify().await?;
//!     assert!(report.intact);
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod error;
pub mod event;
pub mod ledger;
pub mod storage;

pub use chain::{verify_chain, ChainVerification};
pub use error::{LedgerError, Result};
pub use event::{canonical_json, canonical_material, compute_event_hash, AppendRequest, StoredEvent};
pub use ledger::{AuditLedger, LedgerConfig};
pub use storage::{FileStorage, LedgerStorage, MemoryStorage};
