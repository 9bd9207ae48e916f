//! Storage backends for the audit ledger
//!
//! The ledger serializes appends itself; a backend only has to make each
//! appended event durable before returning and serve consistent snapshots.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::fmt;

use crate::error::Result;
use crate::event::StoredEvent;

/// Append/read interface over the ledger's storage medium
///
/// # Contract
///
/// - `append` returns only after the event is durable on the medium. A
///   returned error means the event was not committed.
/// - `snapshot` returns every committed event in append order. It never
///   returns an event in a partially-written state.
/// - Implementations never reorder, filter or rewrite events.
#[async_trait::async_trait]
pub trait LedgerStorage: Send + Sync + fmt::Debug {
    /// Returns the name of this backend (for logs)
    fn name(&self) -> &str;

    /// Durably commit one event at the end of the sequence
    async fn append(&self, event: &StoredEvent) -> Result<()>;

    /// All committed events in append order
    async fn snapshot(&self) -> Result<Vec<StoredEvent>>;

    /// Number of committed events
    async fn len(&self) -> Result<usize> {
        Ok(self.snapshot().await?.len())
    }
}
