//! The audit ledger
//!
//! `AuditLedger` is the only authority on chain linkage. Appends run one at a
//! time under the chain-head lock: read the last hash, seal the new event,
//! commit it to storage, advance the head. That sequence runs on its own
//! task, so dropping the caller's future never interrupts a commit halfway.
//! Reads go straight to the storage snapshot and never wait for the head lock.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chain::{verify_chain, ChainVerification};
use crate::error::{LedgerError, Result};
use crate::event::{AppendRequest, StoredEvent};
use crate::storage::{FileStorage, LedgerStorage, MemoryStorage};

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-lines file backing the ledger; in-memory when unset
    pub path: Option<PathBuf>,

    /// Refuse to open a ledger whose stored chain does not verify
    pub verify_on_open: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: None,
            verify_on_open: true,
        }
    }
}

impl LedgerConfig {
    /// Set the ledger file path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set whether the chain is verified when opened
    pub fn with_verify_on_open(mut self, verify: bool) -> Self {
        self.verify_on_open = verify;
        self
    }
}

/// Mutable chain state guarded by the append lock
#[derive(Debug, Default)]
struct ChainHead {
    last_hash: Option<String>,
    event_ids: HashSet<String>,
    len: usize,
}

impl ChainHead {
    fn from_events(events: &[StoredEvent]) -> Self {
        Self {
            last_hash: events.last().map(|e| e.hash.clone()),
            event_ids: events.iter().map(|e| e.event_id.clone()).collect(),
            len: events.len(),
        }
    }
}

/// Append-only, hash-chained audit ledger
#[derive(Debug)]
pub struct AuditLedger {
    storage: Arc<dyn LedgerStorage>,
    head: Arc<Mutex<ChainHead>>,
}

impl AuditLedger {
    /// Open a ledger over existing storage
    ///
    /// Rebuilds the chain head from the stored events. With
    /// `verify_on_open`, a broken chain fails with
    /// [`LedgerError::ChainBroken`] instead of being extended.
    pub async fn open<S>(storage: S, config: LedgerConfig) -> Result<Self>
    where
        S: LedgerStorage + 'static,
    {
        let events = storage.snapshot().await?;

        if config.verify_on_open {
            let report = verify_chain(&events);
            if let Some(index) = report.first_broken_index {
                return Err(LedgerError::ChainBroken {
                    index,
                    reason: report.reason.unwrap_or_default(),
                });
            }
        }

        info!(
            backend = storage.name(),
            events = events.len(),
            "Audit ledger opened"
        );

        Ok(Self {
            head: Arc::new(Mutex::new(ChainHead::from_events(&events))),
            storage: Arc::new(storage),
        })
    }

    /// Open the backend selected by `config`
    pub async fn open_configured(config: LedgerConfig) -> Result<Self> {
        match config.path.clone() {
            Some(path) => {
                let storage = FileStorage::open(path).await?;
                Self::open(storage, config).await
            }
            None => Self::open(MemoryStorage::new(), config).await,
        }
    }

    /// In-memory ledger, mostly for tests
    pub async fn in_memory() -> Result<Self> {
        Self::open(MemoryStorage::new(), LedgerConfig::default()).await
    }

    /// Append an event and return it as stored
    ///
    /// Caller-supplied `hash`/`previous_event_hash` are discarded. The event
    /// is durable when this returns `Ok`.
    pub async fn append(&self, request: AppendRequest) -> Result<StoredEvent> {
        if request.event_type.trim().is_empty() {
            return Err(LedgerError::invalid_event("event_type must not be blank"));
        }
        if request.actor.trim().is_empty() {
            return Err(LedgerError::invalid_event("actor must not be blank"));
        }
        if request.carries_client_linkage() {
            warn!(
                event_type = %request.event_type,
                actor = %request.actor,
                "Discarding client-supplied hash linkage"
            );
        }

        let storage = Arc::clone(&self.storage);
        let head = Arc::clone(&self.head);
        tokio::spawn(commit(storage, head, request))
            .await
            .map_err(|e| LedgerError::storage(format!("Append task failed: {}", e)))?
    }

    /// Every stored event in append order
    pub async fn list(&self) -> Result<Vec<StoredEvent>> {
        self.storage.snapshot().await
    }

    /// Recompute and check the whole chain
    pub async fn verify(&self) -> Result<ChainVerification> {
        let events = self.storage.snapshot().await?;
        Ok(verify_chain(&events))
    }

    /// Verify the chain, turning a broken link into an error
    pub async fn ensure_intact(&self) -> Result<ChainVerification> {
        let report = self.verify().await?;
        match report.first_broken_index {
            Some(index) => Err(LedgerError::ChainBroken {
                index,
                reason: report.reason.clone().unwrap_or_default(),
            }),
            None => Ok(report),
        }
    }

    /// Number of stored events
    pub async fn len(&self) -> Result<usize> {
        self.storage.len().await
    }

    /// Whether the ledger holds no events
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Hash of the most recent event
    pub async fn head_hash(&self) -> Option<String> {
        self.head.lock().await.last_hash.clone()
    }

    /// Name of the storage backend
    pub fn backend(&self) -> &str {
        self.storage.name()
    }

}

/// Seal and commit one event under the chain-head lock
async fn commit(
    storage: Arc<dyn LedgerStorage>,
    head: Arc<Mutex<ChainHead>>,
    request: AppendRequest,
) -> Result<StoredEvent> {
    let mut head = head.lock().await;

    let event_id = request
        .event_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if head.event_ids.contains(&event_id) {
        return Err(LedgerError::DuplicateEventId(event_id));
    }

    let event = StoredEvent::seal(
        event_id,
        request.event_type,
        request.actor,
        request.timestamp.unwrap_or_else(Utc::now),
        request.payload,
        head.last_hash.clone(),
    );

    storage.append(&event).await?;

    head.last_hash = Some(event.hash.clone());
    head.event_ids.insert(event.event_id.clone());
    head.len += 1;

    info!(
        index = head.len - 1,
        event_id = %event.event_id,
        event_type = %event.event_type,
        actor = %event.actor,
        hash = %event.hash,
        "Audit event appended"
    );

    Ok(event)
}
