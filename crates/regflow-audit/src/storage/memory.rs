//! In-memory ledger storage

use tokio::sync::RwLock;

use super::LedgerStorage;
use crate::error::Result;
use crate::event::StoredEvent;

/// Volatile storage backed by a vector
///
/// Durability ends with the process; useful for tests and for edge
/// deployments that ship events elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    events: RwLock<Vec<StoredEvent>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with already-committed events
    pub fn from_events(events: Vec<StoredEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

#[async_trait::async_trait]
impl LedgerStorage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, event: &StoredEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<StoredEvent>> {
        Ok(self.events.read().await.clone())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.events.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn event(id: &str, previous: Option<String>) -> StoredEvent {
        StoredEvent::seal(
            id.into(),
            "t".into(),
            "a".into(),
            Utc::now(),
            json!({}),
            previous,
        )
    }

    #[tokio::test]
    async fn test_append_and_snapshot_preserve_order() {
        let storage = MemoryStorage::new();
        let first = event("evt-1", None);
        let second = event("evt-2", Some(first.hash.clone()));

        storage.append(&first).await.unwrap();
        storage.append(&second).await.unwrap();

        let snapshot = storage.snapshot().await.unwrap();
        assert_eq!(snapshot, vec![first, second]);
        assert_eq!(storage.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_from_events() {
        let storage = MemoryStorage::from_events(vec![event("evt-1", None)]);
        assert_eq!(storage.len().await.unwrap(), 1);
        assert_eq!(storage.name(), "memory");
    }
}
