//! Durable JSON-lines ledger storage
//!
//! One event per line. Every append is written and `fsync`ed before it is
//! acknowledged. A failed append truncates the file back to the last
//! committed byte. A torn final line (a process that died mid-append) is cut
//! off when the file is reopened; a corrupt line anywhere else is an error.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::LedgerStorage;
use crate::error::{LedgerError, Result};
use crate::event::StoredEvent;

/// File-backed storage with an in-memory read snapshot
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    writer: Mutex<Writer>,
    events: RwLock<Vec<StoredEvent>>,
}

/// Append handle plus the length of the acknowledged prefix
#[derive(Debug)]
struct Writer {
    file: File,
    committed_len: u64,
}

impl FileStorage {
    /// Open (or create) a ledger file and load its committed events
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(LedgerError::storage(format!(
                    "Failed to read ledger file '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        let (events, valid_len) = parse_lines(&content, &path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                LedgerError::storage(format!(
                    "Failed to open ledger file '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        if valid_len < content.len() {
            warn!(
                path = %path.display(),
                discarded_bytes = content.len() - valid_len,
                "Discarding torn trailing ledger record"
            );
            file.set_len(valid_len as u64).await?;
            file.sync_all().await?;
        }

        info!(path = %path.display(), events = events.len(), "Opened ledger file");

        Ok(Self {
            path,
            writer: Mutex::new(Writer {
                file,
                committed_len: valid_len as u64,
            }),
            events: RwLock::new(events),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cut the file back to the committed prefix after a failed append
    async fn roll_back(&self, writer: &mut Writer) {
        let committed = writer.committed_len;
        let result = match writer.file.set_len(committed).await {
            Ok(()) => writer.file.sync_all().await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => warn!(
                path = %self.path.display(),
                committed_len = committed,
                "Rolled back partial ledger write"
            ),
            Err(e) => error!(
                path = %self.path.display(),
                committed_len = committed,
                error = %e,
                "Failed to roll back partial ledger write"
            ),
        }
    }
}

async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await?;
    file.sync_data().await
}

/// Parse committed lines; returns the events and the byte length of the
/// well-formed prefix.
fn parse_lines(content: &str, path: &Path) -> Result<(Vec<StoredEvent>, usize)> {
    let mut events = Vec::new();
    let mut offset = 0usize;

    for (line_no, line) in content.split_inclusive('\n').enumerate() {
        // An unterminated tail was never acknowledged.
        if !line.ends_with('\n') {
            break;
        }

        let body = line.trim_end_matches(&['\n', '\r'][..]);
        if !body.trim().is_empty() {
            let event = serde_json::from_str::<StoredEvent>(body).map_err(|e| {
                LedgerError::Serialization(format!(
                    "Corrupt ledger record at {}:{}: {}",
                    path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            events.push(event);
        }
        offset += line.len();
    }

    Ok((events, offset))
}

#[async_trait::async_trait]
impl LedgerStorage for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, event: &StoredEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        if let Err(e) = write_line(&mut writer.file, line.as_bytes()).await {
            self.roll_back(&mut writer).await;
            return Err(LedgerError::storage(format!(
                "Failed to commit ledger record to '{}': {}",
                self.path.display(),
                e
            )));
        }
        writer.committed_len += line.len() as u64;

        self.events.write().await.push(event.clone());
        debug!(event_id = %event.event_id, path = %self.path.display(), "Ledger record committed");
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
            json!({"id": id}),
            previous,
        )
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let first = event("evt-1", None);
        let second = event("evt-2", Some(first.hash.clone()));
        {
            let storage = FileStorage::open(&path).await.unwrap();
            storage.append(&first).await.unwrap();
            storage.append(&second).await.unwrap();
        }

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.snapshot().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/ledger.jsonl");

        let storage = FileStorage::open(&path).await.unwrap();
        assert_eq!(storage.len().await.unwrap(), 0);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_torn_tail_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let first = event("evt-1", None);
        let mut content = serde_json::to_string(&first).unwrap();
        content.push('\n');
        content.push_str(r#"{"event_id":"evt-2","event_ty"#);
        std::fs::write(&path, &content).unwrap();

        let storage = FileStorage::open(&path).await.unwrap();
        assert_eq!(storage.snapshot().await.unwrap(), vec![first.clone()]);

        // The next append must start on a clean line.
        let second = event("evt-2", Some(first.hash.clone()));
        storage.append(&second).await.unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_roll_back_discards_uncommitted_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let storage = FileStorage::open(&path).await.unwrap();
        let first = event("evt-1", None);
        storage.append(&first).await.unwrap();
        let committed = std::fs::metadata(&path).unwrap().len();

        // Half a record left behind by a failed write
        {
            let mut writer = storage.writer.lock().await;
            writer.file.write_all(br#"{"event_id":"evt-2","eve"#).await.unwrap();
            writer.file.flush().await.unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > committed);

            storage.roll_back(&mut writer).await;
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), committed);

        let second = event("evt-2", Some(first.hash.clone()));
        storage.append(&second).await.unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.snapshot().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_corrupt_middle_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let first = event("evt-1", None);
        let content = format!("not json\n{}\n", serde_json::to_string(&first).unwrap());
        std::fs::write(&path, content).unwrap();

        let err = FileStorage::open(&path).await.unwrap_err();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }
}
