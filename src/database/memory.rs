use crate::database::{paths, DocumentStore, Precondition, Snapshot, Subscription};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;

const CHANGE_FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct StoredDocument {
    version: u64,
    data: JsonValue,
}

struct Inner {
    docs: RwLock<BTreeMap<String, StoredDocument>>,
    changes: broadcast::Sender<Snapshot>,
}

/// Process-local store. Every committed write is published on a change feed
/// while the write lock is held, so subscribers see per-document commit order.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                docs: RwLock::new(BTreeMap::new()),
                changes,
            }),
        }
    }
}

impl Inner {
    async fn read(&self, path: &str) -> Option<Snapshot> {
        self.docs
            .read()
            .await
            .get(path)
            .map(|doc| Snapshot::new(path, doc.version, doc.data.clone()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, path: &str) -> Result<Option<Snapshot>> {
        Ok(self.inner.read(path).await)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Snapshot>> {
        let prefix = format!("{}/", collection);
        let docs = self.inner.docs.read().await;
        let children = docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| paths::parent(path) == collection)
            .map(|(path, doc)| Snapshot::new(path.clone(), doc.version, doc.data.clone()))
            .collect();
        Ok(children)
    }

    async fn put(&self, path: &str, data: JsonValue, precondition: Precondition) -> Result<u64> {
        let mut docs = self.inner.docs.write().await;
        let current = docs.get(path).map(|doc| doc.version);

        let satisfied = match precondition {
            Precondition::None => true,
            Precondition::Absent => current.is_none(),
            Precondition::Version(expected) => current == Some(expected),
        };
        if !satisfied {
            return Err(Error::Conflict(path.to_string()));
        }

        let version = current.unwrap_or(0) + 1;
        docs.insert(
            path.to_string(),
            StoredDocument {
                version,
                data: data.clone(),
            },
        );
        // No receivers is fine.
        let _ = self.inner.changes.send(Snapshot::new(path, version, data));
        Ok(version)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        // Subscribe before reading so no commit falls between the two.
        let mut changes = self.inner.changes.subscribe();
        let current = self.inner.read(path).await;
        let inner = self.inner.clone();
        let path = path.to_string();

        let source = async_stream::stream! {
            let mut last_version = 0;
            if let Some(snapshot) = current {
                last_version = snapshot.version;
                yield snapshot;
            }
            loop {
                match changes.recv().await {
                    Ok(snapshot) => {
                        if snapshot.path == path && snapshot.version > last_version {
                            last_version = snapshot.version;
                            yield snapshot;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(path = %path, skipped, "subscriber lagged, resyncing");
                        if let Some(snapshot) = inner.read(&path).await {
                            if snapshot.version > last_version {
                                last_version = snapshot.version;
                                yield snapshot;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        };

        Ok(Subscription::spawn(source))
    }
}
