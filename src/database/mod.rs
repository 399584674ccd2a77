pub mod memory;
pub mod paths;
pub mod pool;
pub mod postgres;

use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How many times a read-check-write is retried after losing a race.
pub const MAX_TRANSACTION_ATTEMPTS: usize = 5;

const SUBSCRIPTION_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: String,
    pub version: u64,
    pub data: JsonValue,
}

impl Snapshot {
    pub fn new(path: impl Into<String>, version: u64, data: JsonValue) -> Self {
        Self {
            path: path.into(),
            version,
            data,
        }
    }

    pub fn id(&self) -> &str {
        paths::document_id(&self.path)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| Error::Store(format!("malformed document {}: {}", self.path, e)))
    }
}

/// Write guard evaluated atomically by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    None,
    Absent,
    Version(u64),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, path: &str) -> Result<Option<Snapshot>>;

    /// Direct children of `collection`, ordered by document id.
    async fn list(&self, collection: &str) -> Result<Vec<Snapshot>>;

    /// Replaces the whole document. A failed precondition yields
    /// `Error::Conflict` and leaves the stored value untouched.
    async fn put(&self, path: &str, data: JsonValue, precondition: Precondition) -> Result<u64>;

    /// Snapshots of one document in commit order, starting with its current value.
    async fn subscribe(&self, path: &str) -> Result<Subscription>;
}

pub type SharedStore = Arc<dyn DocumentStore>;

/// Read-check-write on a single document.
///
/// `apply` sees the current snapshot and returns the replacement value plus an
/// output. The write is conditioned on the version that was read; on conflict
/// the whole cycle reruns. An error from `apply` aborts without writing.
pub async fn transaction<R, F>(store: &dyn DocumentStore, path: &str, mut apply: F) -> Result<(R, u64)>
where
    F: FnMut(Option<&Snapshot>) -> Result<(JsonValue, R)> + Send,
    R: Send,
{
    for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
        let current = store.get(path).await?;
        let (next, output) = apply(current.as_ref())?;
        let precondition = match &current {
            Some(snapshot) => Precondition::Version(snapshot.version),
            None => Precondition::Absent,
        };

        match store.put(path, next, precondition).await {
            Ok(version) => return Ok((output, version)),
            Err(Error::Conflict(_)) => {
                tracing::debug!(path, attempt, "transaction lost a race, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    tracing::warn!(path, "transaction gave up after {} attempts", MAX_TRANSACTION_ATTEMPTS);
    Err(Error::Conflict(path.to_string()))
}

pub async fn get_as<T: DeserializeOwned>(store: &dyn DocumentStore, path: &str) -> Result<T> {
    store
        .get(path)
        .await?
        .ok_or_else(|| Error::NotFound(path.to_string()))?
        .decode()
}

/// A cancellable feed of document snapshots. Dropping it stops the feed.
pub struct Subscription {
    rx: mpsc::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn spawn<S>(source: S) -> Self
    where
        S: Stream<Item = Snapshot> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let task = tokio::spawn(async move {
            futures::pin_mut!(source);
            while let Some(snapshot) = source.next().await {
                if tx.send(snapshot).await.is_err() {
                    break;
                }
            }
        });
        Self { rx, task }
    }

    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    pub async fn recv_as<T: DeserializeOwned>(&mut self) -> Option<Result<T>> {
        self.recv().await.map(|snapshot| snapshot.decode())
    }

    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
