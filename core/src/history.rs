//! History storage: a bounded, newest-first record of past exchanges.
//!
//! # Design
//! Callers only see `list` and `append`. `MemoryHistory` owns its entries
//! behind one lock; appending and truncating to the cap happen under the same
//! write guard, so concurrent appends can neither lose entries nor leave the
//! store above its cap. Order is established when reading: entries sort by
//! descending timestamp, ties by descending insertion sequence.
//! `RemoteHistory` honours the same contract over the history endpoints.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::client::HistoryClient;
use crate::error::HistoryError;
use crate::transport::Transport;
use crate::types::{fresh_id, HistoryDraft, HistoryEntry, RequestSpec};

pub const DEFAULT_HISTORY_CAP: usize = 50;

#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Every retained entry, newest first.
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Stores `draft`, assigning its id and timestamp.
    async fn append(&self, draft: HistoryDraft) -> Result<HistoryEntry, HistoryError>;
}

#[async_trait]
impl<H: HistoryBackend + ?Sized> HistoryBackend for Arc<H> {
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        (**self).list().await
    }

    async fn append(&self, draft: HistoryDraft) -> Result<HistoryEntry, HistoryError> {
        (**self).append(draft).await
    }
}

/// Process-lifetime history store.
#[derive(Debug)]
pub struct MemoryHistory {
    cap: usize,
    ledger: RwLock<Ledger>,
}

#[derive(Debug, Default)]
struct Ledger {
    entries: VecDeque<Stored>,
    next_seq: u64,
    last_timestamp: i64,
}

#[derive(Debug)]
struct Stored {
    seq: u64,
    entry: HistoryEntry,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }

    /// A store retaining at most `cap` entries (at least one).
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            ledger: RwLock::new(Ledger::default()),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub async fn len(&self) -> usize {
        self.ledger.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl HistoryBackend for MemoryHistory {
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let ledger = self.ledger.read().await;
        let mut stored: Vec<&Stored> = ledger.entries.iter().collect();
        stored.sort_by(|a, b| {
            b.entry
                .timestamp
                .cmp(&a.entry.timestamp)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(stored.into_iter().map(|s| s.entry.clone()).collect())
    }

    async fn append(&self, draft: HistoryDraft) -> Result<HistoryEntry, HistoryError> {
        let (url, method) = match (draft.url, draft.method) {
            (Some(url), Some(method)) if !url.is_empty() => (url, method),
            _ => return Err(HistoryError::MissingFields),
        };

        let mut ledger = self.ledger.write().await;
        // Strictly increasing, even for appends within the same millisecond.
        let timestamp = now_ms().max(ledger.last_timestamp + 1);
        ledger.last_timestamp = timestamp;
        let seq = ledger.next_seq;
        ledger.next_seq += 1;

        let entry = HistoryEntry {
            id: fresh_id(),
            timestamp,
            request: RequestSpec {
                url,
                method,
                headers: draft.headers,
                body: draft.body,
            },
            response_summary: draft.response_summary,
        };
        ledger.entries.push_back(Stored {
            seq,
            entry: entry.clone(),
        });
        while ledger.entries.len() > self.cap {
            ledger.entries.pop_front();
        }

        info!(id = %entry.id, method = %entry.request.method, url = %entry.request.url, "history entry stored");
        Ok(entry)
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// History kept by a remote history service.
#[derive(Debug, Clone)]
pub struct RemoteHistory<T> {
    client: HistoryClient,
    transport: T,
}

impl<T: Transport> RemoteHistory<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            client: HistoryClient::new(base_url),
            transport,
        }
    }
}

#[async_trait]
impl<T: Transport> HistoryBackend for RemoteHistory<T> {
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let request = self.client.build_list_history();
        let response = self.transport.execute(request).await?;
        self.client.parse_list_history(response)
    }

    async fn append(&self, draft: HistoryDraft) -> Result<HistoryEntry, HistoryError> {
        let request = self.client.build_append_history(&draft)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_append_history(response)
    }
}
