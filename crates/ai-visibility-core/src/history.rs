//! Bounded, persisted history of generated reports.
//!
//! The whole log lives under one key of a [`KvStore`] as a JSON array,
//! newest first. Storage is best-effort: a corrupt value is discarded on
//! [`HistoryStore::load`], and a failed write after
//! [`HistoryStore::record`] is logged while the in-memory log still
//! updates. Neither failure reaches the caller.
//!
//! Several processes may share one store (the HTTP server and a CLI run).
//! [`HistoryStore::record`] re-reads the stored log before prepending, so an
//! entry written by another process in the meantime is kept rather than
//! overwritten. A missing or undecodable stored value leaves the in-memory
//! log as it is.

use chrono::Utc;

use crate::models::{AnalysisResult, HistoryItem, ReportKind};
use crate::store::KvStore;

/// Default maximum number of retained reports.
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// Default storage key of the serialized log.
pub const DEFAULT_STORAGE_KEY: &str = "aiVisibilityHistory";

/// A stored report projected back for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Replay<'a> {
    pub query: &'a str,
    pub kind: ReportKind,
    pub report: &'a AnalysisResult,
}

/// Project a history item for re-display. No I/O.
pub fn replay(item: &HistoryItem) -> Replay<'_> {
    Replay {
        query: &item.query,
        kind: item.kind,
        report: &item.report,
    }
}

pub struct HistoryStore<K> {
    kv: K,
    key: String,
    max_items: usize,
    items: Vec<HistoryItem>,
}

impl<K: KvStore> HistoryStore<K> {
    /// Read the log stored under `key`.
    ///
    /// A missing key yields an empty log. An undecodable value is removed
    /// from the store and also yields an empty log. `max_items` below 1 is
    /// treated as 1.
    pub async fn load(kv: K, key: impl Into<String>, max_items: usize) -> Self {
        let key = key.into();
        let max_items = max_items.max(1);

        let items = match kv.get(&key).await {
            Ok(None) => Vec::new(),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
                Ok(mut items) => {
                    items.truncate(max_items);
                    items
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "discarding corrupt history");
                    if let Err(e) = kv.remove(&key).await {
                        tracing::warn!(key = %key, error = %e, "failed to clear corrupt history");
                    }
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read history");
                Vec::new()
            }
        };

        Self {
            kv,
            key,
            max_items,
            items,
        }
    }

    /// Newest first.
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn find(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Record a freshly generated report, stamped with the current time.
    pub async fn record(
        &mut self,
        report: AnalysisResult,
        query: &str,
        kind: ReportKind,
    ) -> HistoryItem {
        let timestamp = Utc::now().timestamp_millis();
        self.record_at(report, query, kind, timestamp).await
    }

    /// Record with an explicit epoch-millisecond timestamp.
    ///
    /// Picks up the stored log, prepends the item, evicts from the tail
    /// beyond `max_items`, and writes the whole log back.
    pub async fn record_at(
        &mut self,
        report: AnalysisResult,
        query: &str,
        kind: ReportKind,
        timestamp: i64,
    ) -> HistoryItem {
        self.refresh().await;

        let item = HistoryItem {
            id: self.unique_id(query, kind, timestamp),
            query: query.to_string(),
            kind,
            timestamp,
            report,
        };

        self.items.insert(0, item.clone());
        self.items.truncate(self.max_items);
        self.persist().await;

        item
    }

    /// Drop every entry, in memory and in the store.
    pub async fn clear(&mut self) {
        self.items.clear();
        if let Err(e) = self.kv.remove(&self.key).await {
            tracing::warn!(key = %self.key, error = %e, "failed to clear stored history");
        }
    }

    fn unique_id(&self, query: &str, kind: ReportKind, timestamp: i64) -> String {
        let base = format!("{}-{}-{}", query, kind, timestamp);
        if self.find(&base).is_none() {
            return base;
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| self.find(candidate).is_none())
            .unwrap_or(base)
    }

    async fn refresh(&mut self) {
        match self.kv.get(&self.key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
                Ok(mut items) => {
                    items.truncate(self.max_items);
                    self.items = items;
                }
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "ignoring undecodable stored history");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to re-read history");
            }
        }
    }

    async fn persist(&self) {
        let json = match serde_json::to_string(&self.items) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize history");
                return;
            }
        };
        if let Err(e) = self.kv.set(&self.key, &json).await {
            tracing::warn!(key = %self.key, error = %e, "failed to save history");
        }
    }
}
