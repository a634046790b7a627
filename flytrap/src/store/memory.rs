//! インメモリストア
//!
//! プロセス終了とともに内容は失われる

use super::{PathVisitor, RequestRecord, RequestStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// `HashMap` backed [`RequestStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    logs: RwLock<HashMap<String, Vec<RequestRecord>>>,
    max_records_per_path: Option<usize>,
}

impl MemoryStore {
    /// 新しいストアを作成（件数無制限）
    pub fn new() -> Self {
        Self::default()
    }

    /// パスごとの保持件数に上限を設定
    ///
    /// 上限を超えた場合は最も古いレコードから破棄する。
    pub fn with_max_records_per_path(mut self, limit: Option<usize>) -> Self {
        self.max_records_per_path = limit.filter(|n| *n > 0);
        self
    }

    #[cfg(test)]
    pub(crate) async fn path_count(&self) -> usize {
        self.logs.read().await.len()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn append(&self, path: &str, record: RequestRecord) {
        let mut logs = self.logs.write().await;
        let log = logs.entry(path.to_string()).or_default();
        log.push(record);

        if let Some(limit) = self.max_records_per_path {
            if log.len() > limit {
                let excess = log.len() - limit;
                log.drain(..excess);
                warn!(path, limit, dropped = excess, "Per-path record limit reached");
            }
        }
    }

    async fn exists(&self, path: &str) -> bool {
        self.logs.read().await.contains_key(path)
    }

    async fn load(&self, path: &str) -> Vec<RequestRecord> {
        self.logs
            .read()
            .await
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    async fn for_each(&self, visitor: &mut PathVisitor<'_>) {
        let logs = self.logs.read().await;
        for (path, records) in logs.iter() {
            if visitor(path, records).is_break() {
                return;
            }
        }
    }

    async fn delete(&self, path: &str) -> bool {
        let removed = self.logs.write().await.remove(path);
        if let Some(records) = &removed {
            debug!(path, records = records.len(), "Store deleting path");
        }
        removed.is_some()
    }
}
