//! パス登録管理
//!
//! 追跡中のパスとその最終アクセス時刻をメモリ内で管理する。
//! あるパスが現在追跡中かどうかの唯一の情報源。
//!
//! キャプチャは [`CaptureLease`]（共有ロック）を保持したままストアへ書き込み、
//! 退避は排他ロックを保持したままストアを削除する。これにより、退避済みの
//! エントリに書き込まれた孤立ログは生じない。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

type EntryMap = HashMap<String, Arc<CaptureEntry>>;

/// 追跡中のパス1件分のメタデータ
#[derive(Debug)]
pub struct CaptureEntry {
    path: String,
    id: Uuid,
    created_at: DateTime<Utc>,
    created: Instant,
    /// `created` からの経過ナノ秒。単調増加。
    last_accessed_nanos: AtomicU64,
}

impl CaptureEntry {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            created: Instant::now(),
            last_accessed_nanos: AtomicU64::new(0),
        }
    }

    /// パス
    pub fn path(&self) -> &str {
        &self.path
    }

    /// エントリ識別子
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 最終アクセス時刻
    pub fn last_accessed(&self) -> Instant {
        self.created + Duration::from_nanos(self.last_accessed_nanos.load(Ordering::Acquire))
    }

    /// `now` 時点での非アクティブ期間
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_accessed())
    }

    fn touch_at(&self, now: Instant) {
        let offset = now.saturating_duration_since(self.created).as_nanos();
        let offset = u64::try_from(offset).unwrap_or(u64::MAX);
        self.last_accessed_nanos.fetch_max(offset, Ordering::AcqRel);
    }

    fn snapshot(&self, now: Instant) -> EntrySnapshot {
        EntrySnapshot {
            path: self.path.clone(),
            id: self.id,
            created_at: self.created_at,
            idle_ms: saturating_millis(self.idle_for(now)),
        }
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// API・テスト向けのエントリ情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySnapshot {
    /// パス
    pub path: String,
    /// エントリ識別子
    pub id: Uuid,
    /// 作成時刻
    pub created_at: DateTime<Utc>,
    /// 最終アクセスからの経過ミリ秒
    pub idle_ms: u64,
}

/// A capture's hold on a registry entry.
///
/// While a lease is alive the entry cannot be evicted. Drop it as soon as the
/// record has been stored.
pub struct CaptureLease {
    entry: Arc<CaptureEntry>,
    created: bool,
    _guard: OwnedRwLockReadGuard<EntryMap>,
}

impl CaptureLease {
    /// Whether this lease's request created the entry
    pub fn is_new(&self) -> bool {
        self.created
    }
}

impl Deref for CaptureLease {
    type Target = CaptureEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

/// パスレジストリ
#[derive(Clone, Default)]
pub struct PathRegistry {
    entries: Arc<RwLock<EntryMap>>,
}

impl PathRegistry {
    /// 新しいレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `path`, creating it on first sight.
    ///
    /// Concurrent first requests for the same path all receive the same
    /// entry.
    pub async fn get_or_create(&self, path: &str) -> CaptureLease {
        let guard = self.entries.clone().read_owned().await;
        if let Some(entry) = guard.get(path).cloned() {
            return CaptureLease {
                entry,
                created: false,
                _guard: guard,
            };
        }
        drop(guard);

        let mut guard = self.entries.clone().write_owned().await;
        let (entry, created) = match guard.entry(path.to_string()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), false),
            Entry::Vacant(vacant) => (vacant.insert(Arc::new(CaptureEntry::new(path))).clone(), true),
        };
        if created {
            info!(path, entry_id = %entry.id, "Tracking new path");
        }

        CaptureLease {
            entry,
            created,
            _guard: guard.downgrade(),
        }
    }

    /// 最終アクセス時刻を現在時刻に更新（巻き戻りはしない）
    pub fn touch(&self, entry: &CaptureEntry) {
        entry.touch_at(Instant::now());
    }

    /// Evict every entry idle for at least `ttl`.
    ///
    /// Idleness is measured against a single instant taken at scan start.
    /// `on_evict` runs for each evicted path while the registry is still
    /// exclusively locked. Returns the number of evicted entries.
    pub async fn scan_and_evict<F, Fut>(&self, ttl: Duration, mut on_evict: F) -> usize
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut entries = self.entries.write().await;
        let scan_start = Instant::now();

        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.idle_for(scan_start) >= ttl)
            .map(|(path, _)| path.clone())
            .collect();

        for path in &stale {
            if let Some(entry) = entries.remove(path) {
                info!(
                    path = %path,
                    entry_id = %entry.id,
                    age_ms = saturating_millis(entry.idle_for(scan_start)),
                    "Pruning idle path"
                );
                on_evict(path.clone()).await;
            }
        }

        stale.len()
    }

    /// パスが追跡中かどうか
    pub async fn contains(&self, path: &str) -> bool {
        self.entries.read().await.contains_key(path)
    }

    /// エントリ情報を取得
    pub async fn get(&self, path: &str) -> Option<EntrySnapshot> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(path)
            .map(|entry| entry.snapshot(now))
    }

    /// 全エントリ情報を取得（パス順）
    pub async fn list(&self) -> Vec<EntrySnapshot> {
        let now = Instant::now();
        let mut snapshots: Vec<EntrySnapshot> = self
            .entries
            .read()
            .await
            .values()
            .map(|entry| entry.snapshot(now))
            .collect();
        snapshots.sort_by(|a, b| a.path.cmp(&b.path));
        snapshots
    }

    /// 追跡中のパス数
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 追跡中のパスがないかどうか
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RequestRecord, RequestStore};

    #[tokio::test]
    async fn test_get_or_create_new_path() {
        let registry = PathRegistry::new();

        let lease = registry.get_or_create("/a").await;
        assert!(lease.is_new());
        assert_eq!(lease.path(), "/a");
        drop(lease);

        assert!(registry.contains("/a").await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_existing_path() {
        let registry = PathRegistry::new();

        let first = registry.get_or_create("/a").await;
        let first_id = first.id();
        drop(first);

        let second = registry.get_or_create("/a").await;
        assert!(!second.is_new());
        assert_eq!(second.id(), first_id);
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_share_one_entry() {
        let registry = PathRegistry::new();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let lease = registry.get_or_create("/race").await;
                (lease.id(), lease.is_new())
            }));
        }

        let mut ids = Vec::new();
        let mut creators = 0;
        for handle in handles {
            let (id, created) = handle.await.unwrap();
            ids.push(id);
            if created {
                creators += 1;
            }
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(creators, 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_is_monotonic() {
        let registry = PathRegistry::new();
        let lease = registry.get_or_create("/a").await;
        let created = lease.last_accessed();

        tokio::time::advance(Duration::from_millis(40)).await;
        registry.touch(&lease);
        let touched = lease.last_accessed();
        assert_eq!(touched - created, Duration::from_millis(40));

        // 過去の時刻での更新は無視される
        lease.touch_at(created);
        assert_eq!(lease.last_accessed(), touched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_and_evict_removes_stale_entries() {
        let registry = PathRegistry::new();
        drop(registry.get_or_create("/old").await);

        tokio::time::advance(Duration::from_millis(150)).await;
        drop(registry.get_or_create("/fresh").await);

        tokio::time::advance(Duration::from_millis(60)).await;
        let mut evicted = Vec::new();
        let count = registry
            .scan_and_evict(Duration::from_millis(200), |path| {
                evicted.push(path);
                async {}
            })
            .await;

        assert_eq!(count, 1);
        assert_eq!(evicted, vec!["/old".to_string()]);
        assert!(!registry.contains("/old").await);
        assert!(registry.contains("/fresh").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_extends_lifetime() {
        let registry = PathRegistry::new();
        let lease = registry.get_or_create("/live").await;
        tokio::time::advance(Duration::from_millis(150)).await;
        registry.touch(&lease);
        drop(lease);

        tokio::time::advance(Duration::from_millis(100)).await;
        let count = registry
            .scan_and_evict(Duration::from_millis(200), |_| async {})
            .await;

        assert_eq!(count, 0);
        assert_eq!(registry.get("/live").await.unwrap().idle_ms, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicted_path_is_recreated_with_new_identity() {
        let registry = PathRegistry::new();
        let first_id = registry.get_or_create("/again").await.id();

        tokio::time::advance(Duration::from_secs(1)).await;
        registry
            .scan_and_evict(Duration::from_millis(500), |_| async {})
            .await;
        assert!(registry.is_empty().await);

        let lease = registry.get_or_create("/again").await;
        assert!(lease.is_new());
        assert_ne!(lease.id(), first_id);
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_held_lease_blocks_eviction() {
        let registry = PathRegistry::new();
        let store = Arc::new(MemoryStore::new());
        let ttl = Duration::from_millis(200);

        drop(registry.get_or_create("/x").await);
        tokio::time::sleep(Duration::from_millis(250)).await;

        // 期限切れのパスに対するキャプチャが進行中
        let lease = registry.get_or_create("/x").await;
        let sweep = {
            let registry = registry.clone();
            let store = store.clone();
            tokio::spawn(async move {
                registry
                    .scan_and_evict(ttl, |path| {
                        let store = store.clone();
                        async move {
                            store.delete(&path).await;
                        }
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!sweep.is_finished());

        store.append("/x", RequestRecord::new("GET /x HTTP/1.1\r\n\r\n")).await;
        registry.touch(&lease);
        drop(lease);

        let evicted = tokio::time::timeout(Duration::from_secs(2), sweep)
            .await
            .expect("sweep did not finish")
            .unwrap();

        assert_eq!(evicted, 0);
        assert!(registry.contains("/x").await);
        assert_eq!(store.load("/x").await.len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_path() {
        let registry = PathRegistry::new();
        for path in ["/c", "/a", "/b"] {
            drop(registry.get_or_create(path).await);
        }

        let paths: Vec<String> = registry.list().await.into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }
}
