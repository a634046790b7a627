//! 古いパスのプルーナー
//!
//! 一定間隔でレジストリを走査し、TTL以上アクセスのないパスをレジストリと
//! ストアの両方から削除する。

use crate::registry::PathRegistry;
use crate::shutdown::ShutdownController;
use crate::store::SharedStore;
use flytrap_common::config::DEFAULT_PRUNE_TICK;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Periodic TTL sweep over the registry and store.
#[derive(Clone)]
pub struct Pruner {
    registry: PathRegistry,
    store: SharedStore,
    ttl: Duration,
    tick: Duration,
    shutdown: ShutdownController,
}

impl Pruner {
    /// 新しいプルーナーを作成
    pub fn new(registry: PathRegistry, store: SharedStore, ttl: Duration) -> Self {
        Self {
            registry,
            store,
            ttl,
            tick: DEFAULT_PRUNE_TICK,
            shutdown: ShutdownController::default(),
        }
    }

    /// 走査間隔を設定
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// 停止シグナルを設定
    pub fn with_shutdown(mut self, shutdown: ShutdownController) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// バックグラウンドで走査を開始
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.prune_loop().await;
        })
    }

    async fn prune_loop(&self) {
        let mut timer = interval(self.tick);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            ttl = %humantime::format_duration(self.ttl),
            tick = %humantime::format_duration(self.tick),
            "Pruner started"
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.sweep().await;
                }
                _ = self.shutdown.wait() => {
                    info!("Pruner stopped");
                    return;
                }
            }
        }
    }

    /// Run one sweep now. Returns the number of evicted paths.
    pub async fn sweep(&self) -> usize {
        let store = &self.store;
        let evicted = self
            .registry
            .scan_and_evict(self.ttl, |path| async move {
                if !store.delete(&path).await {
                    // キャプチャ失敗のみのパスはログを持たない
                    debug!(path = %path, "No stored requests for evicted path");
                }
            })
            .await;

        if evicted > 0 {
            info!(evicted, "Prune sweep completed");
        }
        evicted
    }
}
