//! Flytrap Server
//!
//! 任意のパスへのHTTPリクエストをキャプチャし、アクセスが途絶えたパスを忘れるサーバー

#![warn(missing_docs)]

/// HTTP APIハンドラー
pub mod api;

/// リクエストキャプチャ
pub mod capture;

/// CLIインターフェース
pub mod cli;

/// ロギング初期化ユーティリティ
pub mod logging;

/// 古いパスのプルーナー
pub mod pruner;

/// 照会ゲートウェイ
pub mod query;

/// パスレジストリ
pub mod registry;

/// サーバー起動・シャットダウンハンドリング
pub mod server;

/// Graceful shutdown coordination
pub mod shutdown;

/// リクエストストア
pub mod store;

/// 照会画面レンダリング
pub mod view;

use capture::CaptureEndpoint;
use flytrap_common::config::TrapConfig;
use flytrap_common::error::FlytrapResult;
use pruner::Pruner;
use query::QueryGateway;
use registry::PathRegistry;
use shutdown::ShutdownController;
use std::sync::Arc;
use store::{MemoryStore, SharedStore};
use view::QueryView;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// 設定
    pub config: Arc<TrapConfig>,
    /// パスレジストリ
    pub registry: PathRegistry,
    /// リクエストストア
    pub store: SharedStore,
    /// キャプチャエンドポイント
    pub capture: CaptureEndpoint,
    /// 照会ゲートウェイ
    pub query: QueryGateway,
    /// 照会画面
    pub view: QueryView,
    /// シャットダウン制御
    pub shutdown: ShutdownController,
}

impl AppState {
    /// インメモリストアで状態を構築
    pub fn new(config: TrapConfig) -> FlytrapResult<Self> {
        let store = MemoryStore::new().with_max_records_per_path(config.max_records_per_path);
        Self::with_store(config, Arc::new(store))
    }

    /// Build state around an existing store.
    pub fn with_store(config: TrapConfig, store: SharedStore) -> FlytrapResult<Self> {
        let registry = PathRegistry::new();
        Ok(Self {
            config: Arc::new(config),
            capture: CaptureEndpoint::new(registry.clone(), store.clone()),
            query: QueryGateway::new(store.clone()),
            view: QueryView::new()?,
            registry,
            store,
            shutdown: ShutdownController::default(),
        })
    }

    /// 設定済みのプルーナーを作成（未起動）
    pub fn pruner(&self) -> Pruner {
        Pruner::new(self.registry.clone(), self.store.clone(), self.config.ttl)
            .with_tick(self.config.tick)
            .with_shutdown(self.shutdown.clone())
    }
}
