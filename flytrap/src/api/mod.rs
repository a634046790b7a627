//! HTTP APIハンドラー
//!
//! キャプチャ用と照会用の2つのルーター

pub mod assets;
pub mod capture;
pub mod error;
pub mod query;

use crate::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// キャプチャ用ルーターを作成（全パスをキャプチャ）
pub fn create_capture_router(state: AppState) -> Router {
    Router::new()
        .fallback(capture::capture_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 照会用ルーターを作成
pub fn create_query_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(query::index))
        .route("/health", get(query::health))
        .route("/api/requests", get(query::list_requests))
        .route("/api/paths", get(query::list_paths))
        .route("/favicon.ico", get(assets::favicon))
        .route("/static/*path", get(assets::static_asset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
