//! 照会APIハンドラー
//!
//! HTML画面とJSON API

use super::error::{AppError, PageError};
use crate::query::PathRequests;
use crate::registry::EntrySnapshot;
use crate::view::IndexPage;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use flytrap_common::error::FlytrapError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

/// GET / - キャプチャ一覧画面
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let page = IndexPage {
        capture_port: state.config.capture_port,
        handler_ttl: humantime::format_duration(state.config.ttl).to_string(),
        handler_data: state.query.paths().await,
    };

    state.view.render(&page).map(Html).map_err(|err| {
        error!(error = %err, "Failed to render query view");
        PageError(err)
    })
}

/// `/api/requests` クエリパラメーター
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestsQuery {
    /// 指定した場合はそのパスのみ返す
    pub path: Option<String>,
}

/// GET /api/requests - キャプチャ一覧（JSON）
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestsQuery>,
) -> Result<Json<Vec<PathRequests>>, AppError> {
    match query.path {
        Some(path) => {
            let requests = state
                .query
                .requests_for(&path)
                .await
                .ok_or_else(|| FlytrapError::NotFound(path.clone()))?;
            Ok(Json(vec![PathRequests { path, requests }]))
        }
        None => Ok(Json(state.query.paths().await)),
    }
}

/// GET /api/paths - 追跡中パス一覧
pub async fn list_paths(State(state): State<AppState>) -> Json<Vec<EntrySnapshot>> {
    Json(state.registry.list().await)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "tracked_paths": state.registry.len().await,
    }))
}
