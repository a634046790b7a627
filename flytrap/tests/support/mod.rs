//! テスト共通ユーティリティ

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use flytrap::AppState;
use flytrap_common::config::TrapConfig;
use tower::ServiceExt;

/// ルーターへの1リクエストの結果
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }
}

/// デフォルト設定のアプリケーション状態
pub fn test_state() -> AppState {
    AppState::new(TrapConfig::default()).expect("state")
}

/// TTLと走査間隔を指定したアプリケーション状態
pub fn test_state_with_ttl(ttl: Duration, tick: Duration) -> AppState {
    AppState::new(TrapConfig {
        ttl,
        tick,
        ..TrapConfig::default()
    })
    .expect("state")
}

pub async fn send(router: &Router, method: Method, uri: &str, body: &str) -> Reply {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "flytrap.test")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    Reply {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str) -> Reply {
    send(router, Method::GET, uri, "").await
}
