//! キャプチャAPIハンドラー
//!
//! キャプチャ用リスナーの全パス・全メソッドを受け付ける

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// キャプチャしたエントリの識別子を返すレスポンスヘッダー
pub const ENTRY_HEADER: HeaderName = HeaderName::from_static("x-flytrap-entry");

/// ANY /* - リクエストをキャプチャ
///
/// 記録が完了してからレスポンスを返す。キャプチャに失敗しても 200 を返す。
pub async fn capture_request(State(state): State<AppState>, request: Request) -> Response {
    let (entry_id, record) = state.capture.capture(request).await;

    let mut response = match record.filter(|_| state.config.echo) {
        Some(record) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            record.bytes(),
        )
            .into_response(),
        None => StatusCode::OK.into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&entry_id.to_string()) {
        response.headers_mut().insert(ENTRY_HEADER, value);
    }
    response
}
