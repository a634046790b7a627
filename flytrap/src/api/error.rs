//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング

use axum::{http::StatusCode, response::IntoResponse, Json};
use flytrap_common::error::FlytrapError;
use serde_json::json;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub FlytrapError);

impl From<FlytrapError> for AppError {
    fn from(err: FlytrapError) -> Self {
        AppError(err)
    }
}

impl AppError {
    /// HTTPステータスコード
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            FlytrapError::Common(_) => StatusCode::BAD_REQUEST,
            FlytrapError::NotFound(_) => StatusCode::NOT_FOUND,
            FlytrapError::Capture { .. }
            | FlytrapError::Render(_)
            | FlytrapError::Bind { .. }
            | FlytrapError::Server(_)
            | FlytrapError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Use external_message() to avoid exposing internal details.
        // Full error details are logged by the handler.
        let payload = json!({
            "error": self.0.external_message()
        });

        (self.status_code(), Json(payload)).into_response()
    }
}

/// HTML画面向けのエラー（本文はプレーンテキスト）
#[derive(Debug)]
pub struct PageError(pub FlytrapError);

impl From<FlytrapError> for PageError {
    fn from(err: FlytrapError) -> Self {
        PageError(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> axum::response::Response {
        let status = AppError(self.0).status_code();
        let message = status.canonical_reason().unwrap_or("Error");
        (status, message).into_response()
    }
}
