//! 静的ファイル配信
//!
//! `static/` をバイナリに埋め込んで配信する

use super::error::AppError;
use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};
use flytrap_common::error::FlytrapError;
use include_dir::{include_dir, Dir};

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

/// GET /static/*path
pub async fn static_asset(Path(path): Path<String>) -> Result<Response, AppError> {
    serve_embedded(&path)
}

/// GET /favicon.ico
pub async fn favicon() -> Result<Response, AppError> {
    serve_embedded("favicon.svg")
}

fn serve_embedded(path: &str) -> Result<Response, AppError> {
    let file = STATIC_DIR
        .get_file(path)
        .ok_or_else(|| FlytrapError::NotFound(path.to_string()))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.as_ref())], file.contents()).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_embedded_stylesheet() {
        let response = serve_embedded("css/flytrap.css").unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let err = serve_embedded("css/missing.css").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
