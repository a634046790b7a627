//! 照会画面のHTMLレンダリング（tera）

use crate::query::PathRequests;
use flytrap_common::error::{FlytrapError, FlytrapResult};
use serde::Serialize;
use std::sync::Arc;
use tera::{Context, Tera};

const LAYOUT_TEMPLATE: &str = "layout.html";
const LAYOUT_SOURCE: &str = include_str!("../templates/layout.html");

/// Data handed to the layout template
#[derive(Debug, Clone, Serialize)]
pub struct IndexPage {
    /// キャプチャ用ポート
    pub capture_port: u16,
    /// TTL（表示用）
    pub handler_ttl: String,
    /// 追跡中パスとキャプチャ
    pub handler_data: Vec<PathRequests>,
}

/// Compiled query view templates.
#[derive(Clone)]
pub struct QueryView {
    tera: Arc<Tera>,
    template: String,
}

impl QueryView {
    /// 組み込みテンプレートで作成
    pub fn new() -> FlytrapResult<Self> {
        Self::with_template(LAYOUT_TEMPLATE, LAYOUT_SOURCE)
    }

    /// Build from a custom template source.
    ///
    /// Names ending in `.html` get HTML auto-escaping.
    pub fn with_template(name: &str, source: &str) -> FlytrapResult<Self> {
        let mut tera = Tera::default();
        tera.set_escape_fn(escape_markup);
        tera.add_raw_template(name, source)
            .map_err(|e| FlytrapError::Render(render_error_detail(&e)))?;
        Ok(Self {
            tera: Arc::new(tera),
            template: name.to_string(),
        })
    }

    /// ページをレンダリング
    pub fn render(&self, page: &IndexPage) -> FlytrapResult<String> {
        let context =
            Context::from_serialize(page).map_err(|e| FlytrapError::Render(e.to_string()))?;
        self.tera
            .render(&self.template, &context)
            .map_err(|e| FlytrapError::Render(render_error_detail(&e)))
    }
}

/// HTML escaping that leaves `/` readable in captured request lines.
fn escape_markup(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// tera errors nest the useful part in their source chain.
fn render_error_detail(err: &tera::Error) -> String {
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FormattedRequest;

    fn page() -> IndexPage {
        IndexPage {
            capture_port: 9000,
            handler_ttl: "30m".to_string(),
            handler_data: vec![PathRequests {
                path: "/hooks/<script>".to_string(),
                requests: vec![FormattedRequest {
                    lines: vec![
                        "Request: GET /hooks HTTP/1.1".to_string(),
                        "Host: trap".to_string(),
                    ],
                }],
            }],
        }
    }

    #[test]
    fn test_render_layout() {
        let view = QueryView::new().unwrap();
        let html = view.render(&page()).unwrap();

        assert!(html.contains("Request: GET /hooks HTTP/1.1"));
        assert!(html.contains(":9000"));
        assert!(html.contains("30m"));
        // パスはエスケープされる
        assert!(html.contains("/hooks/&lt;script&gt;"));
        assert!(!html.contains("/hooks/<script>"));
    }

    #[test]
    fn test_render_empty_page() {
        let view = QueryView::new().unwrap();
        let html = view
            .render(&IndexPage {
                capture_port: 9000,
                handler_ttl: "30m".to_string(),
                handler_data: Vec::new(),
            })
            .unwrap();

        assert!(html.contains("No requests captured yet"));
    }

    #[test]
    fn test_render_failure_is_reported() {
        let view = QueryView::with_template("broken.html", "{{ missing.field }}").unwrap();
        let err = view.render(&page()).unwrap_err();
        assert!(matches!(err, FlytrapError::Render(_)));
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let result = QueryView::with_template("bad.html", "{% for %}");
        assert!(matches!(result, Err(FlytrapError::Render(_))));
    }
}
