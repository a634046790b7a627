//! リクエストキャプチャ
//!
//! 受信したリクエストを生のHTTP/1.x形式へ直列化し、パスごとのログへ記録する。

use crate::registry::PathRegistry;
use crate::store::{RequestRecord, SharedStore};
use axum::body::Body;
use axum::http::{HeaderName, Request};
use bytes::{BufMut, BytesMut};
use chrono::Utc;
use flytrap_common::error::{FlytrapError, FlytrapResult};
use tracing::{debug, warn};
use uuid::Uuid;

/// キャプチャ時刻を記録するヘッダー名
pub const RECV_TIMESTAMP_HEADER: &str = "X-Recv-Timestamp";

/// Serialize a request into its raw HTTP/1.x form.
///
/// The whole body is buffered. A body that fails mid-stream (for example a
/// client disconnect) is reported as [`FlytrapError::Capture`].
pub async fn dump_request(request: Request<Body>) -> FlytrapResult<RequestRecord> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| FlytrapError::Capture {
            path,
            reason: e.to_string(),
        })?;

    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut raw = BytesMut::with_capacity(256 + body.len());
    raw.put_slice(format!("{} {} {:?}\r\n", parts.method, target, parts.version).as_bytes());
    for (name, value) in parts.headers.iter() {
        raw.put_slice(canonical_header_name(name).as_bytes());
        raw.put_slice(b": ");
        raw.put_slice(value.as_bytes());
        raw.put_slice(b"\r\n");
    }
    raw.put_slice(
        format!(
            "{}: {}\r\n",
            RECV_TIMESTAMP_HEADER,
            Utc::now().format("%b %e %H:%M:%S%.3f")
        )
        .as_bytes(),
    );
    raw.put_slice(b"\r\n");
    raw.put_slice(&body);

    Ok(RequestRecord::new(raw.freeze()))
}

/// `content-type` -> `Content-Type`
fn canonical_header_name(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Records inbound requests against their path.
#[derive(Clone)]
pub struct CaptureEndpoint {
    registry: PathRegistry,
    store: SharedStore,
}

impl CaptureEndpoint {
    /// 新しいキャプチャエンドポイントを作成
    pub fn new(registry: PathRegistry, store: SharedStore) -> Self {
        Self { registry, store }
    }

    /// Record one request for `path` and return the entry identity.
    ///
    /// The entry is created or refreshed even when `record` is an error; only
    /// the store append is skipped. Never fails.
    pub async fn record(&self, path: &str, record: FlytrapResult<RequestRecord>) -> Uuid {
        let lease = self.registry.get_or_create(path).await;

        match record {
            Ok(record) => {
                debug!(
                    path,
                    entry_id = %lease.id(),
                    new_path = lease.is_new(),
                    bytes = record.len(),
                    "Captured request"
                );
                self.store.append(path, record).await;
            }
            Err(err) => {
                warn!(path, entry_id = %lease.id(), error = %err, "Skipping capture");
            }
        }

        self.registry.touch(&lease);
        lease.id()
    }

    /// Serialize `request` and record it under its URI path.
    pub async fn capture(&self, request: Request<Body>) -> (Uuid, Option<RequestRecord>) {
        let path = request.uri().path().to_string();
        let record = dump_request(request).await;
        let echo = record.as_ref().ok().cloned();
        let entry_id = self.record(&path, record).await;
        (entry_id, echo)
    }
}
