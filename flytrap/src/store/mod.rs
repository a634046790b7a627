//! リクエストストア
//!
//! パスごとにキャプチャした生リクエストを到着順に保持する。
//! 退避（eviction）ロジックは持たず、削除はプルーナーからのみ呼ばれる。

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use std::borrow::Cow;
use std::ops::ControlFlow;
use std::sync::Arc;

/// One captured request exactly as it was serialized at capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord(Bytes);

impl RequestRecord {
    /// Wrap raw request bytes.
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self(raw.into())
    }

    /// Cheap handle to the underlying buffer
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Byte length of the record
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text view for display; invalid UTF-8 is replaced.
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

/// Visitor passed to [`RequestStore::for_each`].
///
/// Returning `ControlFlow::Break(())` stops the enumeration.
pub type PathVisitor<'a> = dyn FnMut(&str, &[RequestRecord]) -> ControlFlow<()> + Send + 'a;

/// Storage backend for captured requests.
///
/// Only the path registry's eviction callback deletes; everything else
/// appends or reads.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Append `record` to the log of `path`, creating the log if needed.
    async fn append(&self, path: &str, record: RequestRecord);

    /// Whether a log exists for `path`.
    async fn exists(&self, path: &str) -> bool;

    /// Copy of the log for `path` in arrival order (empty if absent).
    async fn load(&self, path: &str) -> Vec<RequestRecord>;

    /// Visit every `(path, log)` pair in an unspecified order.
    async fn for_each(&self, visitor: &mut PathVisitor<'_>);

    /// Remove the log for `path`; returns whether anything was removed.
    async fn delete(&self, path: &str) -> bool;
}

/// Store handle shared between the capture, query and prune workers
pub type SharedStore = Arc<dyn RequestStore>;
