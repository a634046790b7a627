//! 照会ゲートウェイ
//!
//! ストアの読み取り専用ビュー。レジストリには触れず、何も変更しない。

use crate::store::{RequestRecord, SharedStore};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::ControlFlow;

/// A captured request prepared for display, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedRequest {
    /// 表示行
    pub lines: Vec<String>,
}

impl FormattedRequest {
    /// Format a raw record as `Request: <raw>` split on line breaks.
    pub fn from_record(record: &RequestRecord) -> Self {
        let text = format!("Request: {}", record.to_text_lossy());
        let lines = text
            .split('\n')
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        Self { lines }
    }
}

/// パスごとのキャプチャ一覧（表示・JSON用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRequests {
    /// パス
    pub path: String,
    /// 到着順のリクエスト
    pub requests: Vec<FormattedRequest>,
}

/// Read-only presentation view over the request store.
#[derive(Clone)]
pub struct QueryGateway {
    store: SharedStore,
}

impl QueryGateway {
    /// 新しいゲートウェイを作成
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Every stored path with its formatted requests, keyed by path.
    ///
    /// Best effort: captures racing with the enumeration may or may not be
    /// included.
    pub async fn snapshot(&self) -> BTreeMap<String, Vec<FormattedRequest>> {
        // ストアのロック中はコピーのみ行い、整形はロック解放後に行う
        let mut logs: Vec<(String, Vec<RequestRecord>)> = Vec::new();
        self.store
            .for_each(&mut |path: &str, records: &[RequestRecord]| {
                logs.push((path.to_string(), records.to_vec()));
                ControlFlow::Continue(())
            })
            .await;

        logs.into_iter()
            .map(|(path, records)| (path, format_records(&records)))
            .collect()
    }

    /// Formatted requests for a single path, `None` when nothing is stored.
    pub async fn requests_for(&self, path: &str) -> Option<Vec<FormattedRequest>> {
        // ログは追記時にのみ作られるため、空なら未保存と同じ
        let records = self.store.load(path).await;
        if records.is_empty() {
            return None;
        }
        Some(format_records(&records))
    }

    /// [`snapshot`](Self::snapshot) flattened into a path-ordered list.
    pub async fn paths(&self) -> Vec<PathRequests> {
        self.snapshot()
            .await
            .into_iter()
            .map(|(path, requests)| PathRequests { path, requests })
            .collect()
    }
}

fn format_records(records: &[RequestRecord]) -> Vec<FormattedRequest> {
    records.iter().map(FormattedRequest::from_record).collect()
}
