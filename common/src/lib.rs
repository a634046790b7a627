//! Flytrap 共通ライブラリ
//!
//! 設定とエラー型をサーバー本体から切り離して提供する

#![warn(missing_docs)]

/// 設定管理
pub mod config;

/// エラー型定義
pub mod error;
