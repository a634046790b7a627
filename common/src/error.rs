//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! `FlytrapError::external_message()` はクライアント向けの安全なメッセージを返す。
//! 詳細は `Display` 実装（`to_string()`）経由でサーバーログにのみ出力する。

use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Duration string could not be parsed
    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration {
        /// The rejected input
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Flytrap error type
#[derive(Debug, Error)]
pub enum FlytrapError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// The inbound request could not be turned into a record
    #[error("Capture failed for {path}: {reason}")]
    Capture {
        /// Request path
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// Query view rendering failed
    #[error("Render error: {0}")]
    Render(String),

    /// Listener bind failure
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested bind address
        addr: String,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// A listener stopped with an I/O error
    #[error("Server error: {0}")]
    Server(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlytrapError {
    /// Returns a safe error message for external clients.
    ///
    /// Paths, addresses and parser output stay in the server log.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::Common(_) => "Request error",
            Self::Capture { .. } => "Capture failed",
            Self::Render(_) => "Internal Server Error",
            Self::Bind { .. } => "Internal Server Error",
            Self::Server(_) => "Internal Server Error",
            Self::NotFound(_) => "Not found",
            Self::Internal(_) => "Internal Server Error",
        }
    }
}

/// Flytrap result type
pub type FlytrapResult<T> = Result<T, FlytrapError>;
