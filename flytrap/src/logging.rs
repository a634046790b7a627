//! ロギング初期化
//!
//! `FLYTRAP_LOG_LEVEL` → `RUST_LOG` → `info` の順でフィルターを決定する

use flytrap_common::error::{FlytrapError, FlytrapResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログレベル指定の環境変数
pub const LOG_LEVEL_ENV: &str = "FLYTRAP_LOG_LEVEL";

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber.
pub fn init() -> FlytrapResult<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| FlytrapError::Internal(format!("failed to initialize logging: {e}")))
}

fn env_filter() -> EnvFilter {
    let directive = std::env::var(LOG_LEVEL_ENV)
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{directive}' ({e}), using {DEFAULT_FILTER}");
        EnvFilter::new(DEFAULT_FILTER)
    })
}
