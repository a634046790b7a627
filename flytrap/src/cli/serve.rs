//! serve サブコマンド
//!
//! キャプチャ用・照会用の2つのリスナーを起動します。

use clap::Args;
use flytrap_common::config::{
    duration_or_default, get_env_with_fallback, TrapConfig, DEFAULT_CAPTURE_PORT,
    DEFAULT_PRUNE_TICK, DEFAULT_QUERY_PORT, DEFAULT_TTL,
};

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Capture listener port
    #[arg(
        short = 'c',
        long,
        alias = "capturePort",
        default_value_t = DEFAULT_CAPTURE_PORT,
        env = "FLYTRAP_CAPTURE_PORT"
    )]
    pub capture_port: u16,

    /// Query listener port
    #[arg(
        short = 'q',
        long,
        alias = "queryPort",
        default_value_t = DEFAULT_QUERY_PORT,
        env = "FLYTRAP_QUERY_PORT"
    )]
    pub query_port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "FLYTRAP_HOST")]
    pub host: String,

    /// How long an idle path is remembered (eg: 10m, 1h)
    #[arg(short, long, env = "FLYTRAP_TTL")]
    pub ttl: Option<String>,

    /// Prune sweep interval
    #[arg(long, hide = true, env = "FLYTRAP_TICK")]
    pub tick: Option<String>,

    /// Echo the captured request back as the response body
    #[arg(long, default_value_t = false, env = "FLYTRAP_ECHO")]
    pub echo: bool,

    /// Keep only the newest N requests per path
    #[arg(long, env = "FLYTRAP_MAX_RECORDS_PER_PATH")]
    pub max_records_per_path: Option<usize>,
}

impl ServeArgs {
    /// Resolve into a validated [`TrapConfig`].
    ///
    /// Bad durations never fail here; they fall back to the defaults.
    pub fn into_config(self) -> TrapConfig {
        let ttl = self
            .ttl
            .or_else(|| get_env_with_fallback("FLYTRAP_TTL", "HANDLER_TTL"));

        TrapConfig {
            host: self.host,
            capture_port: self.capture_port,
            query_port: self.query_port,
            ttl: duration_or_default("ttl", ttl.as_deref(), DEFAULT_TTL),
            tick: duration_or_default("tick", self.tick.as_deref(), DEFAULT_PRUNE_TICK),
            echo: self.echo,
            max_records_per_path: self.max_records_per_path,
        }
        .normalized()
    }
}
