//! 設定管理
//!
//! TrapConfig 設定構造体と、環境変数・期間文字列のヘルパー

use crate::error::CommonError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// キャプチャ用リスナーのデフォルトポート
pub const DEFAULT_CAPTURE_PORT: u16 = 9000;

/// 照会用リスナーのデフォルトポート
pub const DEFAULT_QUERY_PORT: u16 = 9001;

/// 非アクティブなパスを忘れるまでのデフォルトTTL（30分）
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// 古いパスを走査するデフォルト間隔（1分）
pub const DEFAULT_PRUNE_TICK: Duration = Duration::from_secs(60);

/// Parse a duration string such as `10m`, `1h 30m` or `200ms`.
pub fn parse_duration(value: &str) -> Result<Duration, CommonError> {
    humantime::parse_duration(value.trim()).map_err(|e| CommonError::InvalidDuration {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an optional duration, substituting `default` on absence or error.
///
/// Invalid or zero values are never fatal: they are logged at `warn` and the
/// default is used instead.
pub fn duration_or_default(name: &str, raw: Option<&str>, default: Duration) -> Duration {
    let Some(raw) = raw else {
        return default;
    };
    match parse_duration(raw) {
        Ok(d) if d.is_zero() => {
            tracing::warn!(
                "{} must be greater than zero, using default: {}",
                name,
                humantime::format_duration(default)
            );
            default
        }
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(
                "Invalid {} duration ({}), using default: {}. (Use a duration string, eg: 10m)",
                name,
                e,
                humantime::format_duration(default)
            );
            default
        }
    }
}

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Flytrap設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapConfig {
    /// ホストアドレス (デフォルト: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// キャプチャ用ポート (デフォルト: 9000)
    #[serde(default = "default_capture_port")]
    pub capture_port: u16,

    /// 照会用ポート (デフォルト: 9001)
    #[serde(default = "default_query_port")]
    pub query_port: u16,

    /// 非アクティブなパスを保持する期間 (デフォルト: 30m)
    #[serde(
        default = "default_ttl",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_ttl"
    )]
    pub ttl: Duration,

    /// 走査間隔 (デフォルト: 1m)
    #[serde(
        default = "default_tick",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_tick"
    )]
    pub tick: Duration,

    /// キャプチャしたリクエストをレスポンスとして返す (デフォルト: false)
    #[serde(default)]
    pub echo: bool,

    /// パスごとの最大保持件数（未指定なら無制限）
    #[serde(default)]
    pub max_records_per_path: Option<usize>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_capture_port() -> u16 {
    DEFAULT_CAPTURE_PORT
}

fn default_query_port() -> u16 {
    DEFAULT_QUERY_PORT
}

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

fn default_tick() -> Duration {
    DEFAULT_PRUNE_TICK
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            capture_port: default_capture_port(),
            query_port: default_query_port(),
            ttl: default_ttl(),
            tick: default_tick(),
            echo: false,
            max_records_per_path: None,
        }
    }
}

impl TrapConfig {
    /// キャプチャ用リスナーのバインドアドレス
    pub fn capture_addr(&self) -> String {
        format!("{}:{}", self.host, self.capture_port)
    }

    /// 照会用リスナーのバインドアドレス
    pub fn query_addr(&self) -> String {
        format!("{}:{}", self.host, self.query_port)
    }

    /// Fix up values that would break the prune sweep.
    ///
    /// A zero TTL or tick falls back to its default. A tick that is not
    /// smaller than the TTL is shortened to half the TTL so that an idle path
    /// outlives its TTL by at most one tick.
    pub fn normalized(mut self) -> Self {
        if self.ttl.is_zero() {
            tracing::warn!(
                "ttl must be greater than zero, using default: {}",
                humantime::format_duration(DEFAULT_TTL)
            );
            self.ttl = DEFAULT_TTL;
        }
        if self.tick.is_zero() {
            tracing::warn!(
                "tick must be greater than zero, using default: {}",
                humantime::format_duration(DEFAULT_PRUNE_TICK)
            );
            self.tick = DEFAULT_PRUNE_TICK;
        }
        if self.tick >= self.ttl {
            let shortened = (self.ttl / 2).max(Duration::from_millis(1));
            tracing::warn!(
                tick = %humantime::format_duration(self.tick),
                ttl = %humantime::format_duration(self.ttl),
                "Prune tick is not smaller than ttl, using {}",
                humantime::format_duration(shortened)
            );
            self.tick = shortened;
        }
        if self.max_records_per_path == Some(0) {
            tracing::warn!("max_records_per_path must be greater than zero, leaving it unbounded");
            self.max_records_per_path = None;
        }
        self
    }
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_ttl<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(duration_or_default("ttl", Some(&raw), DEFAULT_TTL))
}

fn deserialize_tick<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(duration_or_default("tick", Some(&raw), DEFAULT_PRUNE_TICK))
}
