//! 環境変数から読み込むサービス設定
//!
//! 起動時に一度だけ読み込み、サーバー起動前に検証する。
//! 値が解釈できない場合は起動エラーとする（黙ってデフォルトに戻さない）。
//!
//! ## 共通
//!
//! - `DATABASE_URL` - 設定されていればPostgreSQLに保存、なければインメモリ
//! - `DB_MAX_CONNECTIONS` - コネクションプールの上限（デフォルト: 5）
//! - `SEED_DATA` - 起動時にサンプルデータを投入するか（デフォルト: true）
//! - `LOG_FORMAT` - `text` または `json`（デフォルト: `text`）
//!
//! ## book-service
//!
//! - `BOOK_SERVICE_LISTEN` - 待ち受けアドレス（デフォルト: `0.0.0.0:8081`）
//!
//! ## subscription-service
//!
//! - `SUBSCRIPTION_SERVICE_LISTEN` - 待ち受けアドレス（デフォルト: `0.0.0.0:8082`）
//! - `BOOK_SERVICE_URL` - 在庫サービスのベースURL（デフォルト: `http://localhost:8081`）
//! - `BOOK_SERVICE_CONNECT_TIMEOUT_SECS` - 接続タイムアウト（デフォルト: 5）
//! - `BOOK_SERVICE_READ_TIMEOUT_SECS` - 応答タイムアウト（デフォルト: 10）
//! - `BREAKER_FAILURE_RATE_THRESHOLD` - Openに遷移する失敗率%（デフォルト: 50）
//! - `BREAKER_SLIDING_WINDOW_SIZE` - 件数ベースのウィンドウサイズ（デフォルト: 10）
//! - `BREAKER_SLIDING_WINDOW_SECS` - 設定すると時間ベースのウィンドウを使う
//! - `BREAKER_MINIMUM_CALLS` - 評価に必要な最小呼び出し数（デフォルト: 5）
//! - `BREAKER_WAIT_DURATION_SECS` - Open状態の待機時間（デフォルト: 10）
//! - `BREAKER_HALF_OPEN_CALLS` - Half-Open中の試行呼び出し数（デフォルト: 3）

use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::circuit_breaker::{CircuitBreakerConfig, SlidingWindow};

/// ログの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// 保存先とサンプルデータの設定（両サービス共通）
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub seed_data: bool,
}

/// book-serviceの設定
#[derive(Debug, Clone, PartialEq)]
pub struct BookServiceConfig {
    pub listen_addr: SocketAddr,
    pub storage: StorageConfig,
    pub log_format: LogFormat,
}

/// subscription-serviceの設定
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionServiceConfig {
    pub listen_addr: SocketAddr,
    pub storage: StorageConfig,
    pub log_format: LogFormat,
    pub book_service_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl BookServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            listen_addr: parse_or(
                &lookup,
                "BOOK_SERVICE_LISTEN",
                "0.0.0.0:8081".parse::<SocketAddr>()?,
            )?,
            storage: StorageConfig::from_lookup(&lookup)?,
            log_format: log_format(&lookup)?,
        })
    }
}

impl SubscriptionServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let book_service_url = lookup("BOOK_SERVICE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| "http://localhost:8081".to_string());

        let connect_timeout = secs(&lookup, "BOOK_SERVICE_CONNECT_TIMEOUT_SECS", 5)?;
        let read_timeout = secs(&lookup, "BOOK_SERVICE_READ_TIMEOUT_SECS", 10)?;

        Ok(Self {
            listen_addr: parse_or(
                &lookup,
                "SUBSCRIPTION_SERVICE_LISTEN",
                "0.0.0.0:8082".parse::<SocketAddr>()?,
            )?,
            storage: StorageConfig::from_lookup(&lookup)?,
            log_format: log_format(&lookup)?,
            book_service_url,
            connect_timeout,
            read_timeout,
            circuit_breaker: circuit_breaker(&lookup)?,
        })
    }
}

impl StorageConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let seed_data = match lookup("SEED_DATA") {
            None => true,
            Some(v) => {
                parse_bool(&v).with_context(|| format!("SEED_DATA: invalid value {v:?}"))?
            }
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: parse_or(lookup, "DB_MAX_CONNECTIONS", 5)?,
            seed_data,
        })
    }
}

fn circuit_breaker(lookup: &impl Fn(&str) -> Option<String>) -> Result<CircuitBreakerConfig> {
    let defaults = CircuitBreakerConfig::default();

    let sliding_window = match lookup("BREAKER_SLIDING_WINDOW_SECS") {
        Some(_) => SlidingWindow::TimeBased(secs(lookup, "BREAKER_SLIDING_WINDOW_SECS", 0)?),
        None => SlidingWindow::CountBased(parse_or(lookup, "BREAKER_SLIDING_WINDOW_SIZE", 10)?),
    };

    let config = CircuitBreakerConfig {
        failure_rate_threshold: parse_or(
            lookup,
            "BREAKER_FAILURE_RATE_THRESHOLD",
            defaults.failure_rate_threshold,
        )?,
        sliding_window,
        minimum_number_of_calls: parse_or(
            lookup,
            "BREAKER_MINIMUM_CALLS",
            defaults.minimum_number_of_calls,
        )?,
        wait_duration_in_open_state: secs(
            lookup,
            "BREAKER_WAIT_DURATION_SECS",
            defaults.wait_duration_in_open_state.as_secs(),
        )?,
        permitted_calls_in_half_open_state: parse_or(
            lookup,
            "BREAKER_HALF_OPEN_CALLS",
            defaults.permitted_calls_in_half_open_state,
        )?,
    };

    config
        .validate()
        .context("Invalid circuit breaker configuration")?;

    Ok(config)
}

fn log_format(lookup: &impl Fn(&str) -> Option<String>) -> Result<LogFormat> {
    match lookup("LOG_FORMAT").as_deref().map(str::trim) {
        None | Some("") | Some("text") => Ok(LogFormat::Text),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(anyhow!(
            "LOG_FORMAT must be 'text' or 'json', got {other:?}"
        )),
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key}: invalid value {raw:?}")),
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    parse_or(lookup, key, default).map(Duration::from_secs)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(anyhow!("expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitBreakerConfigError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_subscription_defaults() {
        let config = SubscriptionServiceConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(
            config.listen_addr,
            "0.0.0.0:8082".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.book_service_url, "http://localhost:8081");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.circuit_breaker, CircuitBreakerConfig::default());
        assert_eq!(config.storage.database_url, None);
        assert!(config.storage.seed_data);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_book_defaults() {
        let config = BookServiceConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(
            config.listen_addr,
            "0.0.0.0:8081".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.storage.db_max_connections, 5);
    }

    #[test]
    fn test_breaker_overrides() {
        let config = SubscriptionServiceConfig::from_lookup(lookup_from(&[
            ("BREAKER_FAILURE_RATE_THRESHOLD", "25"),
            ("BREAKER_SLIDING_WINDOW_SIZE", "4"),
            ("BREAKER_MINIMUM_CALLS", "2"),
            ("BREAKER_WAIT_DURATION_SECS", "30"),
            ("BREAKER_HALF_OPEN_CALLS", "1"),
        ]))
        .unwrap();

        let breaker = config.circuit_breaker;
        assert_eq!(breaker.failure_rate_threshold, 25.0);
        assert_eq!(breaker.sliding_window, SlidingWindow::CountBased(4));
        assert_eq!(breaker.minimum_number_of_calls, 2);
        assert_eq!(breaker.wait_duration_in_open_state, Duration::from_secs(30));
        assert_eq!(breaker.permitted_calls_in_half_open_state, 1);
    }

    #[test]
    fn test_time_based_window_when_seconds_given() {
        let config = SubscriptionServiceConfig::from_lookup(lookup_from(&[(
            "BREAKER_SLIDING_WINDOW_SECS",
            "60",
        )]))
        .unwrap();

        assert_eq!(
            config.circuit_breaker.sliding_window,
            SlidingWindow::TimeBased(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_unparseable_value_is_an_error() {
        let err = SubscriptionServiceConfig::from_lookup(lookup_from(&[(
            "BREAKER_MINIMUM_CALLS",
            "five",
        )]))
        .unwrap_err();

        assert!(err.to_string().contains("BREAKER_MINIMUM_CALLS"));
    }

    #[test]
    fn test_invalid_breaker_config_is_an_error() {
        let result = SubscriptionServiceConfig::from_lookup(lookup_from(&[(
            "BREAKER_FAILURE_RATE_THRESHOLD",
            "150",
        )]));

        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<CircuitBreakerConfigError>(),
            Some(&CircuitBreakerConfigError::InvalidFailureRateThreshold(
                150.0
            ))
        );
    }

    #[test]
    fn test_storage_and_logging() {
        let config = BookServiceConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/library"),
            ("SEED_DATA", "false"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(
            config.storage.database_url.as_deref(),
            Some("postgres://localhost/library")
        );
        assert!(!config.storage.seed_data);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_log_format_is_an_error() {
        let result = BookServiceConfig::from_lookup(lookup_from(&[("LOG_FORMAT", "xml")]));
        assert!(result.is_err());
    }
}
