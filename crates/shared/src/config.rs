use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// レコードストアの実装
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    DynamoDb,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            _ => Err(()),
        }
    }
}

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub dynamodb_table: String,
    /// DynamoDB Local などのエンドポイント上書き
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub log_format: LogFormat,
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            store_backend: StoreBackend::Memory,
            dynamodb_table: "todo-dev".to_string(),
            dynamodb_endpoint: None,
            aws_region: "ap-northeast-1".to_string(),
            log_format: LogFormat::Json,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の取得関数から組み立てる（未設定の項目はデフォルト値）
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Config {
            host: parsed(&lookup, "HOST")?.unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT")?.unwrap_or(defaults.port),
            store_backend: parsed(&lookup, "STORE_BACKEND")?.unwrap_or(defaults.store_backend),
            dynamodb_table: lookup("DYNAMODB_TABLE").unwrap_or(defaults.dynamodb_table),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.trim().is_empty()),
            aws_region: lookup("AWS_REGION").unwrap_or(defaults.aws_region),
            log_format: parsed(&lookup, "LOG_FORMAT")?.unwrap_or(defaults.log_format),
            retry_max_attempts: parsed(&lookup, "RETRY_MAX_ATTEMPTS")?
                .unwrap_or(defaults.retry_max_attempts),
            retry_initial_delay_ms: parsed(&lookup, "RETRY_INITIAL_DELAY_MS")?
                .unwrap_or(defaults.retry_initial_delay_ms),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
