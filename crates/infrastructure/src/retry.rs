use std::time::Duration;

use shared::Config;
use tokio::time::sleep;
use tracing::{debug, warn};

/// リトライ設定
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// 最大試行回数（初回を含む）
    pub max_attempts: u32,
    /// 初期待機時間（ミリ秒）
    pub initial_delay_ms: u64,
    /// 指数バックオフの倍率
    pub backoff_multiplier: f64,
    /// 最大待機時間（ミリ秒）
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            initial_delay_ms: config.retry_initial_delay_ms,
            ..Self::default()
        }
    }
}

/// 指数バックオフによるリトライ実行
///
/// `is_retryable` が真を返すエラーのみ再試行する。
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation: F,
    config: &RetryConfig,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if !is_retryable(&error) {
                    return Err(error);
                }
                if attempt >= config.max_attempts {
                    warn!(max_attempts = config.max_attempts, %error, "retry attempts exhausted");
                    return Err(error);
                }

                warn!(attempt, delay_ms = delay, %error, "retryable error, backing off");
                sleep(Duration::from_millis(delay)).await;

                delay = ((delay as f64) * config.backoff_multiplier) as u64;
                delay = delay.min(config.max_delay_ms);
            }
        }
    }
}
