//! リトライとバックオフ

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::HarvestConfig;
use crate::error::{HarvestError, TransportError};

/// 再試行回数とバックオフ基準値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 初回を除いた再試行回数
    pub retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, backoff_base: Duration) -> Self {
        Self {
            retries,
            backoff_base,
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(config.retries, config.backoff_base)
    }

    /// 総試行回数
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// k回目の再試行 (k >= 1) の前に待つ時間: base * 2^(k-1)。上限なし
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}

/// `operation` を最大 `retries + 1` 回実行する。
/// すべて失敗したら最後の原因を持つ `FetchExhausted` を返す
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, HarvestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                attempt += 1;
                let backoff = policy.delay_before(attempt);
                warn!(
                    "Fetch attempt {} failed, retrying in {}ms: {} ({})",
                    attempt,
                    backoff.as_millis(),
                    e,
                    url
                );
                sleep(backoff).await;
            }
            Err(e) => {
                return Err(HarvestError::FetchExhausted {
                    url: url.to_string(),
                    attempts: attempt + 1,
                    last_cause: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));

        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_before(1), Duration::from_millis(500));
        assert_eq!(policy.delay_before(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_before(6), Duration::from_millis(16000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_after_all_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let attempts = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Result<(), HarvestError> = with_retries(&policy, "https://x/api", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Timeout("slow".into())) }
        })
        .await;

        let elapsed = start.elapsed();
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert!(elapsed >= Duration::from_millis(3500), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3600), "elapsed {:?}", elapsed);

        match result {
            Err(HarvestError::FetchExhausted {
                attempts,
                last_cause,
                url,
            }) => {
                assert_eq!(attempts, 4);
                assert_eq!(url, "https://x/api");
                assert_eq!(last_cause, TransportError::Timeout("slow".into()));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let attempts = AtomicU32::new(0);

        let value = with_retries(&policy, "https://x/api", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TransportError::Status { status: 502 })
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(10));
        let attempts = AtomicU32::new(0);

        let result: Result<(), HarvestError> = with_retries(&policy, "u", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::EmptyBody { status: 200 }) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(HarvestError::FetchExhausted { attempts: 1, .. })
        ));
    }
}
