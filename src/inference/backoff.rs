use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::BackoffConfig;
use crate::error::Result;

/// Exponential backoff for transport failures: `base * 2^retry`, capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
            .min(self.max_delay)
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}

/// Run `operation`, retrying transient errors according to `policy`.
/// Non-transient errors are returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &BackoffPolicy,
    what: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                warn!(
                    "{} failed ({}), retry {}/{} in {:?}",
                    what,
                    e,
                    retry + 1,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LegendasError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = BackoffPolicy::new(10, Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let policy = BackoffPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = retry_with_backoff(&policy, "probe", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LegendasError::Transport("connection reset".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        let value = tokio_test::assert_ok!(result);
        assert_eq!(value, 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let policy = BackoffPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = retry_with_backoff(&policy, "probe", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LegendasError::Transport("timeout".into()))
        })
        .await;

        assert!(matches!(result, Err(LegendasError::Transport(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_is_not_retried() {
        let policy = BackoffPolicy::new(5, Duration::from_millis(1), Duration::from_millis(1));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = retry_with_backoff(&policy, "probe", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LegendasError::Inference("model not found".into()))
        })
        .await;

        tokio_test::assert_err!(result);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
