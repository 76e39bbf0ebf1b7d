use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use zkid_types::{ZkidResult, DEFAULT_RETRY_COUNT};

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Doubling delay sequence without jitter.
pub struct Backoff {
    base_delay: Duration,
    multiplier: u32,
    current_delay: Duration,
    attempt: u32,
    max_attempts: u32,
}

impl Backoff {
    pub fn exponential(base: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay: base,
            multiplier: 2,
            current_delay: base,
            attempt: 0,
            max_attempts,
        }
    }

    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }

        self.attempt += 1;

        let delay = if self.attempt == 1 {
            self.base_delay
        } else {
            self.current_delay.saturating_mul(self.multiplier)
        };

        self.current_delay = delay;
        Some(delay)
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

/// Retries transport failures; everything else is returned immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_count: u32) -> Self {
        Self {
            retry_count,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Total number of attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.retry_count + 1
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::exponential(self.base_delay, self.retry_count)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> ZkidResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ZkidResult<T>>,
    {
        let mut backoff = self.backoff();
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transport() => match backoff.next_delay() {
                    Some(delay) => {
                        warn!(
                            "{} failed (attempt {}/{}), retrying in {:?}: {}",
                            label,
                            backoff.attempts(),
                            self.max_attempts(),
                            delay,
                            e
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        debug!("{} giving up after {} attempts", label, self.max_attempts());
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use zkid_types::ZkidError;

    #[test]
    fn test_backoff_doubles() {
        let mut backoff = Backoff::exponential(Duration::from_millis(100), 3);
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(400)));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempts(), 3);
    }

    #[test]
    fn test_policy_backoff_spans_retries() {
        let policy = fast(2);
        let mut backoff = policy.backoff();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(1)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(2)));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempts(), policy.retry_count());
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retry_count(), 3);
        assert_eq!(policy.max_attempts(), 4);
    }

    fn fast(retry_count: u32) -> RetryPolicy {
        RetryPolicy::new(retry_count).with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result = fast(3)
            .run("op", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 2 {
                    Err(ZkidError::Network("connection reset".into()))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_original_error() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: ZkidResult<()> = fast(3)
            .run("op", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(ZkidError::Network(format!("failure {}", n)))
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        match result {
            Err(ZkidError::Network(msg)) => assert_eq!(msg, "failure 4"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_retry_counts() {
        for (retry_count, expected) in [(0u32, 1u32), (1, 2), (5, 6)] {
            let attempts = AtomicU32::new(0);
            let counter = &attempts;
            let _: ZkidResult<()> = fast(retry_count)
                .run("op", move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ZkidError::Network("down".into()))
                })
                .await;
            assert_eq!(attempts.load(Ordering::SeqCst), expected);
        }
    }

    #[tokio::test]
    async fn test_non_transport_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: ZkidResult<()> = fast(3)
            .run("op", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ZkidError::Rpc("execution reverted".into()))
            })
            .await;
        assert!(matches!(result, Err(ZkidError::Rpc(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
