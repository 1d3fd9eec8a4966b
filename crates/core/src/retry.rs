use std::future::Future;
use std::time::Duration;

/// Bounded retry with multiplicative backoff, shared by every remote call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(800),
            backoff: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Reads `{prefix}_MAX_RETRIES`, `{prefix}_RETRY_DELAY_MS` and
    /// `{prefix}_RETRY_BACKOFF`, keeping defaults for anything unset.
    pub fn from_env(prefix: &str) -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var(format!("{prefix}_MAX_RETRIES")) {
            if let Ok(n) = s.parse::<u32>() {
                out.max_retries = n;
            }
        }
        if let Ok(s) = std::env::var(format!("{prefix}_RETRY_DELAY_MS")) {
            if let Ok(n) = s.parse::<u64>() {
                out.initial_delay = Duration::from_millis(n);
            }
        }
        if let Ok(s) = std::env::var(format!("{prefix}_RETRY_BACKOFF")) {
            if let Ok(n) = s.parse::<f64>() {
                out.backoff = n;
            }
        }

        out
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.initial_delay.as_secs_f64() * self.backoff.powi(attempt as i32))
    }

    pub async fn run<T, F, Fut>(&self, label: &'static str, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    let backoff = self.delay_for(attempt);
                    tracing::warn!(label, attempt, ?backoff, error = %err, "remote call failed; retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            backoff: 1.0,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result = fast_policy(2)
            .run("test", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        anyhow::bail!("transient {n}")
                    }
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_last_retry() {
        let calls = Cell::new(0u32);
        let result: anyhow::Result<()> = fast_policy(2)
            .run("test", || {
                calls.set(calls.get() + 1);
                async { anyhow::bail!("still down") }
            })
            .await;

        assert!(result.is_err());
        // Initial attempt plus two retries.
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn backoff_grows_multiplicatively() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(800),
            backoff: 1.5,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(800));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1800));
    }
}
