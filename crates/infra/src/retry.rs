use crate::ApiError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Runs a workspace call with bounded exponential backoff.
///
/// Every failure kind is retried the same way; the only special case is a
/// rate limit carrying a retry-after hint, which replaces the computed
/// delay for that single wait while the exponential schedule keeps
/// doubling underneath it. The last error is returned once the attempts
/// are exhausted.
pub struct Retrier {
    max_attempts: u32,
    initial_delay: Duration,
}

impl Retrier {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(e) => {
                    let wait = wait_before_retry(&e, delay);
                    warn!("Attempt {} failed: {}. Retrying in {:?}", attempt, e, wait);
                    sleep(wait).await;
                    delay *= 2;
                    attempt += 1;
                }
            }
        }
    }
}

/// Delay before the next attempt: a server-provided retry-after hint wins
/// over the computed exponential delay.
fn wait_before_retry(error: &ApiError, computed: Duration) -> Duration {
    match error {
        ApiError::RateLimited {
            retry_after: Some(hint),
        } => *hint,
        _ => computed,
    }
}
