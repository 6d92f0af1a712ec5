use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::Policy;
use crate::error::Result;

/// Longest wait between two attempts
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Bounded exponential backoff for contract reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub attempts: u32,
    pub base: Duration,
}

impl Backoff {
    pub fn new(attempts: u32, base: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base,
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self::new(policy.read_attempts, Duration::from_millis(policy.read_backoff_ms))
    }

    /// Wait after failed attempt `n` (0-based): base, 2*base, 4*base, ...
    pub fn delay(&self, n: u32) -> Duration {
        let factor = 1u32.checked_shl(n).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(MAX_DELAY)
    }
}

/// Run `op` until it succeeds or attempts run out. Returns the last error.
pub async fn with_retry<T, F, Fut>(backoff: Backoff, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt + 1 < backoff.attempts => {
                let delay = backoff.delay(attempt);
                warn!(
                    attempt = attempt + 1,
                    of = backoff.attempts,
                    ?delay,
                    "{} failed: {}",
                    what,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
