use std::future::Future;
use std::time::Duration;

/// 線性退避：第 n 次失敗後等待 `base * n`，最後一次失敗後不再等待
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl LinearBackoff {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Runs `op` until it succeeds or `max_attempts` is reached.
    /// On exhaustion returns the number of attempts made and the last error.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, (u32, E)>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => return Err((attempt, e)),
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        "🔁 Attempt {}/{} failed: {} (retrying in {:?})",
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}
