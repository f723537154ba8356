use crate::fetch::FetchError;
use datalint_domain::RunContext;
use std::time::Duration;

/// Bounded exponential backoff for archive downloads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-indexed): `base * multiplier^retry`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.min(i32::MAX as u32) as i32);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let capped = self.max_delay.as_millis() as f64;
        if !millis.is_finite() || millis > capped {
            self.max_delay
        } else {
            Duration::from_millis(millis as u64)
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Cancellation is checked before each attempt and during backoff sleeps.
    pub fn run<T, F>(&self, ctx: &RunContext, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Result<T, FetchError>,
    {
        let mut attempt = 0;
        loop {
            ctx.cancel.check()?;
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        parent: &ctx.span,
                        error = %err,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "download failed, retrying"
                    );
                    ctx.cancel.sleep(delay)?;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
