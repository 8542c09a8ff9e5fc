//! Bounded exponential backoff for reads that hit SQLite lock contention.

use std::{future::Future, time::Duration};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Number of attempts that may be followed by a backoff. One final attempt is always made
	/// after the last backoff.
	pub max_attempts: u32,
	pub base_delay: Duration,
}
impl RetryPolicy {
	pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
		Self { max_attempts, base_delay }
	}

	pub fn from_config(cfg: &linktrace_config::Retry) -> Self {
		Self::new(cfg.max_attempts, Duration::from_millis(cfg.base_delay_ms))
	}

	/// Upper bound on the time one operation can spend sleeping between attempts.
	pub fn max_total_delay(&self) -> Duration {
		let factor = 2_u32.checked_pow(self.max_attempts).map(|value| value - 1).unwrap_or(u32::MAX);

		self.base_delay.saturating_mul(factor)
	}

	/// Runs `attempt` until it succeeds, fails with a non-transient error, or the backoff budget
	/// is spent. The result of the last attempt is returned unchanged.
	pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut delay = self.base_delay;

		for attempt_no in 1..=self.max_attempts {
			match attempt().await {
				Err(err) if err.is_transient() => {
					tracing::warn!(
						operation,
						attempt = attempt_no,
						max_attempts = self.max_attempts,
						delay_ms = delay.as_millis() as u64,
						error = %err,
						"Store busy. Retrying after backoff."
					);

					tokio::time::sleep(delay).await;

					delay = delay.saturating_mul(2);
				},
				other => return other,
			}
		}

		let result = attempt().await;

		if let Err(Error::TransientStoreBusy { message }) = &result {
			tracing::error!(operation, error = %message, "Store still busy after retry budget.");
		}

		result
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::from_config(&linktrace_config::Retry::default())
	}
}
