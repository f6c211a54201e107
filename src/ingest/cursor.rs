use crate::horizon::{Cursor, LedgerSource};
use crate::ingest::types::IngestError;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder, future::retry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Exponential backoff bounds shared by cursor resolution and stream reconnects.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
	pub initial_interval: Duration,
	pub max_interval: Duration,
}

impl Default for BackoffConfig {
	fn default() -> Self {
		Self {
			initial_interval: Duration::from_millis(500),
			max_interval: Duration::from_secs(30),
		}
	}
}

impl BackoffConfig {
	/// An unbounded-in-time backoff; callers bound it by attempts instead.
	pub fn build(&self) -> ExponentialBackoff {
		ExponentialBackoffBuilder::new()
			.with_initial_interval(self.initial_interval)
			.with_max_interval(self.max_interval)
			.with_max_elapsed_time(None)
			.build()
	}
}

/// Finds where the ledger subscription should start.
pub struct CursorResolver<S> {
	source: Arc<S>,
	backoff: BackoffConfig,
	max_attempts: u32,
}

impl<S: LedgerSource> CursorResolver<S> {
	pub fn new(source: Arc<S>, backoff: BackoffConfig, max_attempts: u32) -> Self {
		Self {
			source,
			backoff,
			max_attempts: max_attempts.max(1),
		}
	}

	/// Resolve the paging token of the most recently closed ledger, retrying
	/// with backoff up to the configured number of attempts.
	pub async fn resolve(&self) -> Result<Cursor, IngestError> {
		let max_attempts = self.max_attempts;
		let mut attempts = 0u32;

		let result = retry(self.backoff.build(), || {
			attempts += 1;
			let attempt = attempts;
			async move {
				match self.source.latest_ledger().await {
					Ok(ledger) => Ok(ledger),
					Err(e) if attempt >= max_attempts => Err(backoff::Error::permanent(e)),
					Err(e) => {
						warn!(
							"Failed to fetch latest ledger (attempt {}/{}): {}",
							attempt, max_attempts, e
						);
						Err(backoff::Error::transient(e))
					}
				}
			}
		})
		.await;

		match result {
			Ok(ledger) => {
				info!(
					"Starting from ledger {} (cursor {})",
					ledger.sequence, ledger.paging_token
				);
				Ok(ledger.cursor())
			}
			Err(source) => Err(IngestError::CursorUnavailable { attempts, source }),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::horizon::HorizonError;
	use crate::ingest::testing::{StubSource, ledger, transport_error};

	fn fast_backoff() -> BackoffConfig {
		BackoffConfig {
			initial_interval: Duration::from_millis(1),
			max_interval: Duration::from_millis(5),
		}
	}

	#[tokio::test]
	async fn test_resolves_latest_paging_token() {
		let source = Arc::new(StubSource::new());
		source.push_latest(Ok(ledger(500, 0)));

		let cursor = CursorResolver::new(source.clone(), fast_backoff(), 3)
			.resolve()
			.await
			.unwrap();
		assert_eq!(cursor, Cursor::new("pt-500"));
		assert_eq!(source.latest_calls(), 1);
	}

	#[tokio::test]
	async fn test_retries_transient_failures() {
		let source = Arc::new(StubSource::new());
		source.push_latest(Err(transport_error()));
		source.push_latest(Err(HorizonError::NoData));
		source.push_latest(Ok(ledger(42, 0)));

		let cursor = CursorResolver::new(source.clone(), fast_backoff(), 5)
			.resolve()
			.await
			.unwrap();
		assert_eq!(cursor, Cursor::new("pt-42"));
		assert_eq!(source.latest_calls(), 3);
	}

	#[tokio::test]
	async fn test_gives_up_after_max_attempts() {
		let source = Arc::new(StubSource::new());

		let err = CursorResolver::new(source.clone(), fast_backoff(), 4)
			.resolve()
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			IngestError::CursorUnavailable {
				attempts: 4,
				source: HorizonError::NoData
			}
		));
		assert_eq!(source.latest_calls(), 4);
	}
}
