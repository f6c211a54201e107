//! Ingestion orchestrator and integration point for all ingestion services.
//!
//! This module defines the `IngestionLoop`, which wires the cursor resolver, ledger
//! subscription, operation fetcher and offer extractor together and feeds the record store.
//!
//! The loop is responsible for:
//! - Resolving the starting cursor, the only failure that ends ingestion
//! - Handling ledgers strictly one at a time, in sequence order
//! - Publishing each ledger's sequence before appending the records it produced
//! - Absorbing transient network and decode failures so the stream keeps advancing

use crate::horizon::{Ledger, LedgerSource};
use crate::ingest::{
	cursor::{BackoffConfig, CursorResolver},
	extractor::OfferExtractor,
	fetcher::{FetchConfig, OperationFetcher},
	stats::IngestStats,
	subscription::LedgerSubscription,
	types::{IngestError, Record},
};
use crate::store::RecordStore;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Configuration for the ingestion loop
#[derive(Debug, Clone)]
pub struct IngestConfig {
	pub backoff: BackoffConfig,
	/// Attempts at resolving the starting cursor before giving up.
	pub cursor_max_attempts: u32,
	/// Silence on the ledger stream after which the connection is replaced.
	pub stream_idle_timeout: Duration,
	pub fetch: FetchConfig,
}

impl Default for IngestConfig {
	fn default() -> Self {
		Self {
			backoff: BackoffConfig::default(),
			cursor_max_attempts: 5,
			stream_idle_timeout: Duration::from_secs(60),
			fetch: FetchConfig::default(),
		}
	}
}

/// The single background task that writes to the record store.
pub struct IngestionLoop<S> {
	source: Arc<S>,
	store: Arc<RecordStore>,
	config: IngestConfig,
	fetcher: OperationFetcher<S>,
	extractor: OfferExtractor,
}

impl<S: LedgerSource> IngestionLoop<S> {
	pub fn new(source: Arc<S>, store: Arc<RecordStore>, config: IngestConfig) -> Self {
		let fetcher = OperationFetcher::new(source.clone(), config.fetch.clone());

		Self {
			source,
			store,
			config,
			fetcher,
			extractor: OfferExtractor::new(),
		}
	}

	/// Run until `cancel` fires.
	///
	/// Returns an error only when no starting cursor could be resolved.
	pub async fn run(self, cancel: CancellationToken) -> Result<IngestStats, IngestError> {
		let mut stats = IngestStats::new();

		let resolver = CursorResolver::new(
			self.source.clone(),
			self.config.backoff.clone(),
			self.config.cursor_max_attempts,
		);
		let cursor = tokio::select! {
			cursor = resolver.resolve() => cursor?,
			_ = cancel.cancelled() => return Ok(stats),
		};

		let mut subscription = LedgerSubscription::new(
			self.source.clone(),
			cursor,
			&self.config.backoff,
			self.config.stream_idle_timeout,
		);

		while let Some(ledger) = subscription.next(&cancel).await {
			let processed = tokio::select! {
				processed = self.process_ledger(&ledger) => processed,
				_ = cancel.cancelled() => {
					info!("Abandoning ledger {} on shutdown", ledger.sequence);
					break;
				}
			};

			let (offer_operations, records) = processed;
			stats.record_ledger(
				ledger.sequence,
				ledger.operation_count > 0,
				offer_operations,
				records.len(),
			);
			self.store.extend(records);
			stats.log_progress(false);
		}

		stats.log_progress(true);
		info!("Ledger ingestion stopped");
		Ok(stats)
	}

	/// Publish the ledger's sequence and collect the records it yields.
	///
	/// Nothing is appended here, so abandoning this future leaves the store
	/// untouched.
	async fn process_ledger(&self, ledger: &Ledger) -> (usize, Vec<Record>) {
		self.store.set_sequence(ledger.sequence);

		let operations = self.fetcher.fetch(ledger).await;
		let offer_operations = operations.len();
		let records = operations
			.into_iter()
			.filter_map(|operation| self.extractor.extract(operation))
			.map(|offer| Record::new(ledger.closed_at, offer))
			.collect();

		(offer_operations, records)
	}
}
