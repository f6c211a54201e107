//! Progress tracking for ledger ingestion.
//!
//! Counts what the ingestion loop has done and logs a progress line at a fixed
//! ledger interval so a long-running process shows it is still advancing.

use tracing::info;

/// Log a progress line every this many ledgers.
const LOG_INTERVAL: u32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct IngestStats {
	/// The first ledger seen by this process
	first_sequence: Option<u32>,
	/// The highest ledger processed so far
	last_sequence: u32,
	ledgers_processed: u64,
	ledgers_with_operations: u64,
	offer_operations: u64,
	offers_stored: u64,
	last_logged_sequence: u32,
}

impl IngestStats {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record one processed ledger and what it yielded.
	pub fn record_ledger(&mut self, sequence: u32, had_operations: bool, offer_operations: usize, stored: usize) {
		if self.first_sequence.is_none() {
			self.first_sequence = Some(sequence);
			self.last_logged_sequence = sequence;
		}
		self.last_sequence = self.last_sequence.max(sequence);
		self.ledgers_processed += 1;
		if had_operations {
			self.ledgers_with_operations += 1;
		}
		self.offer_operations += offer_operations as u64;
		self.offers_stored += stored as u64;
	}

	/// Offer operations that did not produce a stored record.
	pub fn offers_discarded(&self) -> u64 {
		self.offer_operations - self.offers_stored
	}

	pub fn ledgers_processed(&self) -> u64 {
		self.ledgers_processed
	}

	pub fn offers_stored(&self) -> u64 {
		self.offers_stored
	}

	/// Log progress at regular intervals or when forced
	pub fn log_progress(&mut self, force: bool) {
		let since_last_log = self.last_sequence.saturating_sub(self.last_logged_sequence);
		if self.ledgers_processed == 0 || !(force || since_last_log >= LOG_INTERVAL) {
			return;
		}

		info!("Ingestion progress: {}", self.summary());
		self.last_logged_sequence = self.last_sequence;
	}

	pub fn summary(&self) -> String {
		format!(
			"ledgers {}..={} ({} processed, {} with operations), {} offers stored, {} discarded",
			self.first_sequence.unwrap_or_default(),
			self.last_sequence,
			self.ledgers_processed,
			self.ledgers_with_operations,
			self.offers_stored,
			self.offers_discarded()
		)
	}
}
