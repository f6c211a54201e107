//! Shared in-memory record store.
//!
//! The ingestion task is the only writer; HTTP handlers only read. Records are
//! append-only, so a reader copying the vector under the lock always observes
//! a prefix of the eventual history. The latest sequence number is published
//! before the records of its ledger are appended, which means a reader that
//! sees a record from ledger N also sees `sequence() >= N`.

use crate::ingest::Record;

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

/// Rejected query shapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("both start and end must be supplied for a windowed query")]
	IncompleteWindow,
}

#[derive(Debug, Default)]
pub struct RecordStore {
	sequence: AtomicU32,
	records: RwLock<Vec<Record>>,
}

impl RecordStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Publish the latest observed ledger sequence. Never moves backwards.
	pub fn set_sequence(&self, sequence: u32) {
		self.sequence.fetch_max(sequence, Ordering::SeqCst);
	}

	pub fn sequence(&self) -> u32 {
		self.sequence.load(Ordering::SeqCst)
	}

	pub fn append(&self, record: Record) {
		self.records
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.push(record);
	}

	/// Append one ledger's records under a single lock acquisition, so readers
	/// see either none or all of them.
	pub fn extend(&self, records: Vec<Record>) {
		if records.is_empty() {
			return;
		}
		self.records
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.extend(records);
	}

	pub fn len(&self) -> usize {
		self.records
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Copy out records in append order.
	///
	/// With no bounds the whole store is returned. With both bounds only
	/// records strictly inside the open interval between them are returned;
	/// the bounds may be given in either order. A single bound is rejected.
	pub fn query(
		&self,
		start: Option<DateTime<Utc>>,
		end: Option<DateTime<Utc>>,
	) -> Result<Vec<Record>, QueryError> {
		let records = self.records.read().unwrap_or_else(PoisonError::into_inner);

		match (start, end) {
			(None, None) => Ok(records.clone()),
			(Some(start), Some(end)) => {
				let (lower, upper) = if start <= end { (start, end) } else { (end, start) };
				Ok(records
					.iter()
					.filter(|record| lower < record.time && record.time < upper)
					.cloned()
					.collect())
			}
			_ => Err(QueryError::IncompleteWindow),
		}
	}
}
