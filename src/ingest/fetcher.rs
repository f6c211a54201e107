use crate::horizon::{Ledger, LedgerSource, OfferOperation, OperationTypeProbe};
use serde_json::value::RawValue;
use std::sync::Arc;
use tracing::{debug, warn};

/// Horizon operation type code of `manage_sell_offer` (named `manage_offer`
/// before protocol 11).
pub const MANAGE_SELL_OFFER: i32 = 3;

/// Settings for operation retrieval
#[derive(Debug, Clone)]
pub struct FetchConfig {
	/// The operation type code treated as a manage-offer operation.
	pub offer_type: i32,
	/// Records requested per operations page.
	pub page_limit: u32,
}

impl Default for FetchConfig {
	fn default() -> Self {
		Self {
			offer_type: MANAGE_SELL_OFFER,
			page_limit: 200,
		}
	}
}

/// Retrieves a ledger's operations and keeps only the manage-offer ones.
pub struct OperationFetcher<S> {
	source: Arc<S>,
	config: FetchConfig,
}

impl<S: LedgerSource> OperationFetcher<S> {
	pub fn new(source: Arc<S>, config: FetchConfig) -> Self {
		Self { source, config }
	}

	/// Fetch the manage-offer operations of `ledger`.
	///
	/// Ledgers without operations never touch the network. Page and record
	/// failures are logged and skipped; whatever was decoded is returned.
	pub async fn fetch(&self, ledger: &Ledger) -> Vec<OfferOperation> {
		if ledger.operation_count == 0 {
			return Vec::new();
		}

		let expected = ledger.operation_count as usize;
		let mut url = Some(with_limit(
			strip_template(&ledger.links.operations.href),
			self.config.page_limit,
		));
		let mut seen = 0usize;
		let mut offers = Vec::new();

		while let Some(page_url) = url.take() {
			let page = match self.source.operations_page(&page_url).await {
				Ok(page) => page,
				Err(e) => {
					warn!(
						"Failed to fetch operations for ledger {} from {}: {}",
						ledger.sequence, page_url, e
					);
					break;
				}
			};

			let page_len = page.records.len();
			seen += page_len;
			offers.extend(page.records.iter().filter_map(|raw| self.decode(ledger, raw)));

			if page_len >= self.config.page_limit as usize && seen < expected {
				url = page.next;
			}
		}

		offers
	}

	/// Probe the type discriminator, and fully decode only manage-offer records.
	fn decode(&self, ledger: &Ledger, raw: &RawValue) -> Option<OfferOperation> {
		let probe: OperationTypeProbe = match serde_json::from_str(raw.get()) {
			Ok(probe) => probe,
			Err(e) => {
				warn!("Skipping undecodable operation in ledger {}: {}", ledger.sequence, e);
				return None;
			}
		};

		if probe.type_i != self.config.offer_type {
			return None;
		}

		match serde_json::from_str(raw.get()) {
			Ok(operation) => Some(operation),
			Err(e) => {
				warn!(
					"Skipping malformed offer operation in ledger {}: {}",
					ledger.sequence, e
				);
				None
			}
		}
	}
}

/// Drop RFC 6570 template placeholders such as `{?cursor,limit,order}`.
pub fn strip_template(href: &str) -> &str {
	match href.find('{') {
		Some(index) => &href[..index],
		None => href,
	}
}

fn with_limit(url: &str, limit: u32) -> String {
	let separator = if url.contains('?') { '&' } else { '?' };
	format!("{}{}limit={}", url, separator, limit)
}
