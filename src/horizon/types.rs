//! Types for Horizon ledger and operation resources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;

/// A hypermedia link as rendered by Horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
	pub href: String,
	#[serde(default)]
	pub templated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerLinks {
	pub operations: Link,
}

/// A closed ledger as delivered by the ledgers endpoint and its event stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ledger {
	#[serde(rename = "_links")]
	pub links: LedgerLinks,
	/// Opaque paging token, usable as a stream cursor.
	pub paging_token: String,
	pub sequence: u32,
	#[serde(default)]
	pub operation_count: u32,
	pub closed_at: DateTime<Utc>,
}

impl Ledger {
	/// Cursor pointing at this ledger, so that a stream opened from it resumes
	/// with the following one.
	pub fn cursor(&self) -> Cursor {
		Cursor::new(self.paging_token.clone())
	}
}

/// Opaque position token into an ordered Horizon collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Cursor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Generic HAL page envelope: `{ "_links": ..., "_embedded": { "records": [...] } }`.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
	#[serde(rename = "_links", default)]
	pub links: Option<PageLinks>,
	#[serde(rename = "_embedded")]
	pub embedded: Embedded<T>,
}

#[derive(Debug, Deserialize)]
pub struct PageLinks {
	#[serde(default)]
	pub next: Option<Link>,
}

#[derive(Debug, Deserialize)]
pub struct Embedded<T> {
	#[serde(default = "Vec::new")]
	pub records: Vec<T>,
}

/// One page of a ledger's operations, left undecoded so that each record can
/// be probed for its type before paying for a full decode.
#[derive(Debug)]
pub struct OperationsPage {
	pub records: Vec<Box<RawValue>>,
	pub next: Option<String>,
}

impl From<Page<Box<RawValue>>> for OperationsPage {
	fn from(page: Page<Box<RawValue>>) -> Self {
		Self {
			records: page.embedded.records,
			next: page.links.and_then(|links| links.next).map(|link| link.href),
		}
	}
}

/// Just enough of an operation to tell what kind it is.
#[derive(Debug, Deserialize)]
pub struct OperationTypeProbe {
	pub type_i: i32,
}

/// Full payload of a manage-offer operation. Every field is optional on the
/// wire; completeness is judged by the offer extractor.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OfferOperation {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub paging_token: Option<String>,
	#[serde(default)]
	pub source_account: Option<String>,
	#[serde(default)]
	pub seller: Option<String>,
	#[serde(default)]
	pub offer_id: Option<String>,
	#[serde(default)]
	pub price: Option<String>,
	#[serde(default)]
	pub amount: Option<String>,
	#[serde(flatten)]
	pub selling: SellingAsset,
	#[serde(flatten)]
	pub buying: BuyingAsset,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SellingAsset {
	#[serde(rename = "selling_asset_type", default)]
	pub asset_type: Option<String>,
	#[serde(rename = "selling_asset_code", default)]
	pub asset_code: Option<String>,
	#[serde(rename = "selling_asset_issuer", default)]
	pub asset_issuer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct BuyingAsset {
	#[serde(rename = "buying_asset_type", default)]
	pub asset_type: Option<String>,
	#[serde(rename = "buying_asset_code", default)]
	pub asset_code: Option<String>,
	#[serde(rename = "buying_asset_issuer", default)]
	pub asset_issuer: Option<String>,
}

/// Error types for Horizon requests and stream decoding
#[derive(Debug, thiserror::Error)]
pub enum HorizonError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("Unexpected HTTP status {status} from {url}")]
	StatusError {
		status: reqwest::StatusCode,
		url: String,
	},

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("No data returned")]
	NoData,
}

impl HorizonError {
	/// Whether the error means the connection itself is unusable, as opposed
	/// to a single payload failing to decode.
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			HorizonError::HttpError(_) | HorizonError::StatusError { .. }
		)
	}
}
