use crate::horizon::HorizonError;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Asset descriptor as Horizon renders it (`native`, or code plus issuer).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Asset {
	pub asset_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub asset_issuer: Option<String>,
}

/// A validated trade offer. `seller`, `price` and `amount` are never empty.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Offer {
	pub seller: String,
	pub price: String,
	pub amount: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paging_token: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub offer_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub selling: Option<Asset>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub buying: Option<Asset>,
}

impl Offer {
	pub fn new(seller: impl Into<String>, price: impl Into<String>, amount: impl Into<String>) -> Self {
		Self {
			seller: seller.into(),
			price: price.into(),
			amount: amount.into(),
			id: None,
			paging_token: None,
			offer_id: None,
			selling: None,
			buying: None,
		}
	}
}

/// An offer stamped with the closing time of the ledger it was found in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Record {
	pub time: DateTime<Utc>,
	pub offer: Offer,
}

impl Record {
	pub fn new(time: DateTime<Utc>, offer: Offer) -> Self {
		Self { time, offer }
	}
}

/// Errors that escape the ingestion task
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
	#[error("Could not resolve a starting cursor after {attempts} attempt(s): {source}")]
	CursorUnavailable {
		attempts: u32,
		#[source]
		source: HorizonError,
	},
}
