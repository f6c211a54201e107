use crate::horizon::{BuyingAsset, OfferOperation, SellingAsset};
use crate::ingest::types::{Asset, Offer};
use tracing::debug;

/// Converts decoded manage-offer payloads into validated offers.
///
/// Payloads missing a seller, price or amount belong to operations that did not
/// leave a standing offer behind and are dropped without error.
#[derive(Debug, Clone, Default)]
pub struct OfferExtractor;

impl OfferExtractor {
	pub fn new() -> Self {
		Self
	}

	pub fn extract(&self, operation: OfferOperation) -> Option<Offer> {
		let OfferOperation {
			id,
			paging_token,
			source_account,
			seller,
			offer_id,
			price,
			amount,
			selling,
			buying,
		} = operation;

		let seller = non_empty(seller).or_else(|| non_empty(source_account));
		let (Some(seller), Some(price), Some(amount)) = (seller, non_empty(price), non_empty(amount))
		else {
			debug!("Discarding incomplete offer operation {:?}", id);
			return None;
		};

		Some(Offer {
			seller,
			price,
			amount,
			id,
			paging_token,
			offer_id,
			selling: selling_asset(selling),
			buying: buying_asset(buying),
		})
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

fn selling_asset(asset: SellingAsset) -> Option<Asset> {
	Some(Asset {
		asset_type: asset.asset_type?,
		asset_code: asset.asset_code,
		asset_issuer: asset.asset_issuer,
	})
}

fn buying_asset(asset: BuyingAsset) -> Option<Asset> {
	Some(Asset {
		asset_type: asset.asset_type?,
		asset_code: asset.asset_code,
		asset_issuer: asset.asset_issuer,
	})
}
