use super::{AppState, error::ApiError};
use crate::ingest::Record;

use axum::{
	Json,
	extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
	pub ledger: u32,
}

#[derive(Debug, Serialize)]
pub struct OffersResponse {
	pub records: Vec<Record>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OffersParams {
	pub start: Option<String>,
	pub end: Option<String>,
}

pub async fn get_ledger(State(state): State<AppState>) -> Json<LedgerResponse> {
	Json(LedgerResponse {
		ledger: state.store.sequence(),
	})
}

pub async fn get_offers(
	State(state): State<AppState>,
	Query(params): Query<OffersParams>,
) -> Result<Json<OffersResponse>, ApiError> {
	let start = parse_bound("start", params.start.as_deref())?;
	let end = parse_bound("end", params.end.as_deref())?;
	let windowed = start.is_some() || end.is_some();

	let records = state.store.query(start, end)?;
	if windowed && records.is_empty() {
		return Err(ApiError::NotFound);
	}

	Ok(Json(OffersResponse { records }))
}

/// Empty parameters count as absent.
fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
	let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
		return Ok(None);
	};

	DateTime::parse_from_rfc3339(&normalize_timestamp(value))
		.map(|time| Some(time.with_timezone(&Utc)))
		.map_err(|e| ApiError::BadRequest(format!("invalid {} timestamp {:?}: {}", name, value, e)))
}

/// A literal `+` in an offset is often left unescaped by clients and arrives
/// as a space. A space may also stand in for the `T` date/time separator.
fn normalize_timestamp(value: &str) -> String {
	let mut normalized = value.to_string();
	let len = normalized.len();
	if len >= 6 && normalized.as_bytes()[len - 6] == b' ' {
		normalized.replace_range(len - 6..len - 5, "+");
	}
	if normalized.as_bytes().get(10) == Some(&b' ') {
		normalized.replace_range(10..11, "T");
	}
	normalized
}

#[cfg(test)]
mod tests {
	use super::normalize_timestamp;
	use crate::api::{AppState, create_router};
	use crate::ingest::{Offer, Record};
	use crate::store::RecordStore;

	use axum::body::{Body, to_bytes};
	use axum::http::{Request, StatusCode};
	use chrono::{DateTime, Utc};
	use serde_json::Value;
	use std::sync::Arc;
	use tower::ServiceExt;

	fn time(s: &str) -> DateTime<Utc> {
		DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
	}

	fn populated_store() -> Arc<RecordStore> {
		let store = Arc::new(RecordStore::new());
		store.set_sequence(103);
		store.append(Record::new(time("2019-03-01T10:00:00Z"), Offer::new("T1", "1", "1")));
		store.append(Record::new(time("2019-03-01T10:00:05Z"), Offer::new("T2", "1.5", "100")));
		store.append(Record::new(time("2019-03-01T10:00:10Z"), Offer::new("T3", "2", "3")));
		store
	}

	async fn get(store: Arc<RecordStore>, uri: &str) -> (StatusCode, Value) {
		let response = create_router(AppState::new(store))
			.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		(status, serde_json::from_slice(&body).unwrap())
	}

	#[tokio::test]
	async fn test_ledger_reports_sequence() {
		let (status, body) = get(populated_store(), "/ledger").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, serde_json::json!({ "ledger": 103 }));
	}

	#[tokio::test]
	async fn test_offers_without_window_returns_snapshot() {
		let (status, body) = get(populated_store(), "/offers").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["records"].as_array().unwrap().len(), 3);
		assert_eq!(body["records"][0]["offer"]["seller"], "T1");
		assert_eq!(body["records"][1]["time"], "2019-03-01T10:00:05Z");
	}

	#[tokio::test]
	async fn test_empty_bounds_mean_no_window() {
		let (status, body) = get(populated_store(), "/offers?start=&end=").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["records"].as_array().unwrap().len(), 3);
	}

	#[tokio::test]
	async fn test_window_is_exclusive() {
		let (status, body) = get(
			populated_store(),
			"/offers?start=2019-03-01T10:00:10Z&end=2019-03-01T10:00:00Z",
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		let records = body["records"].as_array().unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0]["offer"]["seller"], "T2");
		assert_eq!(records[0]["offer"]["price"], "1.5");
	}

	#[tokio::test]
	async fn test_empty_window_is_not_found() {
		let (status, body) = get(
			populated_store(),
			"/offers?start=2020-01-01T00:00:00Z&end=2020-01-02T00:00:00Z",
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body, serde_json::json!({ "errors": "404: Not found" }));
	}

	#[tokio::test]
	async fn test_single_bound_is_rejected() {
		let (status, body) = get(populated_store(), "/offers?start=2019-03-01T10:00:00Z&end=").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(body["errors"].as_str().unwrap().contains("both start and end"));
	}

	#[tokio::test]
	async fn test_unparseable_timestamp_is_rejected() {
		let (status, body) = get(populated_store(), "/offers?start=yesterday&end=today").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(body["errors"].as_str().unwrap().starts_with("invalid start timestamp"));
	}

	#[tokio::test]
	async fn test_unescaped_offset_is_accepted() {
		let (status, body) = get(
			populated_store(),
			"/offers?start=2019-03-01T11:00:02+01:00&end=2019-03-01T11:00:08+01:00",
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["records"][0]["offer"]["seller"], "T2");
	}

	#[test]
	fn test_normalize_only_touches_separator_positions() {
		assert_eq!(normalize_timestamp("2019-03-01T11:00:02 01:00"), "2019-03-01T11:00:02+01:00");
		assert_eq!(normalize_timestamp("2019-03-01 10:00:05Z"), "2019-03-01T10:00:05Z");
		assert_eq!(normalize_timestamp("2019-03-01 11:00:02 01:00"), "2019-03-01T11:00:02+01:00");
		assert_eq!(normalize_timestamp("2019-03-01T10:00:05Z"), "2019-03-01T10:00:05Z");
	}

	#[tokio::test]
	async fn test_space_separated_timestamp_is_accepted() {
		let (status, body) = get(
			populated_store(),
			"/offers?start=2019-03-01%2010:00:02Z&end=2019-03-01%2011:00:08%2001:00",
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		let records = body["records"].as_array().unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0]["offer"]["seller"], "T2");
	}
}
