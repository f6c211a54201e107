//! In-memory `LedgerSource` used by the ingestion tests.

use crate::horizon::{
	Cursor, HorizonError, Ledger, LedgerLinks, LedgerSource, LedgerStream, Link, OperationsPage,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures_util::{StreamExt, stream};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

pub fn closed_at(sequence: u32) -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap() + Duration::seconds(sequence as i64 * 5)
}

pub fn ledger(sequence: u32, operation_count: u32) -> Ledger {
	Ledger {
		links: LedgerLinks {
			operations: Link {
				href: format!(
					"http://horizon/ledgers/{}/operations{{?cursor,limit,order}}",
					sequence
				),
				templated: true,
			},
		},
		paging_token: format!("pt-{}", sequence),
		sequence,
		operation_count,
		closed_at: closed_at(sequence),
	}
}

pub fn transport_error() -> HorizonError {
	HorizonError::StatusError {
		status: reqwest::StatusCode::BAD_GATEWAY,
		url: "http://horizon".to_string(),
	}
}

type Connection = Result<Vec<Result<Ledger, HorizonError>>, HorizonError>;

#[derive(Default)]
pub struct StubSource {
	latest: Mutex<VecDeque<Result<Ledger, HorizonError>>>,
	latest_calls: Mutex<u32>,
	/// Scripted connections; the flag keeps the stream open after its items.
	connections: Mutex<VecDeque<(Connection, bool)>>,
	stream_cursors: Mutex<Vec<Cursor>>,
	pages: Mutex<HashMap<String, (Vec<serde_json::Value>, Option<String>)>>,
	requested: Mutex<Vec<String>>,
	stalled_pages: Mutex<HashSet<String>>,
}

impl StubSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_latest(&self, result: Result<Ledger, HorizonError>) {
		self.latest.lock().unwrap().push_back(result);
	}

	pub fn latest_calls(&self) -> u32 {
		*self.latest_calls.lock().unwrap()
	}

	/// Script the next stream connection. Once the scripted items are drained
	/// the stream ends, as a dropped connection would.
	pub fn push_connection(&self, connection: Connection) {
		self.connections.lock().unwrap().push_back((connection, false));
	}

	/// Script a connection that delivers `items` and then goes silent
	/// without closing, like a half-open socket.
	pub fn push_stalled_connection(&self, items: Vec<Result<Ledger, HorizonError>>) {
		self.connections.lock().unwrap().push_back((Ok(items), true));
	}

	pub fn stream_cursors(&self) -> Vec<Cursor> {
		self.stream_cursors.lock().unwrap().clone()
	}

	pub fn add_page(&self, url: &str, records: Vec<serde_json::Value>, next: Option<&str>) {
		self.pages
			.lock()
			.unwrap()
			.insert(url.to_string(), (records, next.map(str::to_string)));
	}

	pub fn add_operations(&self, sequence: u32, records: Vec<serde_json::Value>) {
		let url = format!("http://horizon/ledgers/{}/operations?limit=200", sequence);
		self.add_page(&url, records, None);
	}

	/// Requests for `url` never complete.
	pub fn stall_page(&self, url: &str) {
		self.stalled_pages.lock().unwrap().insert(url.to_string());
	}

	pub fn operation_requests(&self) -> usize {
		self.requested.lock().unwrap().len()
	}

	pub fn requested_urls(&self) -> Vec<String> {
		self.requested.lock().unwrap().clone()
	}
}

#[async_trait]
impl LedgerSource for StubSource {
	async fn latest_ledger(&self) -> Result<Ledger, HorizonError> {
		*self.latest_calls.lock().unwrap() += 1;
		self.latest
			.lock()
			.unwrap()
			.pop_front()
			.unwrap_or(Err(HorizonError::NoData))
	}

	async fn stream_ledgers(&self, cursor: &Cursor) -> Result<LedgerStream, HorizonError> {
		self.stream_cursors.lock().unwrap().push(cursor.clone());
		match self.connections.lock().unwrap().pop_front() {
			Some((Ok(items), false)) => Ok(Box::pin(stream::iter(items))),
			Some((Ok(items), true)) => Ok(Box::pin(stream::iter(items).chain(stream::pending()))),
			Some((Err(e), _)) => Err(e),
			// Nothing left to deliver: idle until the caller gives up.
			None => Ok(Box::pin(stream::pending())),
		}
	}

	async fn operations_page(&self, url: &str) -> Result<OperationsPage, HorizonError> {
		self.requested.lock().unwrap().push(url.to_string());
		if self.stalled_pages.lock().unwrap().contains(url) {
			std::future::pending::<()>().await;
		}
		let (records, next) = self
			.pages
			.lock()
			.unwrap()
			.get(url)
			.cloned()
			.ok_or(HorizonError::NoData)?;

		let records = records
			.iter()
			.map(serde_json::value::to_raw_value)
			.collect::<Result<Vec<_>, _>>()?;
		Ok(OperationsPage { records, next })
	}
}
