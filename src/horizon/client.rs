//!
//! HTTP client for a Horizon server.
//!
//! This module provides an async client for the parts of the Horizon API the indexer consumes:
//! the latest-ledger lookup, the server-sent ledger stream, and per-ledger operation pages.
//! All methods are async and designed for use with Tokio.

use super::sse::{SseDecoder, SseEvent};
use super::types::*;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, header};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Ordered stream of closed ledgers. An `Err` item that is not a transport
/// error only concerns that one event; the stream may continue after it.
pub type LedgerStream = Pin<Box<dyn Stream<Item = Result<Ledger, HorizonError>> + Send>>;

/// The upstream operations the ingestion pipeline depends on.
#[async_trait]
pub trait LedgerSource: Send + Sync {
	/// Fetch the most recently closed ledger.
	async fn latest_ledger(&self) -> Result<Ledger, HorizonError>;

	/// Open a stream of ledgers closed after `cursor`.
	async fn stream_ledgers(&self, cursor: &Cursor) -> Result<LedgerStream, HorizonError>;

	/// Fetch one page of operations from a fully-resolved URL.
	async fn operations_page(&self, url: &str) -> Result<OperationsPage, HorizonError>;
}

/// Horizon REST/SSE client
#[derive(Clone)]
pub struct HorizonClient {
	/// Client for one-shot requests, bounded by the configured timeout.
	http_client: Client,
	/// Client for long-lived streams, which must not time out mid-body.
	stream_client: Client,
	/// Base URL of the Horizon server, without a trailing slash.
	horizon_url: String,
}

impl HorizonClient {
	/// Create a new Horizon client.
	///
	/// # Arguments
	/// * `horizon_url` - Base URL of the Horizon server.
	/// * `timeout` - Request timeout applied to non-streaming calls.
	pub fn new(horizon_url: &str, timeout: Duration) -> Result<Self, HorizonError> {
		let http_client = Client::builder().timeout(timeout).build()?;
		let stream_client = Client::builder().connect_timeout(timeout).build()?;

		Ok(Self {
			http_client,
			stream_client,
			horizon_url: horizon_url.trim_end_matches('/').to_string(),
		})
	}

	async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, HorizonError> {
		let response = self
			.http_client
			.get(url)
			.header(header::ACCEPT, "application/hal+json")
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(HorizonError::StatusError {
				status: response.status(),
				url: url.to_string(),
			});
		}

		let body = response.bytes().await?;
		Ok(serde_json::from_slice(&body)?)
	}
}

#[async_trait]
impl LedgerSource for HorizonClient {
	async fn latest_ledger(&self) -> Result<Ledger, HorizonError> {
		let url = format!("{}/ledgers?limit=1&order=desc", self.horizon_url);
		let page: Page<Ledger> = self.get_json(&url).await?;

		page.embedded
			.records
			.into_iter()
			.next()
			.ok_or(HorizonError::NoData)
	}

	async fn stream_ledgers(&self, cursor: &Cursor) -> Result<LedgerStream, HorizonError> {
		let url = format!("{}/ledgers", self.horizon_url);
		debug!("Opening ledger stream at {} from cursor {}", url, cursor);

		let response = self
			.stream_client
			.get(&url)
			.query(&[("cursor", cursor.as_str())])
			.header(header::ACCEPT, "text/event-stream")
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(HorizonError::StatusError {
				status: response.status(),
				url,
			});
		}

		Ok(Box::pin(ledger_events(Box::pin(response.bytes_stream()))))
	}

	async fn operations_page(&self, url: &str) -> Result<OperationsPage, HorizonError> {
		let page: Page<Box<serde_json::value::RawValue>> = self.get_json(url).await?;
		Ok(page.into())
	}
}

/// Turn a raw SSE body into decoded ledgers, dropping Horizon's control frames.
fn ledger_events<S, B>(body: S) -> impl Stream<Item = Result<Ledger, HorizonError>> + Send
where
	S: Stream<Item = reqwest::Result<B>> + Send + Unpin,
	B: AsRef<[u8]> + Send,
{
	let state = (
		body,
		SseDecoder::new(),
		VecDeque::<Result<Ledger, HorizonError>>::new(),
	);

	futures_util::stream::unfold(state, |(mut body, mut decoder, mut pending)| async move {
		loop {
			if let Some(item) = pending.pop_front() {
				return Some((item, (body, decoder, pending)));
			}

			match body.next().await {
				Some(Ok(chunk)) => {
					pending.extend(decoder.push(chunk.as_ref()).into_iter().filter_map(decode_ledger));
				}
				Some(Err(e)) => return Some((Err(e.into()), (body, decoder, pending))),
				None => return None,
			}
		}
	})
}

fn decode_ledger(event: SseEvent) -> Option<Result<Ledger, HorizonError>> {
	let data = event.data.trim();
	// Horizon greets with "hello" and closes with "byebye"; neither is a ledger.
	if data.is_empty() || data.starts_with('"') {
		debug!("Ignoring stream control frame: {}", data);
		return None;
	}
	Some(serde_json::from_str::<Ledger>(data).map_err(HorizonError::from))
}
