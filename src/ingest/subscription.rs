//! Resumable ledger subscription.
//!
//! Wraps the upstream ledger stream as a pull-based event source. A ledger
//! handed out by [`LedgerSubscription::next`] counts as processed once the
//! caller asks for the following one, and only then does its cursor become the
//! resume point for reconnects. This keeps the caller's work on one ledger
//! strictly before delivery of the next.
//!
//! A connection that stays silent for longer than the idle timeout is treated
//! as dead and replaced, since Horizon closes a ledger every few seconds.

use crate::horizon::{Cursor, Ledger, LedgerSource, LedgerStream};
use crate::ingest::cursor::BackoffConfig;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct LedgerSubscription<S> {
	source: Arc<S>,
	/// Where a new connection starts: the last processed ledger, or the
	/// bootstrap cursor before any ledger was processed.
	cursor: Cursor,
	last_sequence: Option<u32>,
	in_flight: Option<(Cursor, u32)>,
	stream: Option<LedgerStream>,
	backoff: ExponentialBackoff,
	max_interval: Duration,
	idle_timeout: Duration,
}

impl<S: LedgerSource> LedgerSubscription<S> {
	pub fn new(source: Arc<S>, cursor: Cursor, backoff: &BackoffConfig, idle_timeout: Duration) -> Self {
		Self {
			source,
			cursor,
			last_sequence: None,
			in_flight: None,
			stream: None,
			backoff: backoff.build(),
			max_interval: backoff.max_interval,
			idle_timeout,
		}
	}

	/// Cursor a reconnect would resume from.
	pub fn cursor(&self) -> &Cursor {
		&self.cursor
	}

	/// Wait for the next ledger, reconnecting as needed.
	///
	/// Returns `None` only once `cancel` fires; the connection is dropped
	/// before returning.
	pub async fn next(&mut self, cancel: &CancellationToken) -> Option<Ledger> {
		if let Some((cursor, sequence)) = self.in_flight.take() {
			self.cursor = cursor;
			self.last_sequence = Some(sequence);
		}

		loop {
			if cancel.is_cancelled() {
				self.stream = None;
				return None;
			}

			if self.stream.is_none() {
				let connected = tokio::select! {
					result = self.source.stream_ledgers(&self.cursor) => result,
					_ = cancel.cancelled() => return None,
				};
				match connected {
					Ok(stream) => {
						info!("Subscribed to ledger stream from cursor {}", self.cursor);
						self.stream = Some(stream);
					}
					Err(e) => {
						warn!("Failed to open ledger stream from cursor {}: {}", self.cursor, e);
						if !self.wait_before_reconnect(cancel).await {
							return None;
						}
						continue;
					}
				}
			}

			let Some(stream) = self.stream.as_mut() else {
				continue;
			};
			let item = tokio::select! {
				item = tokio::time::timeout(self.idle_timeout, stream.next()) => Some(item),
				_ = cancel.cancelled() => None,
			};
			let Some(item) = item else {
				self.stream = None;
				return None;
			};

			match item {
				Err(_) => {
					warn!(
						"No ledger for {:?}, reconnecting from {}",
						self.idle_timeout, self.cursor
					);
					self.stream = None;
					if !self.wait_before_reconnect(cancel).await {
						return None;
					}
				}
				Ok(Some(Ok(ledger))) => {
					if self.last_sequence.is_some_and(|last| ledger.sequence <= last) {
						debug!("Skipping already processed ledger {}", ledger.sequence);
						continue;
					}
					self.backoff.reset();
					self.in_flight = Some((ledger.cursor(), ledger.sequence));
					return Some(ledger);
				}
				Ok(Some(Err(e))) if e.is_transport() => {
					warn!("Ledger stream failed, reconnecting from {}: {}", self.cursor, e);
					self.stream = None;
					if !self.wait_before_reconnect(cancel).await {
						return None;
					}
				}
				Ok(Some(Err(e))) => {
					warn!("Skipping undecodable ledger event: {}", e);
				}
				Ok(None) => {
					info!("Ledger stream closed, reconnecting from {}", self.cursor);
					self.stream = None;
					if !self.wait_before_reconnect(cancel).await {
						return None;
					}
				}
			}
		}
	}

	/// Sleep for the next backoff interval. Returns `false` if cancelled.
	async fn wait_before_reconnect(&mut self, cancel: &CancellationToken) -> bool {
		let delay = self.backoff.next_backoff().unwrap_or(self.max_interval);
		tokio::select! {
			_ = tokio::time::sleep(delay) => true,
			_ = cancel.cancelled() => false,
		}
	}
}
