use crate::ingest::IngestConfig;
use crate::ingest::cursor::BackoffConfig;
use crate::ingest::fetcher::{FetchConfig, MANAGE_SELL_OFFER};

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid value {value:?} for {key}")]
	Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
	pub horizon_url: String,
	pub listen_addr: SocketAddr,
	pub http_timeout: Duration,
	pub ingest: IngestConfig,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Build the configuration from an arbitrary key lookup; unset keys take
	/// their defaults.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let horizon_url = lookup("HORIZON_URL").unwrap_or_else(|| "http://127.0.0.1:8000".to_string());

		Ok(Config {
			horizon_url,
			listen_addr: parse(&lookup, "LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
			http_timeout: Duration::from_secs(parse(&lookup, "HTTP_TIMEOUT_SECS", 30)?),
			ingest: IngestConfig {
				backoff: BackoffConfig {
					initial_interval: Duration::from_millis(parse(
						&lookup,
						"RECONNECT_INITIAL_MS",
						500,
					)?),
					max_interval: Duration::from_millis(parse(
						&lookup,
						"RECONNECT_MAX_MS",
						30_000,
					)?),
				},
				cursor_max_attempts: parse(&lookup, "CURSOR_MAX_ATTEMPTS", 5)?,
				stream_idle_timeout: Duration::from_secs(parse(&lookup, "STREAM_IDLE_SECS", 60)?),
				fetch: FetchConfig {
					offer_type: parse(&lookup, "OFFER_OPERATION_TYPE", MANAGE_SELL_OFFER)?,
					page_limit: parse(&lookup, "OPERATIONS_PAGE_LIMIT", 200)?,
				},
			},
		})
	}
}

fn parse<T: FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	key: &'static str,
	default: T,
) -> Result<T, ConfigError> {
	match lookup(key) {
		Some(value) => value
			.trim()
			.parse()
			.map_err(|_| ConfigError::Invalid { key, value }),
		None => Ok(default),
	}
}
