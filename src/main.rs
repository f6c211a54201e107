use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use horizon_offer_indexer::api;
use horizon_offer_indexer::config::Config;
use horizon_offer_indexer::horizon::HorizonClient;
use horizon_offer_indexer::ingest::IngestionLoop;
use horizon_offer_indexer::store::RecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	let config = Config::from_env()?;
	info!("Starting offer indexer against {}", config.horizon_url);

	let client = Arc::new(HorizonClient::new(&config.horizon_url, config.http_timeout)?);
	let store = Arc::new(RecordStore::new());
	let cancel = CancellationToken::new();

	let ingestion = tokio::spawn(
		IngestionLoop::new(client, store.clone(), config.ingest.clone()).run(cancel.clone()),
	);

	tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), cancel.clone()));

	// A fatal ingestion error takes the HTTP server down with it.
	let ingestion = {
		let cancel = cancel.clone();
		tokio::spawn(async move {
			let result = ingestion.await;
			cancel.cancel();
			result
		})
	};

	let listener = TcpListener::bind(config.listen_addr).await?;
	info!("Listening on {}", config.listen_addr);
	axum::serve(listener, api::create_router(api::AppState::new(store)))
		.with_graceful_shutdown(cancel.clone().cancelled_owned())
		.await?;

	match ingestion.await?? {
		Ok(stats) => {
			info!("Stopped: {}", stats.summary());
			Ok(())
		}
		Err(e) => {
			error!("Ledger ingestion failed: {}", e);
			Err(e.into())
		}
	}
}

/// Cancel once `signal` fires. A signal that cannot be installed is logged and
/// leaves the service running.
async fn cancel_on_signal(signal: impl Future<Output = io::Result<()>>, cancel: CancellationToken) {
	match signal.await {
		Ok(()) => {
			info!("Shutdown requested");
			cancel.cancel();
		}
		Err(e) => error!("Failed to listen for shutdown signal: {}", e),
	}
}
