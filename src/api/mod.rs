//! Read-only HTTP surface over the record store.

mod error;
mod handlers;

pub use error::ApiError;

use crate::store::RecordStore;
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
	pub store: Arc<RecordStore>,
}

impl AppState {
	pub fn new(store: Arc<RecordStore>) -> Self {
		Self { store }
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/ledger", get(handlers::get_ledger))
		.route("/offers", get(handlers::get_offers))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
