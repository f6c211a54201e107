use crate::store::QueryError;

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("{0}")]
	BadRequest(String),

	#[error("404: Not found")]
	NotFound,
}

impl From<QueryError> for ApiError {
	fn from(err: QueryError) -> Self {
		ApiError::BadRequest(err.to_string())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = match self {
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::NotFound => StatusCode::NOT_FOUND,
		};

		let body = Json(json!({
			"errors": self.to_string()
		}));

		(status, body).into_response()
	}
}
