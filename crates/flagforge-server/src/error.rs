// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! HTTP-facing error type for both the Evaluation Service and the Control
//! Plane. Maps the error kinds from `spec.md` §7 onto status codes; the
//! evaluation routes mostly don't construct these directly (a fault on that
//! path degrades to a 200 with a diagnostic reason instead, per §4.5).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("validation error: {0}")]
	Validation(String),
	#[error("not found: {0}")]
	NotFound(String),
	#[error("conflict: {0}")]
	Conflict(String),
	#[error("unauthorized")]
	Unauthorized,
	#[error("request exceeded its service deadline")]
	Timeout,
	#[error("upstream unavailable: {0}")]
	UpstreamUnavailable(String),
	#[error("internal error: {0}")]
	Internal(String),
	#[error(transparent)]
	Store(#[from] flagforge_store::StoreError),
	#[error(transparent)]
	Cache(#[from] flagforge_cache::CacheError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	message: String,
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, kind, message) = match &self {
			ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
			ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
			ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
			ApiError::Unauthorized => (
				StatusCode::UNAUTHORIZED,
				"unauthorized",
				"unauthorized".to_string(),
			),
			ApiError::Timeout => (
				StatusCode::REQUEST_TIMEOUT,
				"timeout",
				"request exceeded its service deadline".to_string(),
			),
			ApiError::UpstreamUnavailable(msg) => {
				(StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable", msg.clone())
			}
			ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
			ApiError::Store(flagforge_store::StoreError::FlagNotFound(key)) => {
				(StatusCode::NOT_FOUND, "not_found", format!("flag not found: {key}"))
			}
			ApiError::Store(flagforge_store::StoreError::EnvironmentNotFound(name)) => (
				StatusCode::BAD_REQUEST,
				"validation_error",
				format!("unknown environment: {name}"),
			),
			ApiError::Store(flagforge_store::StoreError::FlagAlreadyExists(key)) => {
				(StatusCode::CONFLICT, "conflict", format!("flag already exists: {key}"))
			}
			ApiError::Store(e) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"upstream_unavailable",
				e.to_string(),
			),
			ApiError::Cache(e) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				"upstream_unavailable",
				e.to_string(),
			),
		};

		let body = ErrorBody {
			error: kind.to_string(),
			message,
		};
		(status, Json(body)).into_response()
	}
}

pub type Result<T> = std::result::Result<T, ApiError>;
