// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Evaluation Service HTTP surface (`spec.md` §6, Evaluation Service
//! block): `/health`, `/stats`, `/evaluate`, `/evaluate/batch`, the cache
//! diagnostic routes, and `/sdk/config`.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use flagforge_core::ResolvedFlagConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::evaluation_service::{self, EvaluateRequest, EvaluateResponse, DEFAULT_ENVIRONMENT};
use crate::state::AppState;

/// Caller may submit at most this many requests in one `/evaluate/batch`
/// call (`spec.md` §4.5).
pub const MAX_BATCH_SIZE: usize = 50;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/stats", get(stats))
		.route("/evaluate", post(evaluate))
		.route("/evaluate/batch", post(evaluate_batch))
		.route("/cache", get(list_cache))
		.route("/cache/{flag_key}", delete(invalidate_cache))
		.route("/sdk/config", get(sdk_config))
		.with_state(state)
}

#[derive(Serialize)]
struct HealthBody {
	status: &'static str,
	service: &'static str,
	timestamp: chrono::DateTime<chrono::Utc>,
}

async fn health(State(state): State<AppState>) -> Response {
	match state.store.list_environments().await {
		Ok(_) => (
			StatusCode::OK,
			Json(HealthBody {
				status: "healthy",
				service: "flagforge-evaluation-service",
				timestamp: chrono::Utc::now(),
			}),
		)
			.into_response(),
		Err(_) => (
			StatusCode::SERVICE_UNAVAILABLE,
			Json(HealthBody {
				status: "unhealthy",
				service: "flagforge-evaluation-service",
				timestamp: chrono::Utc::now(),
			}),
		)
			.into_response(),
	}
}

#[derive(Serialize)]
struct StatsBody {
	cached_flags: usize,
	total_flags: usize,
}

async fn stats(State(state): State<AppState>) -> Response {
	let cached_flags = state.cache.cached_flag_keys().await.map(|keys| keys.len()).unwrap_or(0);
	let total_flags = state.store.list_flags().await.map(|flags| flags.len()).unwrap_or(0);
	Json(StatsBody { cached_flags, total_flags }).into_response()
}

async fn evaluate(State(state): State<AppState>, Json(request): Json<EvaluateRequest>) -> Response {
	if request.flag_key.trim().is_empty() {
		return (
			StatusCode::BAD_REQUEST,
			Json(serde_json::json!({"error": "validation_error", "message": "flag_key is required"})),
		)
			.into_response();
	}

	let response = evaluation_service::evaluate(&state, &request).await;
	(StatusCode::OK, Json(response)).into_response()
}

#[derive(Deserialize)]
struct BatchRequest {
	requests: Vec<EvaluateRequest>,
}

#[derive(Serialize)]
struct BatchResponse {
	results: Vec<EvaluateResponse>,
}

async fn evaluate_batch(State(state): State<AppState>, Json(body): Json<BatchRequest>) -> Response {
	if body.requests.is_empty() || body.requests.iter().any(|r| r.flag_key.trim().is_empty()) {
		return (
			StatusCode::BAD_REQUEST,
			Json(serde_json::json!({"error": "validation_error", "message": "each request requires a flag_key"})),
		)
			.into_response();
	}

	if body.requests.len() > MAX_BATCH_SIZE {
		return (
			StatusCode::BAD_REQUEST,
			Json(serde_json::json!({
				"error": "validation_error",
				"message": format!("at most {MAX_BATCH_SIZE} requests are permitted per batch"),
			})),
		)
			.into_response();
	}

	let futures = body.requests.iter().map(|req| evaluation_service::evaluate(&state, req));
	let results = futures::future::join_all(futures).await;

	(StatusCode::OK, Json(BatchResponse { results })).into_response()
}

async fn list_cache(State(state): State<AppState>) -> Response {
	match state.cache.cached_flag_keys().await {
		Ok(keys) => Json(serde_json::json!({ "flags": keys })).into_response(),
		Err(e) => (
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(serde_json::json!({"error": "upstream_unavailable", "message": e.to_string()})),
		)
			.into_response(),
	}
}

#[derive(Deserialize)]
struct CacheInvalidateQuery {
	environment: Option<String>,
}

async fn invalidate_cache(
	State(state): State<AppState>,
	Path(flag_key): Path<String>,
	Query(query): Query<CacheInvalidateQuery>,
) -> Response {
	let result = match query.environment {
		Some(environment) => state.cache.invalidate_one(&flag_key, &environment).await,
		None => state.cache.invalidate_all_envs(&flag_key).await,
	};

	match result {
		Ok(()) => StatusCode::NO_CONTENT.into_response(),
		Err(e) => (
			StatusCode::INTERNAL_SERVER_ERROR,
			Json(serde_json::json!({"error": "upstream_unavailable", "message": e.to_string()})),
		)
			.into_response(),
	}
}

#[derive(Deserialize)]
struct SdkConfigQuery {
	environment: Option<String>,
}

#[derive(Serialize)]
struct SdkConfigBody {
	environment: String,
	poll_interval_ms: u64,
	flags: Vec<ResolvedFlagConfig>,
}

/// ETag-conditional; returns `304 Not Modified` when `If-None-Match` matches
/// the current snapshot's digest. The payload is the full resolved snapshot
/// set for the environment, not a bare descriptor — see `DESIGN.md`'s open
/// question #2.
async fn sdk_config(
	State(state): State<AppState>,
	Query(query): Query<SdkConfigQuery>,
	headers: HeaderMap,
) -> Response {
	let environment = query.environment.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

	let flags = match state.store.list_flags().await {
		Ok(flags) => flags,
		Err(e) => {
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(serde_json::json!({"error": "upstream_unavailable", "message": e.to_string()})),
			)
				.into_response();
		}
	};

	let resolved_futures = flags
		.iter()
		.filter(|f| f.active)
		.map(|f| state.store.get_flag_config(&f.key, &environment));
	let resolved: Vec<ResolvedFlagConfig> = futures::future::join_all(resolved_futures)
		.await
		.into_iter()
		.filter_map(|r| r.ok().flatten())
		.collect();

	let body = SdkConfigBody {
		environment,
		poll_interval_ms: 30_000,
		flags: resolved,
	};

	let payload = match serde_json::to_vec(&body) {
		Ok(bytes) => bytes,
		Err(e) => {
			return (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(serde_json::json!({"error": "internal_error", "message": e.to_string()})),
			)
				.into_response();
		}
	};
	let etag = format!("\"{}\"", hex::encode(Sha256::digest(&payload)));

	if headers
		.get("if-none-match")
		.and_then(|h| h.to_str().ok())
		.map(|presented| presented == etag)
		.unwrap_or(false)
	{
		return StatusCode::NOT_MODIFIED.into_response();
	}

	let mut response = (StatusCode::OK, payload).into_response();
	response.headers_mut().insert(
		axum::http::header::CONTENT_TYPE,
		"application/json".parse().unwrap(),
	);
	response
		.headers_mut()
		.insert(axum::http::header::ETAG, etag.parse().unwrap());
	response
}
