// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Metrics HTTP surface (`spec.md` §6): `/metrics` text exposition and
//! `/health`.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/metrics", get(metrics))
		.route("/health", get(health))
		.with_state(state)
}

async fn metrics(State(state): State<AppState>) -> Response {
	let body = state.metrics.encode();
	(
		StatusCode::OK,
		[(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
		body,
	)
		.into_response()
}

#[derive(Serialize)]
struct HealthBody {
	status: &'static str,
	service: &'static str,
}

async fn health() -> Response {
	Json(HealthBody {
		status: "healthy",
		service: "flagforge-metrics",
	})
	.into_response()
}
