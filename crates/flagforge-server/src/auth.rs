// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Control Plane authentication: a single shared secret, compared in
//! constant time, accepted as either `X-API-Key: <secret>` or
//! `Authorization: Bearer <secret>` (`spec.md` §6).

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::state::AppState;

fn extract_presented_key(request: &Request) -> Option<&str> {
	if let Some(value) = request.headers().get("X-API-Key").and_then(|h| h.to_str().ok()) {
		return Some(value);
	}

	request
		.headers()
		.get("Authorization")
		.and_then(|h| h.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.map(str::trim)
}

pub async fn require_api_key(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Result<Response, StatusCode> {
	let Some(expected) = state.api_key.as_ref() else {
		warn!("control plane auth failed: no API_KEY configured");
		return Err(StatusCode::UNAUTHORIZED);
	};

	let Some(presented) = extract_presented_key(&request) else {
		warn!("control plane auth failed: missing credential");
		return Err(StatusCode::UNAUTHORIZED);
	};

	let expected_bytes = expected.expose().as_bytes();
	let presented_bytes = presented.as_bytes();

	let matches = expected_bytes.len() == presented_bytes.len()
		&& bool::from(expected_bytes.ct_eq(presented_bytes));

	if matches {
		Ok(next.run(request).await)
	} else {
		warn!("control plane auth failed: credential mismatch");
		Err(StatusCode::UNAUTHORIZED)
	}
}
