// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Evaluation Service: cache-miss -> store -> cache-fill -> Rule Engine,
//! per `spec.md` §4.5's order of operations. This is the one function both
//! `/evaluate` and `/evaluate/batch` drive; it never returns an error to a
//! well-formed request — every fault degrades to the caller's default value
//! with a diagnostic reason.

use std::time::{Duration, Instant};

use flagforge_core::{Decision, EvaluationReason, ResolvedFlagConfig, TypedValue, UserContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::state::AppState;

pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const EVALUATION_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
	pub flag_key: String,
	#[serde(default)]
	pub user_context: UserContext,
	pub environment: Option<String>,
	pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateResponse {
	pub flag_key: String,
	pub value: Value,
	pub variant_key: Option<String>,
	pub reason: EvaluationReason,
	pub timestamp: chrono::DateTime<chrono::Utc>,
	#[serde(skip)]
	enabled: bool,
}

impl EvaluateResponse {
	fn default_for(flag_key: &str, default_value: &Value, reason: EvaluationReason) -> Self {
		Self {
			flag_key: flag_key.to_string(),
			value: default_value.clone(),
			variant_key: None,
			reason,
			timestamp: chrono::Utc::now(),
			enabled: false,
		}
	}
}

/// Evaluates one flag. Never errors: every fault path returns a response
/// carrying `default_value` and a diagnostic `reason`, per `spec.md` §4.5.
#[instrument(skip(state, request), fields(flag_key = %request.flag_key))]
pub async fn evaluate(state: &AppState, request: &EvaluateRequest) -> EvaluateResponse {
	let environment = request
		.environment
		.clone()
		.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
	let default_value = request.default_value.clone().unwrap_or(Value::Bool(false));

	let started = Instant::now();
	let result = tokio::time::timeout(
		EVALUATION_DEADLINE,
		evaluate_inner(state, &request.flag_key, &environment, &request.user_context, &default_value),
	)
	.await;

	let response = match result {
		Ok(response) => response,
		Err(_) => {
			warn!(flag_key = %request.flag_key, "evaluation exceeded deadline");
			EvaluateResponse::default_for(&request.flag_key, &default_value, EvaluationReason::EvaluationError)
		}
	};

	state.metrics.record_evaluation(
		&request.flag_key,
		&environment,
		response.enabled,
		response.reason.as_str(),
		started.elapsed().as_secs_f64(),
	);

	spawn_evaluation_record(state, &request.flag_key, &environment, &response);

	response
}

/// Best-effort write to `flag_evaluations`; never allowed to affect the
/// response or its latency.
fn spawn_evaluation_record(state: &AppState, flag_key: &str, environment: &str, response: &EvaluateResponse) {
	let store = state.store.clone();
	let flag_key = flag_key.to_string();
	let environment = environment.to_string();
	let result = if response.enabled { "enabled" } else { "disabled" }.to_string();
	let reason = response.reason.as_str().to_string();
	tokio::spawn(async move {
		if let Err(e) = store.record_evaluation(&flag_key, &environment, &result, &reason).await {
			warn!(flag_key, environment, error = %e, "failed to record evaluation");
		}
	});
}

async fn evaluate_inner(
	state: &AppState,
	flag_key: &str,
	environment: &str,
	context: &UserContext,
	default_value: &Value,
) -> EvaluateResponse {
	let resolved = match fetch_resolved(state, flag_key, environment).await {
		Fetch::Found(resolved) => resolved,
		Fetch::NotFound => {
			return EvaluateResponse::default_for(flag_key, default_value, EvaluationReason::FlagNotFound)
		}
		Fetch::UpstreamError => {
			return EvaluateResponse::default_for(flag_key, default_value, EvaluationReason::EvaluationError)
		}
	};

	if !resolved.flag.active {
		return EvaluateResponse::default_for(flag_key, default_value, EvaluationReason::FlagNotFound);
	}

	let decision = flagforge_core::evaluate(
		flag_key,
		resolved.flag.flag_type,
		&resolved.config,
		&resolved.variants,
		&resolved.rules,
		context,
	);

	let value = typed_value_for(&decision, &resolved, default_value);

	EvaluateResponse {
		flag_key: flag_key.to_string(),
		value,
		variant_key: Some(decision.variant_key.clone()),
		reason: decision.reason,
		timestamp: chrono::Utc::now(),
		enabled: decision.enabled,
	}
}

fn typed_value_for(decision: &Decision, resolved: &ResolvedFlagConfig, default_value: &Value) -> Value {
	use flagforge_core::FlagType;

	if resolved.flag.flag_type == FlagType::Boolean {
		return Value::Bool(decision.enabled && decision.variant_key == "true");
	}

	if !decision.enabled {
		return default_value.clone();
	}

	let Some(variant) = resolved.variants.iter().find(|v| v.key == decision.variant_key) else {
		return default_value.clone();
	};

	match variant.typed_value(resolved.flag.flag_type) {
		TypedValue::Boolean(b) => Value::Bool(b),
		TypedValue::String(s) => Value::String(s),
		TypedValue::Number(n) => serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
		TypedValue::Json(v) => v,
	}
}

enum Fetch {
	Found(ResolvedFlagConfig),
	NotFound,
	UpstreamError,
}

/// Step 2-4 of `spec.md` §4.5: read cache, on miss read the store and write
/// through (fire-and-forget; a cache write failure is logged, not fatal).
async fn fetch_resolved(state: &AppState, flag_key: &str, environment: &str) -> Fetch {
	match state.cache.get(flag_key, environment).await {
		Ok(Some(resolved)) => {
			state.metrics.record_cache_hit(flag_key, environment);
			return Fetch::Found(resolved);
		}
		Ok(None) => {
			state.metrics.record_cache_miss(flag_key, environment);
		}
		Err(e) => {
			warn!(flag_key, environment, error = %e, "cache read failed, falling through to store");
			state.metrics.record_cache_miss(flag_key, environment);
		}
	}

	match state.store.get_flag_config(flag_key, environment).await {
		Ok(Some(resolved)) => {
			let cache = state.cache.clone();
			let to_cache = resolved.clone();
			let key = flag_key.to_string();
			let env = environment.to_string();
			tokio::spawn(async move {
				if let Err(e) = cache.set(&key, &env, &to_cache).await {
					warn!(flag_key = %key, environment = %env, error = %e, "cache fill failed");
				}
			});
			Fetch::Found(resolved)
		}
		Ok(None) => Fetch::NotFound,
		Err(e) => {
			warn!(flag_key, environment, error = %e, "store read failed");
			Fetch::UpstreamError
		}
	}
}
