// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Control Plane HTTP surface (`spec.md` §6, Control Plane block):
//! flag CRUD, per-environment config updates, toggle, kill switch, and the
//! system/cache diagnostic routes. Every route but `/health` sits behind
//! [`crate::auth::require_api_key`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use flagforge_core::{AttributeOperator, Flag, FlagType, ResolvedFlagConfig, RuleType, Variant};
use flagforge_store::{FlagConfigUpdate, FlagMetadataUpdate, NewFlag, NewRule};
use serde::{Deserialize, Serialize};

use crate::auth::require_api_key;
use crate::error::{ApiError, Result};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/flags", get(list_flags).post(create_flag))
		.route(
			"/api/flags/{key}",
			get(get_flag).put(update_flag).delete(delete_flag),
		)
		.route("/api/flags/{key}/environments/{env}", put(update_flag_config))
		.route(
			"/api/flags/{key}/environments/{env}/toggle",
			patch(toggle_flag),
		)
		.route("/api/flags/{key}/kill-switch", post(kill_switch))
		.route("/api/system/overview", get(system_overview))
		.route("/api/cache/status", get(cache_status))
		.route("/api/cache/flags/{key}", delete(invalidate_flag_cache))
		.layer(middleware::from_fn_with_state(state.clone(), require_api_key))
		.with_state(state)
}

const ACTOR: &str = "control-plane";

#[derive(Debug, Deserialize)]
struct NewVariantBody {
	key: String,
	value: String,
	weight: u32,
}

#[derive(Debug, Deserialize)]
struct CreateFlagRequest {
	key: String,
	name: String,
	description: Option<String>,
	flag_type: FlagType,
	#[serde(default)]
	tags: Vec<String>,
	#[serde(default)]
	variants: Vec<NewVariantBody>,
	/// Environments to materialize a config row for. Defaults to every
	/// known environment when omitted, matching `spec.md` §3's "one
	/// configuration row per known environment" requirement.
	environments: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct FlagBody {
	flag: Flag,
}

async fn list_flags(State(state): State<AppState>) -> Result<Response> {
	let flags = state.store.list_flags().await?;
	Ok(Json(serde_json::json!({ "flags": flags })).into_response())
}

async fn create_flag(
	State(state): State<AppState>,
	Json(request): Json<CreateFlagRequest>,
) -> Result<Response> {
	if !Flag::validate_key(&request.key) {
		return Err(ApiError::Validation(format!(
			"invalid flag key: {}",
			request.key
		)));
	}

	let environments = match request.environments {
		Some(envs) => envs,
		None => state
			.store
			.list_environments()
			.await?
			.into_iter()
			.map(|e| e.name)
			.collect(),
	};
	if environments.is_empty() {
		return Err(ApiError::Validation(
			"at least one environment must exist to create a flag".to_string(),
		));
	}

	let variants: Vec<Variant> = request
		.variants
		.into_iter()
		.map(|v| Variant {
			key: v.key,
			value: v.value,
			weight: v.weight,
		})
		.collect();

	let created = state
		.store
		.create_flag(
			NewFlag {
				key: request.key,
				name: request.name,
				description: request.description,
				flag_type: request.flag_type,
				tags: request.tags,
				variants,
				environments,
			},
			ACTOR,
		)
		.await?;

	state.metrics.record_config_change("create");
	Ok((
		StatusCode::CREATED,
		Json(serde_json::json!({
			"flag": created.flag,
			"variants": created.variants,
			"configs": created.configs,
		})),
	)
		.into_response())
}

async fn get_flag(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response> {
	let flag = state
		.store
		.get_flag(&key)
		.await?
		.ok_or_else(|| ApiError::NotFound(format!("flag not found: {key}")))?;
	Ok(Json(FlagBody { flag }).into_response())
}

#[derive(Debug, Deserialize, Default)]
struct UpdateFlagRequest {
	name: Option<String>,
	description: Option<String>,
	tags: Option<Vec<String>>,
}

async fn update_flag(
	State(state): State<AppState>,
	Path(key): Path<String>,
	Json(request): Json<UpdateFlagRequest>,
) -> Result<Response> {
	state
		.store
		.get_flag(&key)
		.await?
		.ok_or_else(|| ApiError::NotFound(format!("flag not found: {key}")))?;

	let flag = state
		.store
		.update_flag_metadata(
			&key,
			FlagMetadataUpdate {
				name: request.name,
				description: request.description.map(Some),
				tags: request.tags,
			},
			ACTOR,
		)
		.await?;
	Ok(Json(FlagBody { flag }).into_response())
}

async fn delete_flag(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response> {
	state
		.store
		.get_flag(&key)
		.await?
		.ok_or_else(|| ApiError::NotFound(format!("flag not found: {key}")))?;

	let deleted = state.store.delete_flag(&key, ACTOR).await?;
	if !deleted {
		return Err(ApiError::NotFound(format!("flag not found: {key}")));
	}

	state.cache.invalidate_all_envs(&key).await.map_err(|e| {
		ApiError::UpstreamUnavailable(format!("flag deleted but cache invalidation failed: {e}"))
	})?;
	state.metrics.record_invalidation(&key, "all");
	state.metrics.record_config_change("delete");

	Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Deserialize)]
struct NewRuleBody {
	rule_type: RuleType,
	#[serde(default)]
	priority: i32,
	attribute_name: Option<String>,
	attribute_operator: Option<AttributeOperator>,
	attribute_value: Option<String>,
	percentage: Option<u32>,
	user_ids: Option<String>,
	variant_key: Option<String>,
}

impl From<NewRuleBody> for NewRule {
	fn from(body: NewRuleBody) -> Self {
		NewRule {
			rule_type: body.rule_type,
			priority: body.priority,
			attribute_name: body.attribute_name,
			attribute_operator: body.attribute_operator,
			attribute_value: body.attribute_value,
			percentage: body.percentage,
			user_ids: body.user_ids,
			variant_key: body.variant_key,
		}
	}
}

#[derive(Debug, Deserialize)]
struct UpdateFlagConfigRequest {
	enabled: Option<bool>,
	default_variant: Option<String>,
	rollout_percentage: Option<u32>,
	/// A present-but-`null` value is indistinguishable from an absent field
	/// once deserialized through a plain `Option`, so this endpoint can set
	/// `config_blob` but not explicitly clear it back to `null`; clearing it
	/// would need the field to round-trip through a nested-option wrapper,
	/// which nothing else in this crate needs yet.
	config_blob: Option<serde_json::Value>,
	variants: Option<Vec<NewVariantBody>>,
	rules: Option<Vec<NewRuleBody>>,
}

async fn update_flag_config(
	State(state): State<AppState>,
	Path((key, env)): Path<(String, String)>,
	Json(request): Json<UpdateFlagConfigRequest>,
) -> Result<Response> {
	if let Some(percentage) = request.rollout_percentage {
		if percentage > 100 {
			return Err(ApiError::Validation(format!(
				"rollout_percentage out of range: {percentage}"
			)));
		}
	}

	let update = FlagConfigUpdate {
		enabled: request.enabled,
		default_variant: request.default_variant,
		rollout_percentage: request.rollout_percentage,
		config_blob: request.config_blob.map(Some),
		variants: request.variants.map(|variants| {
			variants
				.into_iter()
				.map(|v| Variant {
					key: v.key,
					value: v.value,
					weight: v.weight,
				})
				.collect()
		}),
		rules: request.rules.map(|rules| rules.into_iter().map(NewRule::from).collect()),
	};

	let resolved = state.store.update_flag_config(&key, &env, update, ACTOR).await?;
	invalidate_one(&state, &key, &env).await?;
	state.metrics.record_config_change("update");

	Ok(Json(resolved).into_response())
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
	enabled: bool,
}

async fn toggle_flag(
	State(state): State<AppState>,
	Path((key, env)): Path<(String, String)>,
	Json(request): Json<ToggleRequest>,
) -> Result<Response> {
	let resolved = state
		.store
		.toggle_flag(&key, &env, request.enabled, ACTOR)
		.await?;
	invalidate_one(&state, &key, &env).await?;
	state.metrics.record_config_change("toggle");

	Ok(Json(resolved).into_response())
}

#[derive(Debug, Deserialize, Default)]
struct KillSwitchRequest {
	reason: Option<String>,
}

async fn kill_switch(
	State(state): State<AppState>,
	Path(key): Path<String>,
	body: Option<Json<KillSwitchRequest>>,
) -> Result<Response> {
	let reason = body.and_then(|b| b.0.reason).unwrap_or_else(|| "unspecified".to_string());
	let actor = format!("{ACTOR} (kill_switch reason: {reason})");

	let resolved: Vec<ResolvedFlagConfig> = state.store.set_kill_switch(&key, &actor).await?;

	state.cache.invalidate_all_envs(&key).await.map_err(|e| {
		ApiError::UpstreamUnavailable(format!("kill switch applied but cache invalidation failed: {e}"))
	})?;
	state.metrics.record_invalidation(&key, "all");
	state.metrics.record_config_change("kill_switch");
	state.metrics.record_kill_switch(&key);

	Ok(Json(serde_json::json!({ "configs": resolved })).into_response())
}

async fn invalidate_one(state: &AppState, flag_key: &str, environment: &str) -> Result<()> {
	state
		.cache
		.invalidate_one(flag_key, environment)
		.await
		.map_err(|e| {
			ApiError::UpstreamUnavailable(format!(
				"store updated but cache invalidation failed: {e}"
			))
		})?;
	state.metrics.record_invalidation(flag_key, environment);
	Ok(())
}

#[derive(Debug, Serialize)]
struct SystemOverviewBody {
	total_flags: usize,
	active_flags: usize,
	environments: Vec<String>,
}

async fn system_overview(State(state): State<AppState>) -> Result<Response> {
	let flags = state.store.list_flags().await?;
	let environments = state.store.list_environments().await?;

	Ok(Json(SystemOverviewBody {
		total_flags: flags.len(),
		active_flags: flags.iter().filter(|f| f.active).count(),
		environments: environments.into_iter().map(|e| e.name).collect(),
	})
	.into_response())
}

#[derive(Debug, Serialize)]
struct CacheStatusBody {
	cached_flags: usize,
	hits: u64,
	misses: u64,
	invalidations: u64,
}

async fn cache_status(State(state): State<AppState>) -> Result<Response> {
	let cached_flags = state.cache.cached_flag_keys().await?.len();
	let stats = state.cache.stats().await;

	Ok(Json(CacheStatusBody {
		cached_flags,
		hits: stats.hits,
		misses: stats.misses,
		invalidations: stats.invalidations,
	})
	.into_response())
}

async fn invalidate_flag_cache(
	State(state): State<AppState>,
	Path(key): Path<String>,
) -> Result<Response> {
	state.cache.invalidate_all_envs(&key).await?;
	state.metrics.record_invalidation(&key, "all");
	Ok(StatusCode::NO_CONTENT.into_response())
}
