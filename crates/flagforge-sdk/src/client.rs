// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The SDK's evaluation client (`spec.md` §4.7). State machine:
//! `Initializing` does a first `/sdk/config` fetch, then transitions to
//! `Ready` (fetch succeeded, emits `ready`) or straight into `Polling` with
//! an `error` event (fetch failed, but the client still comes up). From
//! there a single `tokio::spawn`ed task polls `/sdk/config` with a
//! conditional `If-None-Match` on an interval until `destroy()`/`Drop`
//! cancels it and flushes any pending analytics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use flagforge_core::{Decision, EvaluationReason, FlagType, ResolvedFlagConfig, TypedValue, UserContext};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::analytics::{hash_attributes, AnalyticsBuffer, FlagExposure};
use crate::config::SdkConfig;
use crate::error::{Result, SdkError};
use crate::events::{
	AnalyticsFlushEvent, ConfigUpdatedEvent, ErrorEvent, EvaluationErrorEvent, EvaluationEvent,
	EventBus, PollErrorEvent, ReadyEvent,
};
use crate::snapshot::Snapshot;

/// State shared between [`FlagsClient`] and its background poll task.
struct Shared {
	config: SdkConfig,
	http: reqwest::Client,
	snapshot: Snapshot,
	events: EventBus,
	analytics: AnalyticsBuffer,
}

/// Evaluates flags against a FlagForge Evaluation Service: locally when the
/// poll loop already holds the flag's snapshot, remotely otherwise. Cheap to
/// clone the handle returned by [`FlagsClient::builder`] is not supported
/// directly; share one client behind an `Arc` instead.
pub struct FlagsClient {
	shared: Arc<Shared>,
	destroyed: Arc<AtomicBool>,
	poll_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Builds an [`SdkConfig`] and connects in one step.
pub struct FlagsClientBuilder {
	config: SdkConfig,
}

impl FlagsClientBuilder {
	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.config.environment = environment.into();
		self
	}

	pub fn poll_interval(mut self, interval: Duration) -> Self {
		self.config.poll_interval = interval;
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.config.timeout = timeout;
		self
	}

	pub fn enable_analytics(mut self, enabled: bool) -> Self {
		self.config.enable_analytics = enabled;
		self
	}

	pub fn enable_local_evaluation(mut self, enabled: bool) -> Self {
		self.config.enable_local_evaluation = enabled;
		self
	}

	/// Registers the value `evaluate()` (the no-explicit-default convenience
	/// method) degrades to for `flag_key` when every evaluation path fails.
	pub fn fallback_value(mut self, flag_key: impl Into<String>, value: Value) -> Self {
		self.config.fallback_values.insert(flag_key.into(), value);
		self
	}

	pub async fn build(self) -> Result<FlagsClient> {
		FlagsClient::connect(self.config).await
	}
}

#[derive(Deserialize)]
struct SdkConfigResponse {
	#[allow(dead_code)]
	environment: String,
	#[allow(dead_code)]
	poll_interval_ms: u64,
	flags: Vec<ResolvedFlagConfig>,
}

#[derive(Deserialize)]
struct RemoteEvaluateResponse {
	#[allow(dead_code)]
	flag_key: String,
	value: Value,
	variant_key: Option<String>,
	reason: EvaluationReason,
}

enum FetchOutcome {
	Updated { flags: Vec<ResolvedFlagConfig>, etag: Option<String> },
	NotModified,
}

async fn fetch_config(shared: &Shared) -> Result<FetchOutcome> {
	let mut request = shared
		.http
		.get(format!("{}/sdk/config", shared.config.base_url))
		.query(&[("environment", shared.config.environment.as_str())])
		.header("X-API-Key", &shared.config.api_key)
		.timeout(shared.config.timeout);

	if let Some(etag) = shared.snapshot.etag() {
		request = request.header(reqwest::header::IF_NONE_MATCH, etag);
	}

	let response = request.send().await?;

	if response.status() == reqwest::StatusCode::NOT_MODIFIED {
		return Ok(FetchOutcome::NotModified);
	}

	if !response.status().is_success() {
		let status = response.status().as_u16();
		let message = response.text().await.unwrap_or_default();
		return Err(SdkError::ServerError { status, message });
	}

	let etag = response
		.headers()
		.get(reqwest::header::ETAG)
		.and_then(|h| h.to_str().ok())
		.map(|s| s.to_string());

	let body: SdkConfigResponse = response.json().await.map_err(|e| SdkError::ParseFailed(e.to_string()))?;

	Ok(FetchOutcome::Updated { flags: body.flags, etag })
}

fn spawn_poll_loop(shared: Arc<Shared>, destroyed: Arc<AtomicBool>) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			tokio::time::sleep(shared.config.poll_interval).await;
			if destroyed.load(Ordering::SeqCst) {
				break;
			}

			match fetch_config(&shared).await {
				Ok(FetchOutcome::Updated { flags, etag }) => {
					let flag_count = flags.len();
					shared.snapshot.replace(flags, etag.clone());
					shared.events.emit_config_updated(ConfigUpdatedEvent {
						environment: shared.config.environment.clone(),
						flag_count,
						etag,
						timestamp: Utc::now(),
					});
				}
				Ok(FetchOutcome::NotModified) => {}
				Err(e) => {
					warn!(error = %e, environment = %shared.config.environment, "sdk config poll failed");
					shared.events.emit_poll_error(PollErrorEvent {
						message: e.to_string(),
						timestamp: Utc::now(),
					});
				}
			}
		}
	})
}

/// Replicates the Evaluation Service's `typed_value_for`: boolean flags
/// collapse to the `"true"` variant key, everything else parses its chosen
/// variant's stored value according to the flag's type. Kept as a separate
/// copy rather than a shared private function, since the two crates don't
/// share an internal module.
fn typed_value_for(decision: &Decision, resolved: &ResolvedFlagConfig, default_value: &Value) -> Value {
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

fn merged_attributes(context: &UserContext) -> HashMap<String, String> {
	let mut merged = context.attributes.clone();
	merged.extend(context.custom_attributes.clone());
	merged
}

/// One flag lookup for [`FlagsClient::evaluate_batch`].
pub struct BatchRequest {
	pub flag_key: String,
	pub context: UserContext,
	pub default_value: Value,
}

impl FlagsClient {
	pub fn builder(api_key: impl Into<String>, base_url: impl Into<String>) -> FlagsClientBuilder {
		FlagsClientBuilder {
			config: SdkConfig::new(api_key, base_url),
		}
	}

	/// Performs the first `/sdk/config` fetch and starts the poll loop. A
	/// failed first fetch still leaves the client usable (it emits `error`
	/// rather than failing `connect`): the poll loop will keep retrying, and
	/// `evaluate_flag` falls back to remote evaluation or the caller's
	/// default in the meantime.
	pub async fn connect(config: SdkConfig) -> Result<Self> {
		let enable_analytics = config.enable_analytics;
		let http = flagforge_http::new_client_with_timeout(config.timeout);

		let shared = Arc::new(Shared {
			config,
			http,
			snapshot: Snapshot::default(),
			events: EventBus::default(),
			analytics: AnalyticsBuffer::new(enable_analytics),
		});

		match fetch_config(&shared).await {
			Ok(FetchOutcome::Updated { flags, etag }) => {
				let flag_count = flags.len();
				shared.snapshot.replace(flags, etag);
				shared.events.emit_ready(ReadyEvent {
					flag_count,
					timestamp: Utc::now(),
				});
			}
			Ok(FetchOutcome::NotModified) => {
				shared.events.emit_ready(ReadyEvent {
					flag_count: 0,
					timestamp: Utc::now(),
				});
			}
			Err(e) => {
				warn!(error = %e, "initial sdk config fetch failed, continuing to polling");
				shared.events.emit_error(ErrorEvent {
					message: e.to_string(),
					timestamp: Utc::now(),
				});
			}
		}

		let destroyed = Arc::new(AtomicBool::new(false));
		let poll_handle = spawn_poll_loop(shared.clone(), destroyed.clone());

		Ok(Self {
			shared,
			destroyed,
			poll_handle: Mutex::new(Some(poll_handle)),
		})
	}

	/// Triggers one out-of-band `/sdk/config` fetch without waiting for the
	/// poll loop's interval.
	pub async fn refresh(&self) -> Result<()> {
		if self.destroyed.load(Ordering::SeqCst) {
			return Err(SdkError::Destroyed);
		}

		match fetch_config(&self.shared).await {
			Ok(FetchOutcome::Updated { flags, etag }) => {
				let flag_count = flags.len();
				self.shared.snapshot.replace(flags, etag.clone());
				self.shared.events.emit_config_updated(ConfigUpdatedEvent {
					environment: self.shared.config.environment.clone(),
					flag_count,
					etag,
					timestamp: Utc::now(),
				});
				Ok(())
			}
			Ok(FetchOutcome::NotModified) => Ok(()),
			Err(e) => {
				self.shared.events.emit_poll_error(PollErrorEvent {
					message: e.to_string(),
					timestamp: Utc::now(),
				});
				Err(e)
			}
		}
	}

	/// Evaluates `flag_key`, falling back to `self`'s configured
	/// `fallback_values` entry (or `Value::Null` if none is registered) when
	/// every evaluation path fails.
	pub async fn evaluate(&self, flag_key: &str, context: &UserContext) -> Value {
		let default_value = self
			.shared
			.config
			.fallback_values
			.get(flag_key)
			.cloned()
			.unwrap_or(Value::Null);
		self.evaluate_flag(flag_key, context, default_value).await
	}

	/// Evaluates one flag: local snapshot hit -> the shared Rule Engine,
	/// else a remote `/evaluate` call, else `default_value` with an
	/// `evaluationError` event (`spec.md` §4.7 step 3).
	pub async fn evaluate_flag(&self, flag_key: &str, context: &UserContext, default_value: Value) -> Value {
		if self.destroyed.load(Ordering::SeqCst) {
			self.emit_evaluation_error(flag_key, "client has been destroyed", &default_value);
			return default_value;
		}

		if self.shared.config.enable_local_evaluation {
			if let Some(resolved) = self.shared.snapshot.get(flag_key) {
				let decision = flagforge_core::evaluate(
					flag_key,
					resolved.flag.flag_type,
					&resolved.config,
					&resolved.variants,
					&resolved.rules,
					context,
				);
				let value = typed_value_for(&decision, &resolved, &default_value);
				self.record_exposure(
					flag_key,
					Some(decision.variant_key.as_str()),
					decision.reason.as_str(),
					&value,
					context,
					true,
				);
				return value;
			}
		}

		match self.remote_evaluate(flag_key, context, &default_value).await {
			Ok(parsed) => {
				self.record_exposure(
					flag_key,
					parsed.variant_key.as_deref(),
					parsed.reason.as_str(),
					&parsed.value,
					context,
					false,
				);
				parsed.value
			}
			Err(e) => {
				self.emit_evaluation_error(flag_key, &e.to_string(), &default_value);
				default_value
			}
		}
	}

	/// Evaluates every request concurrently and assembles a keyed result
	/// map (`spec.md` §4.7's batch evaluation).
	pub async fn evaluate_batch(&self, requests: Vec<BatchRequest>) -> HashMap<String, Value> {
		let futures = requests.iter().map(|request| async move {
			let value = self
				.evaluate_flag(&request.flag_key, &request.context, request.default_value.clone())
				.await;
			(request.flag_key.clone(), value)
		});
		futures::future::join_all(futures).await.into_iter().collect()
	}

	async fn remote_evaluate(
		&self,
		flag_key: &str,
		context: &UserContext,
		default_value: &Value,
	) -> Result<RemoteEvaluateResponse> {
		let body = serde_json::json!({
			"flag_key": flag_key,
			"user_context": context,
			"environment": self.shared.config.environment,
			"default_value": default_value,
		});

		let response = self
			.shared
			.http
			.post(format!("{}/evaluate", self.shared.config.base_url))
			.header("X-API-Key", &self.shared.config.api_key)
			.timeout(self.shared.config.timeout)
			.json(&body)
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status().as_u16();
			let message = response.text().await.unwrap_or_default();
			return Err(SdkError::ServerError { status, message });
		}

		response.json().await.map_err(|e| SdkError::ParseFailed(e.to_string()))
	}

	fn record_exposure(
		&self,
		flag_key: &str,
		variant_key: Option<&str>,
		reason: &str,
		value: &Value,
		context: &UserContext,
		local: bool,
	) {
		let context_hash = hash_attributes(&merged_attributes(context));
		let exposure = FlagExposure::new(
			flag_key,
			variant_key.map(|v| v.to_string()),
			reason,
			context.user_id.clone(),
			context_hash,
		);
		self.shared.analytics.record(exposure);
		self.shared.events.emit_evaluation(EvaluationEvent {
			flag_key: flag_key.to_string(),
			value: value.clone(),
			variant_key: variant_key.map(|v| v.to_string()),
			reason: reason.to_string(),
			local,
			timestamp: Utc::now(),
		});
	}

	fn emit_evaluation_error(&self, flag_key: &str, cause: &str, default_value: &Value) {
		self.shared.events.emit_evaluation_error(EvaluationErrorEvent {
			flag_key: flag_key.to_string(),
			cause: cause.to_string(),
			default_value: default_value.clone(),
			timestamp: Utc::now(),
		});
	}

	/// Drains and returns any buffered exposures, emitting `analyticsFlush`.
	pub fn flush_analytics(&self) -> Vec<FlagExposure> {
		self.shared.analytics.flush(&self.shared.events)
	}

	pub fn snapshot_len(&self) -> usize {
		self.shared.snapshot.len()
	}

	/// Cancels the poll loop and flushes pending analytics. Idempotent;
	/// also runs on `Drop`, so an explicit call is optional but lets a
	/// caller observe the final `analyticsFlush` event deterministically
	/// before the client goes out of scope.
	pub fn destroy(&self) {
		self.shutdown();
	}

	fn shutdown(&self) {
		if self.destroyed.swap(true, Ordering::SeqCst) {
			return;
		}
		if let Some(handle) = self.poll_handle.lock().expect("poll handle mutex poisoned").take() {
			handle.abort();
		}
		self.shared.analytics.flush(&self.shared.events);
	}
}

macro_rules! delegate_subscribe {
	($name:ident, $event:ty) => {
		pub fn $name(&self) -> broadcast::Receiver<$event> {
			self.shared.events.$name()
		}
	};
}

impl FlagsClient {
	delegate_subscribe!(subscribe_ready, ReadyEvent);
	delegate_subscribe!(subscribe_error, ErrorEvent);
	delegate_subscribe!(subscribe_config_updated, ConfigUpdatedEvent);
	delegate_subscribe!(subscribe_evaluation, EvaluationEvent);
	delegate_subscribe!(subscribe_evaluation_error, EvaluationErrorEvent);
	delegate_subscribe!(subscribe_poll_error, PollErrorEvent);
	delegate_subscribe!(subscribe_analytics_flush, AnalyticsFlushEvent);
}

impl Drop for FlagsClient {
	fn drop(&mut self) {
		self.shutdown();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use flagforge_core::ids::{EnvironmentId, FlagConfigId, FlagId};
	use flagforge_core::{Flag, FlagConfig};
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn sample_resolved(key: &str, enabled: bool, rollout_percentage: u32) -> ResolvedFlagConfig {
		ResolvedFlagConfig {
			flag: Flag {
				id: FlagId::new(),
				key: key.to_string(),
				name: key.to_string(),
				description: None,
				flag_type: FlagType::Boolean,
				tags: vec![],
				active: true,
				created_at: Utc::now(),
				updated_at: Utc::now(),
			},
			config: FlagConfig {
				id: FlagConfigId::new(),
				flag_id: FlagId::new(),
				environment_id: EnvironmentId::new(),
				enabled,
				default_variant: "false".to_string(),
				rollout_percentage,
				config_blob: None,
				created_at: Utc::now(),
				updated_at: Utc::now(),
			},
			variants: Flag::default_variants(),
			rules: vec![],
		}
	}

	async fn mount_sdk_config(server: &MockServer, flags: Vec<ResolvedFlagConfig>, etag: &str) {
		Mock::given(method("GET"))
			.and(path("/sdk/config"))
			.and(header("X-API-Key", "test-key"))
			.respond_with(
				ResponseTemplate::new(200)
					.insert_header("ETag", etag)
					.set_body_json(serde_json::json!({
						"environment": "production",
						"poll_interval_ms": 30_000,
						"flags": flags,
					})),
			)
			.mount(server)
			.await;
	}

	#[tokio::test]
	async fn connect_hydrates_snapshot_and_emits_ready() {
		let server = MockServer::start().await;
		mount_sdk_config(&server, vec![sample_resolved("dark_mode", true, 100)], "\"etag-1\"").await;

		let config = SdkConfig::new("test-key", server.uri()).poll_interval_override();
		let client = FlagsClient::connect(config).await.unwrap();

		let mut ready_rx = client.subscribe_ready();
		assert_eq!(client.snapshot_len(), 1);
		// The ready event was emitted before we subscribed, so reaching here
		// without a stored receiver just confirms the snapshot hydrated;
		// assert the channel at least exists and is open.
		assert!(ready_rx.try_recv().is_err());
	}

	#[tokio::test]
	async fn evaluate_flag_uses_local_snapshot_without_a_remote_call() {
		let server = MockServer::start().await;
		mount_sdk_config(&server, vec![sample_resolved("dark_mode", true, 100)], "\"etag-1\"").await;
		// No /evaluate mock registered: a remote call here would 404, proving
		// the local path was actually taken.

		let config = SdkConfig::new("test-key", server.uri()).poll_interval_override();
		let client = FlagsClient::connect(config).await.unwrap();

		let value = client
			.evaluate_flag("dark_mode", &UserContext::anonymous(), Value::Bool(false))
			.await;
		assert_eq!(value, Value::Bool(true));
	}

	#[tokio::test]
	async fn evaluate_flag_falls_back_to_default_when_remote_call_fails() {
		let server = MockServer::start().await;
		mount_sdk_config(&server, vec![], "\"etag-1\"").await;

		let config = SdkConfig::new("test-key", server.uri()).poll_interval_override();
		let client = FlagsClient::connect(config).await.unwrap();
		let mut error_rx = client.subscribe_evaluation_error();

		let value = client
			.evaluate_flag("unknown_flag", &UserContext::anonymous(), Value::Bool(false))
			.await;
		assert_eq!(value, Value::Bool(false));

		let event = error_rx.try_recv().unwrap();
		assert_eq!(event.flag_key, "unknown_flag");
	}

	#[tokio::test]
	async fn refresh_replaces_snapshot_on_200_and_is_a_no_op_on_304() {
		let server = MockServer::start().await;
		mount_sdk_config(&server, vec![sample_resolved("dark_mode", true, 100)], "\"etag-1\"").await;

		let config = SdkConfig::new("test-key", server.uri()).poll_interval_override();
		let client = FlagsClient::connect(config).await.unwrap();
		assert_eq!(client.snapshot_len(), 1);

		Mock::given(method("GET"))
			.and(path("/sdk/config"))
			.and(header("if-none-match", "\"etag-1\""))
			.respond_with(ResponseTemplate::new(304))
			.mount(&server)
			.await;

		client.refresh().await.unwrap();
		assert_eq!(client.snapshot_len(), 1);
	}

	#[tokio::test]
	async fn destroy_is_idempotent_and_flushes_pending_analytics() {
		let server = MockServer::start().await;
		mount_sdk_config(&server, vec![sample_resolved("dark_mode", true, 100)], "\"etag-1\"").await;

		let config = SdkConfig::new("test-key", server.uri()).poll_interval_override();
		let client = FlagsClient::connect(config).await.unwrap();
		client
			.evaluate_flag("dark_mode", &UserContext::anonymous(), Value::Bool(false))
			.await;

		let mut flush_rx = client.subscribe_analytics_flush();
		client.destroy();
		client.destroy();

		let event = flush_rx.try_recv().unwrap();
		assert_eq!(event.exposure_count, 1);
	}

	trait TestConfigExt {
		fn poll_interval_override(self) -> SdkConfig;
	}

	impl TestConfigExt for SdkConfig {
		/// Long enough that the poll loop never fires during a test's
		/// lifetime, so assertions only observe `connect`/`refresh` calls.
		fn poll_interval_override(self) -> SdkConfig {
			let mut config = self;
			config.poll_interval = Duration::from_secs(3600);
			config
		}
	}
}
