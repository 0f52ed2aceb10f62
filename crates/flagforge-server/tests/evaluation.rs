// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the Evaluation Service HTTP surface, exercising
//! end-to-end scenarios S1/S2/S3 against a real router and invariants 7
//! (evaluation defaults) and 8 (batch size bound).

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use flagforge_server::evaluation_router;
use flagforge_store::{FlagConfigUpdate, NewRule};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{boolean_flag, test_state};

async fn json_response(response: axum::response::Response) -> Value {
	let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn s2_zero_rollout_falls_back_to_default() {
	let state = test_state().await;
	state.store.create_flag(boolean_flag("dark_mode"), "test").await.unwrap();
	state
		.store
		.update_flag_config(
			"dark_mode",
			"production",
			FlagConfigUpdate {
				enabled: Some(true),
				rollout_percentage: Some(0),
				..Default::default()
			},
			"test",
		)
		.await
		.unwrap();

	let app = evaluation_router(state);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/evaluate")
				.method("POST")
				.header("content-type", "application/json")
				.body(Body::from(
					json!({
						"flag_key": "dark_mode",
						"user_context": {"user_id": "anything"},
						"default_value": false,
					})
					.to_string(),
				))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let body = json_response(response).await;
	assert_eq!(body["value"], json!(false));
	assert_eq!(body["reason"], json!("zero_rollout"));
}

#[tokio::test]
async fn s3_attribute_targeting_then_falls_through_to_percentage() {
	let state = test_state().await;
	state.store.create_flag(boolean_flag("checkout_v2"), "test").await.unwrap();
	state
		.store
		.update_flag_config(
			"checkout_v2",
			"production",
			FlagConfigUpdate {
				enabled: Some(true),
				rollout_percentage: Some(0),
				rules: Some(vec![NewRule {
					rule_type: flagforge_core::RuleType::Attribute,
					priority: 10,
					attribute_name: Some("country".to_string()),
					attribute_operator: Some(flagforge_core::AttributeOperator::Equals),
					attribute_value: Some("US".to_string()),
					percentage: None,
					user_ids: None,
					variant_key: Some("true".to_string()),
				}]),
				..Default::default()
			},
			"test",
		)
		.await
		.unwrap();

	let app = evaluation_router(state.clone());
	let matching = app
		.oneshot(
			Request::builder()
				.uri("/evaluate")
				.method("POST")
				.header("content-type", "application/json")
				.body(Body::from(
					json!({
						"flag_key": "checkout_v2",
						"user_context": {"user_id": "u2", "attributes": {"country": "US"}},
						"default_value": false,
					})
					.to_string(),
				))
				.unwrap(),
		)
		.await
		.unwrap();
	let matching_body = json_response(matching).await;
	assert_eq!(matching_body["value"], json!(true));
	assert_eq!(matching_body["reason"], json!("attribute_match"));

	let app = evaluation_router(state);
	let non_matching = app
		.oneshot(
			Request::builder()
				.uri("/evaluate")
				.method("POST")
				.header("content-type", "application/json")
				.body(Body::from(
					json!({
						"flag_key": "checkout_v2",
						"user_context": {"user_id": "u2", "attributes": {"country": "DE"}},
						"default_value": false,
					})
					.to_string(),
				))
				.unwrap(),
		)
		.await
		.unwrap();
	let non_matching_body = json_response(non_matching).await;
	assert_eq!(non_matching_body["value"], json!(false));
	// No rule matches for DE, and the config's rollout_percentage is 0, so
	// the flag-level fallback short-circuits on `ZeroRollout` rather than
	// drawing a bucket.
	assert_eq!(non_matching_body["reason"], json!("zero_rollout"));
}

/// Invariant 7: a well-formed request against an unknown flag degrades to
/// the caller's default rather than erroring.
#[tokio::test]
async fn unknown_flag_degrades_to_caller_default() {
	let state = test_state().await;
	let app = evaluation_router(state);

	let response = app
		.oneshot(
			Request::builder()
				.uri("/evaluate")
				.method("POST")
				.header("content-type", "application/json")
				.body(Body::from(
					json!({
						"flag_key": "does_not_exist",
						"user_context": {"user_id": "u1"},
						"default_value": "fallback",
					})
					.to_string(),
				))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let body = json_response(response).await;
	assert_eq!(body["value"], json!("fallback"));
	assert_eq!(body["reason"], json!("flag_not_found"));
}

#[tokio::test]
async fn missing_flag_key_is_rejected() {
	let state = test_state().await;
	let app = evaluation_router(state);

	let response = app
		.oneshot(
			Request::builder()
				.uri("/evaluate")
				.method("POST")
				.header("content-type", "application/json")
				.body(Body::from(json!({ "flag_key": "" }).to_string()))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Invariant 8: batch requests above the cap are rejected wholesale, not
/// partially evaluated.
#[tokio::test]
async fn batch_over_cap_is_rejected_with_no_partial_evaluation() {
	let state = test_state().await;
	state.store.create_flag(boolean_flag("dark_mode"), "test").await.unwrap();

	let requests: Vec<Value> = (0..51)
		.map(|i| json!({"flag_key": "dark_mode", "user_context": {"user_id": format!("u{i}")}}))
		.collect();

	let app = evaluation_router(state);
	let response = app
		.oneshot(
			Request::builder()
				.uri("/evaluate/batch")
				.method("POST")
				.header("content-type", "application/json")
				.body(Body::from(json!({ "requests": requests }).to_string()))
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_healthy_when_store_is_reachable() {
	let state = test_state().await;
	let app = evaluation_router(state);

	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let body = json_response(response).await;
	assert_eq!(body["status"], json!("healthy"));
}

#[tokio::test]
async fn sdk_config_returns_304_on_matching_etag() {
	let state = test_state().await;
	state.store.create_flag(boolean_flag("dark_mode"), "test").await.unwrap();

	let app = evaluation_router(state.clone());
	let first = app
		.oneshot(
			Request::builder()
				.uri("/sdk/config?environment=production")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(first.status(), StatusCode::OK);
	let etag = first
		.headers()
		.get(axum::http::header::ETAG)
		.unwrap()
		.to_str()
		.unwrap()
		.to_string();

	let app = evaluation_router(state);
	let second = app
		.oneshot(
			Request::builder()
				.uri("/sdk/config?environment=production")
				.header("if-none-match", etag)
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
}
