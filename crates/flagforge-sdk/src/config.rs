// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! SDK configuration options (`spec.md` §4.7).

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

/// Client-side configuration. Built via [`FlagsClient::builder`][crate::client::FlagsClient::builder];
/// everything but `api_key` and `base_url` has a spec-mandated default.
#[derive(Debug, Clone)]
pub struct SdkConfig {
	pub api_key: String,
	pub base_url: String,
	pub environment: String,
	pub poll_interval: Duration,
	pub timeout: Duration,
	pub enable_analytics: bool,
	pub enable_local_evaluation: bool,
	pub fallback_values: HashMap<String, Value>,
}

impl SdkConfig {
	pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
		Self {
			api_key: api_key.into(),
			base_url: base_url.into(),
			environment: "production".to_string(),
			poll_interval: Duration::from_secs(30),
			timeout: Duration::from_secs(5),
			enable_analytics: true,
			enable_local_evaluation: true,
			fallback_values: HashMap::new(),
		}
	}
}
