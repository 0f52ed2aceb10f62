// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Runtime-only evaluation input. `custom_attributes` override
/// `attributes` on name collision; the two are merged at evaluation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
	pub user_id: Option<String>,
	#[serde(default)]
	pub attributes: HashMap<String, String>,
	#[serde(default)]
	pub custom_attributes: HashMap<String, String>,
}

impl UserContext {
	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}

	pub fn with_custom_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.custom_attributes.insert(key.into(), value.into());
		self
	}

	/// Looks up `name` in `custom_attributes ∪ attributes`, custom winning
	/// on collision.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self
			.custom_attributes
			.get(name)
			.or_else(|| self.attributes.get(name))
			.map(|s| s.as_str())
	}
}
