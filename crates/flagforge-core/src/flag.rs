// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{EnvironmentId, FlagConfigId, FlagId};

/// The declared value type of a flag; governs how a variant's opaque string
/// value is parsed on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
	Boolean,
	String,
	Number,
	Json,
}

/// A named value within a flag; weighted draw picks one for in-rollout
/// users. `value` is opaque storage, parsed per [`FlagType`] on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
	pub key: String,
	pub value: String,
	pub weight: u32,
}

/// Typed evaluation result value, produced by parsing a [`Variant::value`]
/// according to the owning flag's [`FlagType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
	Boolean(bool),
	String(String),
	Number(f64),
	Json(serde_json::Value),
}

impl Variant {
	/// Maximum permitted weight, matching the `rollout_rules`/`flag_variants`
	/// CHECK constraints described in `spec.md` §6.
	pub const MAX_WEIGHT: u32 = 100;

	pub fn validate_weight(weight: i64) -> Result<u32> {
		if !(0..=Self::MAX_WEIGHT as i64).contains(&weight) {
			return Err(CoreError::InvalidWeight(weight));
		}
		Ok(weight as u32)
	}

	/// Parses [`Self::value`] according to `flag_type`; unparseable JSON
	/// falls back to the raw string, per `spec.md` §4.5 step 6.
	pub fn typed_value(&self, flag_type: FlagType) -> TypedValue {
		match flag_type {
			FlagType::Boolean => TypedValue::Boolean(self.value == "true"),
			FlagType::String => TypedValue::String(self.value.clone()),
			FlagType::Number => TypedValue::Number(self.value.parse().unwrap_or(0.0)),
			FlagType::Json => match serde_json::from_str(&self.value) {
				Ok(v) => TypedValue::Json(v),
				Err(_) => TypedValue::String(self.value.clone()),
			},
		}
	}
}

/// A globally unique, soft-deletable flag definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
	pub id: FlagId,
	/// Matches `[a-z0-9_]+`.
	pub key: String,
	pub name: String,
	pub description: Option<String>,
	pub flag_type: FlagType,
	pub tags: Vec<String>,
	pub active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Flag {
	/// One or more lowercase letters, digits, or underscores: `[a-z0-9_]+`.
	pub fn validate_key(key: &str) -> bool {
		!key.is_empty() && key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
	}

	/// The two default variants materialized on `create_flag` when none are
	/// supplied: `true`/`false` at weight 50 each.
	pub fn default_variants() -> Vec<Variant> {
		vec![
			Variant {
				key: "true".to_string(),
				value: "true".to_string(),
				weight: 50,
			},
			Variant {
				key: "false".to_string(),
				value: "false".to_string(),
				weight: 50,
			},
		]
	}
}

/// Per-(flag, environment) configuration: enabled bit, default variant,
/// rollout percentage, opaque config blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagConfig {
	pub id: FlagConfigId,
	pub flag_id: FlagId,
	pub environment_id: EnvironmentId,
	pub enabled: bool,
	pub default_variant: String,
	/// Integer in `[0, 100]`.
	pub rollout_percentage: u32,
	pub config_blob: Option<serde_json::Value>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl FlagConfig {
	pub fn validate_percentage(percentage: i64) -> Result<u32> {
		if !(0..=100).contains(&percentage) {
			return Err(CoreError::InvalidPercentage(percentage));
		}
		Ok(percentage as u32)
	}
}
