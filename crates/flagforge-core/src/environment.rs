// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::EnvironmentId;

/// A deployment environment with its own flag configs (`development`,
/// `staging`, `production`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
	pub id: EnvironmentId,
	/// e.g. "development", "staging", "production"
	pub name: String,
	pub created_at: DateTime<Utc>,
}

impl Environment {
	/// Environments materialized for a fresh deployment unless overridden.
	pub const DEFAULT_ENVIRONMENTS: &'static [&'static str] =
		&["development", "staging", "production"];

	pub fn default_environments() -> impl Iterator<Item = &'static str> {
		Self::DEFAULT_ENVIRONMENTS.iter().copied()
	}

	/// Lowercase alphanumeric with underscores, 2-50 characters, first
	/// character a lowercase letter.
	pub fn validate_name(name: &str) -> bool {
		if name.len() < 2 || name.len() > 50 {
			return false;
		}

		let mut chars = name.chars();
		match chars.next() {
			Some(c) if c.is_ascii_lowercase() => {}
			_ => return false,
		}

		chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
	}
}
