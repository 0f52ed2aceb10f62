// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors surfaced by the domain model and rule engine.
///
/// Nothing in this crate performs I/O; these variants cover malformed input
/// handed to otherwise-pure functions (validation, parsing a variant's
/// opaque value according to a flag's declared type).
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid flag key: {0}")]
	InvalidFlagKey(String),

	#[error("invalid environment name: {0}")]
	InvalidEnvironmentName(String),

	#[error("rollout percentage out of range: {0}")]
	InvalidPercentage(i64),

	#[error("variant weight out of range: {0}")]
	InvalidWeight(i64),

	#[error("failed to parse variant value as {flag_type}: {value}")]
	InvalidVariantValue { flag_type: String, value: String },

	#[error("invalid evaluation context: {0}")]
	InvalidContext(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
