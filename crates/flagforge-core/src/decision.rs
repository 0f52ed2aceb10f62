// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Reason tags are part of the metrics contract (`spec.md` §4.2) — do not
/// rename a variant without checking `flag_evaluations_total{reason=...}`
/// consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationReason {
	FlagDisabled,
	ZeroPercentage,
	PercentageMatch,
	PercentageNoMatch,
	InvalidAttributeRule,
	AttributeNotFound,
	AttributeMatch,
	AttributeNoMatch,
	InvalidUserIdRule,
	UserIdMatch,
	UserIdNoMatch,
	ZeroRollout,
	FullRollout,
	RolloutMatch,
	RolloutNoMatch,
	UnknownRuleType,
	FlagNotFound,
	InvalidContext,
	EvaluationError,
}

impl EvaluationReason {
	/// The lowercase snake_case tag used in metric labels and SDK events.
	pub fn as_str(&self) -> &'static str {
		match self {
			EvaluationReason::FlagDisabled => "flag_disabled",
			EvaluationReason::ZeroPercentage => "zero_percentage",
			EvaluationReason::PercentageMatch => "percentage_match",
			EvaluationReason::PercentageNoMatch => "percentage_no_match",
			EvaluationReason::InvalidAttributeRule => "invalid_attribute_rule",
			EvaluationReason::AttributeNotFound => "attribute_not_found",
			EvaluationReason::AttributeMatch => "attribute_match",
			EvaluationReason::AttributeNoMatch => "attribute_no_match",
			EvaluationReason::InvalidUserIdRule => "invalid_user_id_rule",
			EvaluationReason::UserIdMatch => "user_id_match",
			EvaluationReason::UserIdNoMatch => "user_id_no_match",
			EvaluationReason::ZeroRollout => "zero_rollout",
			EvaluationReason::FullRollout => "full_rollout",
			EvaluationReason::RolloutMatch => "rollout_match",
			EvaluationReason::RolloutNoMatch => "rollout_no_match",
			EvaluationReason::UnknownRuleType => "unknown_rule_type",
			EvaluationReason::FlagNotFound => "flag_not_found",
			EvaluationReason::InvalidContext => "invalid_context",
			EvaluationReason::EvaluationError => "evaluation_error",
		}
	}
}

impl std::fmt::Display for EvaluationReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// The Rule Engine's pure output: enabled bit, chosen variant key, reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
	pub enabled: bool,
	pub variant_key: String,
	pub reason: EvaluationReason,
}

impl Decision {
	pub fn new(enabled: bool, variant_key: impl Into<String>, reason: EvaluationReason) -> Self {
		Self {
			enabled,
			variant_key: variant_key.into(),
			reason,
		}
	}
}
