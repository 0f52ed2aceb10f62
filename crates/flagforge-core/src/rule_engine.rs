// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Rule Engine: a pure, synchronous, allocation-light function from
//! `(FlagConfig, Variants, Rules, UserContext)` to [`Decision`].
//!
//! This module performs no I/O and must be identical between the server and
//! the SDK (`spec.md` §4.7 requires local SDK evaluation to use "the same
//! Rule Engine" as the server).

use crate::decision::{Decision, EvaluationReason};
use crate::flag::{FlagType, Variant};
use crate::hasher::bucket_for_user;
use crate::rule::{AttributeOperator, Rule, RuleType};
use crate::flag::FlagConfig;
use crate::user_context::UserContext;

/// Outcome of evaluating a single rule, for callers that want per-rule
/// observability (e.g. debug logging) beyond the final [`Decision`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
	pub matched: bool,
	pub reason: EvaluationReason,
}

/// Evaluates one rule against a context. Does not consult the rollout
/// percentage fallback — that is step 4 of [`evaluate`].
pub fn evaluate_rule(rule: &Rule, flag_key: &str, context: &UserContext) -> RuleOutcome {
	match rule.rule_type {
		RuleType::Percentage => {
			let percentage = rule.percentage.unwrap_or(0);
			if percentage == 0 {
				return RuleOutcome {
					matched: false,
					reason: EvaluationReason::ZeroPercentage,
				};
			}
			let salt = format!("rule:{}", rule.id);
			let id = context.user_id.as_deref();
			let b = bucket_for_user(id, &salt);
			if b < percentage {
				RuleOutcome {
					matched: true,
					reason: EvaluationReason::PercentageMatch,
				}
			} else {
				RuleOutcome {
					matched: false,
					reason: EvaluationReason::PercentageNoMatch,
				}
			}
		}
		RuleType::Attribute => {
			let (name, operator, value) = match (
				&rule.attribute_name,
				&rule.attribute_operator,
				&rule.attribute_value,
			) {
				(Some(n), Some(o), Some(v)) => (n, o, v),
				_ => {
					return RuleOutcome {
						matched: false,
						reason: EvaluationReason::InvalidAttributeRule,
					}
				}
			};

			match context.attribute(name) {
				None => RuleOutcome {
					matched: false,
					reason: EvaluationReason::AttributeNotFound,
				},
				Some(actual) => {
					if operator.evaluate(actual, value) {
						RuleOutcome {
							matched: true,
							reason: EvaluationReason::AttributeMatch,
						}
					} else {
						RuleOutcome {
							matched: false,
							reason: EvaluationReason::AttributeNoMatch,
						}
					}
				}
			}
		}
		RuleType::UserId => {
			let (user_id, list) = match (&context.user_id, &rule.user_ids) {
				(Some(u), Some(l)) => (u, l),
				_ => {
					return RuleOutcome {
						matched: false,
						reason: EvaluationReason::InvalidUserIdRule,
					}
				}
			};

			let matched = list.split(',').map(|t| t.trim()).any(|t| t == user_id);
			if matched {
				RuleOutcome {
					matched: true,
					reason: EvaluationReason::UserIdMatch,
				}
			} else {
				RuleOutcome {
					matched: false,
					reason: EvaluationReason::UserIdNoMatch,
				}
			}
		}
		RuleType::Segment => {
			let _ = flag_key;
			RuleOutcome {
				matched: false,
				reason: EvaluationReason::UnknownRuleType,
			}
		}
	}
}

/// Weighted variant selection. Uses a per-user sticky draw derived from
/// `bucket(user_id, flag_key || ":variant")` rather than a fresh random per
/// call (see `SPEC_FULL.md` §4.2 / open question #1) so that a user's
/// in-rollout variant is stable across evaluations.
fn select_variant<'a>(
	flag_key: &str,
	flag_type: FlagType,
	variants: &'a [Variant],
	context: &UserContext,
) -> (String, String) {
	let total_weight: u32 = variants.iter().map(|v| v.weight).sum();

	if variants.is_empty() {
		return if flag_type == FlagType::Boolean {
			("true".to_string(), "true".to_string())
		} else {
			(String::new(), String::new())
		};
	}

	if total_weight == 0 {
		let first = variants
			.iter()
			.min_by(|a, b| a.key.cmp(&b.key))
			.expect("non-empty variants checked above");
		return (first.key.clone(), first.value.clone());
	}

	let salt = format!("{flag_key}:variant");
	let draw = fingerprint_draw(context.user_id.as_deref(), &salt, total_weight);

	let mut cumulative = 0u32;
	for variant in variants {
		cumulative += variant.weight;
		if draw < cumulative {
			return (variant.key.clone(), variant.value.clone());
		}
	}

	let first = variants
		.iter()
		.min_by(|a, b| a.key.cmp(&b.key))
		.expect("non-empty variants checked above");
	(first.key.clone(), first.value.clone())
}

/// Draws a uniform value in `[0, total_weight)` from the full 32-bit
/// fingerprint rather than the `[0, 99]` bucket, so weights are not limited
/// to percent granularity.
fn fingerprint_draw(user_id: Option<&str>, salt: &str, total_weight: u32) -> u32 {
	use crate::hasher::{fingerprint, ANONYMOUS_ID};
	let id = user_id.unwrap_or(ANONYMOUS_ID);
	fingerprint(id, salt) % total_weight
}

/// The Rule Engine. See module docs and `spec.md` §4.2 for the full
/// algorithm.
pub fn evaluate(
	flag_key: &str,
	flag_type: FlagType,
	config: &FlagConfig,
	variants: &[Variant],
	rules: &[Rule],
	context: &UserContext,
) -> Decision {
	if !config.enabled {
		return Decision::new(false, &config.default_variant, EvaluationReason::FlagDisabled);
	}

	let mut sorted_rules: Vec<&Rule> = rules.iter().collect();
	sorted_rules.sort_by_key(|r| r.priority);

	for rule in sorted_rules {
		let outcome = evaluate_rule(rule, flag_key, context);
		if outcome.matched {
			let variant_key = rule
				.variant_key
				.clone()
				.unwrap_or_else(|| config.default_variant.clone());
			return Decision::new(true, variant_key, outcome.reason);
		}
	}

	match config.rollout_percentage {
		0 => Decision::new(false, &config.default_variant, EvaluationReason::ZeroRollout),
		100 => {
			let (key, _value) = select_variant(flag_key, flag_type, variants, context);
			Decision::new(true, key, EvaluationReason::FullRollout)
		}
		percentage => {
			let b = bucket_for_user(context.user_id.as_deref(), flag_key);
			if b < percentage {
				let (key, _value) = select_variant(flag_key, flag_type, variants, context);
				Decision::new(true, key, EvaluationReason::RolloutMatch)
			} else {
				Decision::new(
					false,
					&config.default_variant,
					EvaluationReason::RolloutNoMatch,
				)
			}
		}
	}
}
