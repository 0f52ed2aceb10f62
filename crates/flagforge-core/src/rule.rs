// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::ids::{FlagConfigId, RuleId};

/// The kind of targeting a [`Rule`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
	Percentage,
	Attribute,
	UserId,
	/// Reserved; not evaluated (see `spec.md` §4.2, §9).
	Segment,
}

/// Comparison applied by an `attribute` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeOperator {
	Equals,
	NotEquals,
	In,
	NotIn,
	Contains,
	StartsWith,
	EndsWith,
	GreaterThan,
	LessThan,
}

impl AttributeOperator {
	/// Evaluates `actual` against `expected` per `spec.md` §4.2's operator
	/// semantics. Both sides are canonicalized to lowercase except for the
	/// numeric comparisons, which parse as floating point.
	pub fn evaluate(&self, actual: &str, expected: &str) -> bool {
		let actual_lower = actual.to_lowercase();
		let expected_lower = expected.to_lowercase();

		match self {
			AttributeOperator::Equals => actual_lower == expected_lower,
			AttributeOperator::NotEquals => actual_lower != expected_lower,
			AttributeOperator::In => Self::tokens(&expected_lower).any(|t| t == actual_lower),
			AttributeOperator::NotIn => !Self::tokens(&expected_lower).any(|t| t == actual_lower),
			AttributeOperator::Contains => actual_lower.contains(&expected_lower),
			AttributeOperator::StartsWith => actual_lower.starts_with(&expected_lower),
			AttributeOperator::EndsWith => actual_lower.ends_with(&expected_lower),
			AttributeOperator::GreaterThan => {
				match (actual.parse::<f64>(), expected.parse::<f64>()) {
					(Ok(a), Ok(e)) => a > e,
					_ => false,
				}
			}
			AttributeOperator::LessThan => match (actual.parse::<f64>(), expected.parse::<f64>()) {
				(Ok(a), Ok(e)) => a < e,
				_ => false,
			},
		}
	}

	fn tokens(s: &str) -> impl Iterator<Item = &str> {
		s.split(',').map(|t| t.trim())
	}
}

/// A single targeting rule belonging to a [`crate::FlagConfig`]. Rules are
/// replaced wholesale on config update (delete-then-insert under a
/// transaction), never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
	pub id: RuleId,
	pub flag_config_id: FlagConfigId,
	pub rule_type: RuleType,
	/// Lower priority evaluates earlier; stable on ties.
	pub priority: i32,

	// attribute rule fields
	pub attribute_name: Option<String>,
	pub attribute_operator: Option<AttributeOperator>,
	pub attribute_value: Option<String>,

	/// percentage rule field; also doubles as the right-hand side of a
	/// `user_id` rule's comma-separated membership list.
	pub percentage: Option<u32>,

	/// Comma-separated membership list for `user_id` rules.
	pub user_ids: Option<String>,

	/// Overrides `config.default_variant` on match.
	pub variant_key: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn equals_is_case_insensitive() {
		assert!(AttributeOperator::Equals.evaluate("US", "us"));
		assert!(!AttributeOperator::NotEquals.evaluate("US", "us"));
	}

	#[test]
	fn in_trims_and_lowercases_tokens() {
		assert!(AttributeOperator::In.evaluate("de", " US, DE , fr"));
		assert!(!AttributeOperator::NotIn.evaluate("de", " US, DE , fr"));
	}

	#[test]
	fn substring_operators() {
		assert!(AttributeOperator::Contains.evaluate("HelloWorld", "loWo"));
		assert!(AttributeOperator::StartsWith.evaluate("HelloWorld", "hello"));
		assert!(AttributeOperator::EndsWith.evaluate("HelloWorld", "WORLD"));
	}

	#[test]
	fn numeric_operators_require_parseable_sides() {
		assert!(AttributeOperator::GreaterThan.evaluate("10", "5"));
		assert!(AttributeOperator::LessThan.evaluate("3", "5"));
		assert!(!AttributeOperator::GreaterThan.evaluate("abc", "5"));
		assert!(!AttributeOperator::LessThan.evaluate("3", "xyz"));
	}

	proptest! {
		#[test]
		fn equals_is_reflexive(s in "[a-zA-Z0-9]{1,30}") {
			prop_assert!(AttributeOperator::Equals.evaluate(&s, &s));
			prop_assert!(!AttributeOperator::NotEquals.evaluate(&s, &s));
		}

		#[test]
		fn greater_and_less_than_are_exclusive(a in -1000f64..1000f64, b in -1000f64..1000f64) {
			let a_s = a.to_string();
			let b_s = b.to_string();
			let gt = AttributeOperator::GreaterThan.evaluate(&a_s, &b_s);
			let lt = AttributeOperator::LessThan.evaluate(&a_s, &b_s);
			prop_assert!(!(gt && lt));
		}
	}
}
