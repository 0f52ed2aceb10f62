// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! `sqlx::FromRow` row types and their `TryFrom` conversions into
//! `flagforge_core` domain types. No `query!` compile-time macros — there is
//! no `DATABASE_URL` available at build time for a from-scratch crate, so
//! every query binds and maps manually, same as the teacher's repository.

use chrono::{DateTime, Utc};
use flagforge_core::{
	AttributeOperator, Environment, EnvironmentId, Flag, FlagConfig, FlagConfigId, FlagId,
	FlagType, Rule, RuleId, RuleType, Variant,
};

use crate::error::{Result, StoreError};

fn parse_rfc3339(column: &'static str, raw: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| StoreError::CorruptRow {
			column,
			reason: e.to_string(),
		})
}

fn parse_uuid_id<T, F>(column: &'static str, raw: &str, wrap: F) -> Result<T>
where
	F: FnOnce(uuid::Uuid) -> T,
{
	raw.parse::<uuid::Uuid>()
		.map(wrap)
		.map_err(|e| StoreError::CorruptRow {
			column,
			reason: e.to_string(),
		})
}

#[derive(sqlx::FromRow)]
pub struct EnvironmentRow {
	pub id: String,
	pub name: String,
	pub created_at: String,
}

impl TryFrom<EnvironmentRow> for Environment {
	type Error = StoreError;

	fn try_from(row: EnvironmentRow) -> Result<Self> {
		Ok(Environment {
			id: parse_uuid_id("id", &row.id, EnvironmentId)?,
			name: row.name,
			created_at: parse_rfc3339("created_at", &row.created_at)?,
		})
	}
}

#[derive(sqlx::FromRow)]
pub struct FlagRow {
	pub id: String,
	pub key: String,
	pub name: String,
	pub description: Option<String>,
	pub flag_type: String,
	pub tags: String,
	pub active: bool,
	pub created_at: String,
	pub updated_at: String,
}

fn parse_flag_type(raw: &str) -> Result<FlagType> {
	match raw {
		"boolean" => Ok(FlagType::Boolean),
		"string" => Ok(FlagType::String),
		"number" => Ok(FlagType::Number),
		"json" => Ok(FlagType::Json),
		other => Err(StoreError::CorruptRow {
			column: "flag_type",
			reason: format!("unknown flag_type '{other}'"),
		}),
	}
}

pub fn flag_type_column(flag_type: FlagType) -> &'static str {
	match flag_type {
		FlagType::Boolean => "boolean",
		FlagType::String => "string",
		FlagType::Number => "number",
		FlagType::Json => "json",
	}
}

impl TryFrom<FlagRow> for Flag {
	type Error = StoreError;

	fn try_from(row: FlagRow) -> Result<Self> {
		let tags: Vec<String> = serde_json::from_str(&row.tags)?;
		Ok(Flag {
			id: parse_uuid_id("id", &row.id, FlagId)?,
			key: row.key,
			name: row.name,
			description: row.description,
			flag_type: parse_flag_type(&row.flag_type)?,
			tags,
			active: row.active,
			created_at: parse_rfc3339("created_at", &row.created_at)?,
			updated_at: parse_rfc3339("updated_at", &row.updated_at)?,
		})
	}
}

#[derive(sqlx::FromRow)]
pub struct FlagConfigRow {
	pub id: String,
	pub flag_id: String,
	pub environment_id: String,
	pub enabled: bool,
	pub default_variant: String,
	pub rollout_percentage: i64,
	pub config_blob: Option<String>,
	pub created_at: String,
	pub updated_at: String,
}

impl TryFrom<FlagConfigRow> for FlagConfig {
	type Error = StoreError;

	fn try_from(row: FlagConfigRow) -> Result<Self> {
		let config_blob = row
			.config_blob
			.map(|raw| serde_json::from_str(&raw))
			.transpose()?;

		Ok(FlagConfig {
			id: parse_uuid_id("id", &row.id, FlagConfigId)?,
			flag_id: parse_uuid_id("flag_id", &row.flag_id, FlagId)?,
			environment_id: parse_uuid_id("environment_id", &row.environment_id, EnvironmentId)?,
			enabled: row.enabled,
			default_variant: row.default_variant,
			rollout_percentage: row.rollout_percentage as u32,
			config_blob,
			created_at: parse_rfc3339("created_at", &row.created_at)?,
			updated_at: parse_rfc3339("updated_at", &row.updated_at)?,
		})
	}
}

#[derive(sqlx::FromRow)]
pub struct VariantRow {
	pub key: String,
	pub value: String,
	pub weight: i64,
}

impl From<VariantRow> for Variant {
	fn from(row: VariantRow) -> Self {
		Variant {
			key: row.key,
			value: row.value,
			weight: row.weight as u32,
		}
	}
}

#[derive(sqlx::FromRow)]
pub struct RuleRow {
	pub id: String,
	pub flag_config_id: String,
	pub rule_type: String,
	pub priority: i64,
	pub attribute_name: Option<String>,
	pub attribute_operator: Option<String>,
	pub attribute_value: Option<String>,
	pub percentage: Option<i64>,
	pub user_ids: Option<String>,
	pub variant_key: Option<String>,
}

fn parse_rule_type(raw: &str) -> Result<RuleType> {
	match raw {
		"percentage" => Ok(RuleType::Percentage),
		"attribute" => Ok(RuleType::Attribute),
		"user_id" => Ok(RuleType::UserId),
		"segment" => Ok(RuleType::Segment),
		other => Err(StoreError::CorruptRow {
			column: "rule_type",
			reason: format!("unknown rule_type '{other}'"),
		}),
	}
}

pub fn rule_type_column(rule_type: RuleType) -> &'static str {
	match rule_type {
		RuleType::Percentage => "percentage",
		RuleType::Attribute => "attribute",
		RuleType::UserId => "user_id",
		RuleType::Segment => "segment",
	}
}

fn parse_attribute_operator(raw: &str) -> Result<AttributeOperator> {
	match raw {
		"equals" => Ok(AttributeOperator::Equals),
		"not_equals" => Ok(AttributeOperator::NotEquals),
		"in" => Ok(AttributeOperator::In),
		"not_in" => Ok(AttributeOperator::NotIn),
		"contains" => Ok(AttributeOperator::Contains),
		"starts_with" => Ok(AttributeOperator::StartsWith),
		"ends_with" => Ok(AttributeOperator::EndsWith),
		"greater_than" => Ok(AttributeOperator::GreaterThan),
		"less_than" => Ok(AttributeOperator::LessThan),
		other => Err(StoreError::CorruptRow {
			column: "attribute_operator",
			reason: format!("unknown attribute_operator '{other}'"),
		}),
	}
}

pub fn attribute_operator_column(op: AttributeOperator) -> &'static str {
	match op {
		AttributeOperator::Equals => "equals",
		AttributeOperator::NotEquals => "not_equals",
		AttributeOperator::In => "in",
		AttributeOperator::NotIn => "not_in",
		AttributeOperator::Contains => "contains",
		AttributeOperator::StartsWith => "starts_with",
		AttributeOperator::EndsWith => "ends_with",
		AttributeOperator::GreaterThan => "greater_than",
		AttributeOperator::LessThan => "less_than",
	}
}

impl TryFrom<RuleRow> for Rule {
	type Error = StoreError;

	fn try_from(row: RuleRow) -> Result<Self> {
		Ok(Rule {
			id: parse_uuid_id("id", &row.id, RuleId)?,
			flag_config_id: parse_uuid_id("flag_config_id", &row.flag_config_id, FlagConfigId)?,
			rule_type: parse_rule_type(&row.rule_type)?,
			priority: row.priority as i32,
			attribute_name: row.attribute_name,
			attribute_operator: row
				.attribute_operator
				.as_deref()
				.map(parse_attribute_operator)
				.transpose()?,
			attribute_value: row.attribute_value,
			percentage: row.percentage.map(|p| p as u32),
			user_ids: row.user_ids,
			variant_key: row.variant_key,
		})
	}
}
