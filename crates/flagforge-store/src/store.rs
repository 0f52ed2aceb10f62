// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::Utc;
use flagforge_core::{
	AttributeOperator, Environment, EnvironmentId, Flag, FlagConfig, FlagId, FlagType,
	ResolvedFlagConfig, Rule, RuleType, Variant,
};
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

use crate::audit;
use crate::error::{Result, StoreError};
use crate::rows::{
	attribute_operator_column, flag_type_column, rule_type_column, EnvironmentRow, FlagConfigRow,
	FlagRow, RuleRow, VariantRow,
};

/// Input to [`FlagStore::create_flag`]. `variants` defaults to
/// [`Flag::default_variants`] when empty; a `flag_config` row (disabled,
/// `rollout_percentage = 0`) is created for every environment named in
/// `environments`.
#[derive(Debug, Clone)]
pub struct NewFlag {
	pub key: String,
	pub name: String,
	pub description: Option<String>,
	pub flag_type: FlagType,
	pub tags: Vec<String>,
	pub variants: Vec<Variant>,
	pub environments: Vec<String>,
}

/// Result of a successful [`FlagStore::create_flag`] call: everything
/// created inside the one transaction.
#[derive(Debug, Clone)]
pub struct CreatedFlag {
	pub flag: Flag,
	pub variants: Vec<Variant>,
	pub configs: Vec<FlagConfig>,
}

/// A rule definition supplied by the caller; the store assigns the id and
/// `flag_config_id`.
#[derive(Debug, Clone)]
pub struct NewRule {
	pub rule_type: RuleType,
	pub priority: i32,
	pub attribute_name: Option<String>,
	pub attribute_operator: Option<AttributeOperator>,
	pub attribute_value: Option<String>,
	pub percentage: Option<u32>,
	pub user_ids: Option<String>,
	pub variant_key: Option<String>,
}

/// Partial update applied to a flag's display metadata. `None` fields are
/// left unchanged.
#[derive(Debug, Clone, Default)]
pub struct FlagMetadataUpdate {
	pub name: Option<String>,
	pub description: Option<Option<String>>,
	pub tags: Option<Vec<String>>,
}

/// Partial update applied to a `(flag, environment)` config. `None` fields
/// are left unchanged; `rules: Some(_)` fully replaces the rule set
/// (delete-then-insert, inside the same transaction as the config update).
#[derive(Debug, Clone, Default)]
pub struct FlagConfigUpdate {
	pub enabled: Option<bool>,
	pub default_variant: Option<String>,
	pub rollout_percentage: Option<u32>,
	pub config_blob: Option<Option<serde_json::Value>>,
	pub variants: Option<Vec<Variant>>,
	pub rules: Option<Vec<NewRule>>,
}

#[async_trait]
pub trait FlagStore: Send + Sync {
	async fn create_environment(&self, name: &str) -> Result<Environment>;
	async fn get_environment_by_name(&self, name: &str) -> Result<Option<Environment>>;
	async fn list_environments(&self) -> Result<Vec<Environment>>;

	async fn create_flag(&self, input: NewFlag, actor: &str) -> Result<CreatedFlag>;
	async fn get_flag(&self, key: &str) -> Result<Option<Flag>>;
	async fn list_flags(&self) -> Result<Vec<Flag>>;
	async fn delete_flag(&self, key: &str, actor: &str) -> Result<bool>;

	/// Updates display metadata only (`name`, `description`, `tags`); `key`,
	/// `flag_type`, and `active` are immutable outside create/delete.
	async fn update_flag_metadata(
		&self,
		key: &str,
		update: FlagMetadataUpdate,
		actor: &str,
	) -> Result<Flag>;

	async fn get_flag_config(
		&self,
		flag_key: &str,
		environment: &str,
	) -> Result<Option<ResolvedFlagConfig>>;

	async fn update_flag_config(
		&self,
		flag_key: &str,
		environment: &str,
		update: FlagConfigUpdate,
		actor: &str,
	) -> Result<ResolvedFlagConfig>;

	async fn toggle_flag(
		&self,
		flag_key: &str,
		environment: &str,
		enabled: bool,
		actor: &str,
	) -> Result<ResolvedFlagConfig>;

	/// Disables the flag across every environment it has a config in.
	async fn set_kill_switch(&self, flag_key: &str, actor: &str) -> Result<Vec<ResolvedFlagConfig>>;

	async fn record_evaluation(
		&self,
		flag_key: &str,
		environment: &str,
		result: &str,
		reason: &str,
	) -> Result<()>;
}

/// SQLite implementation of [`FlagStore`], following the teacher's
/// repository idiom: manual row mapping, RFC3339 timestamps, one
/// `#[instrument]` per method.
#[derive(Clone)]
pub struct SqliteFlagStore {
	pool: SqlitePool,
}

impl SqliteFlagStore {
	/// Connects to `database_url` and applies `schema.sql` idempotently.
	pub async fn connect(database_url: &str) -> Result<Self> {
		let pool = SqlitePool::connect(database_url).await?;
		Self::from_pool(pool).await
	}

	pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
		sqlx::query(include_str!("schema.sql")).execute(&pool).await?;
		Ok(Self { pool })
	}

	async fn load_flag_id(&self, flag_key: &str) -> Result<FlagId> {
		let row: Option<(String,)> = sqlx::query_as("SELECT id FROM feature_flags WHERE key = ?")
			.bind(flag_key)
			.fetch_optional(&self.pool)
			.await?;
		let (id,) = row.ok_or_else(|| StoreError::FlagNotFound(flag_key.to_string()))?;
		id.parse::<Uuid>()
			.map(FlagId)
			.map_err(|e| StoreError::CorruptRow {
				column: "id",
				reason: e.to_string(),
			})
	}

	async fn load_environment_id(&self, environment: &str) -> Result<EnvironmentId> {
		let row: Option<(String,)> = sqlx::query_as("SELECT id FROM environments WHERE name = ?")
			.bind(environment)
			.fetch_optional(&self.pool)
			.await?;
		let (id,) = row.ok_or_else(|| StoreError::EnvironmentNotFound(environment.to_string()))?;
		id.parse::<Uuid>()
			.map(EnvironmentId)
			.map_err(|e| StoreError::CorruptRow {
				column: "id",
				reason: e.to_string(),
			})
	}

	async fn load_variants(&self, flag_id: FlagId) -> Result<Vec<Variant>> {
		let rows = sqlx::query_as::<_, VariantRow>(
			"SELECT key, value, weight FROM flag_variants WHERE flag_id = ? ORDER BY key ASC",
		)
		.bind(flag_id.0.to_string())
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(Variant::from).collect())
	}

	async fn load_rules(&self, flag_config_id: &str) -> Result<Vec<Rule>> {
		let rows = sqlx::query_as::<_, RuleRow>(
			r#"
			SELECT id, flag_config_id, rule_type, priority, attribute_name,
			       attribute_operator, attribute_value, percentage, user_ids, variant_key
			FROM rollout_rules
			WHERE flag_config_id = ?
			ORDER BY priority ASC
			"#,
		)
		.bind(flag_config_id)
		.fetch_all(&self.pool)
		.await?;
		rows.into_iter().map(Rule::try_from).collect()
	}

	async fn load_resolved(
		&self,
		flag_key: &str,
		environment: &str,
	) -> Result<Option<ResolvedFlagConfig>> {
		let flag_row = sqlx::query_as::<_, FlagRow>(
			r#"
			SELECT id, key, name, description, flag_type, tags, active, created_at, updated_at
			FROM feature_flags WHERE key = ? AND active = 1
			"#,
		)
		.bind(flag_key)
		.fetch_optional(&self.pool)
		.await?;

		let Some(flag_row) = flag_row else {
			return Ok(None);
		};
		let flag = Flag::try_from(flag_row)?;

		let config_row = sqlx::query_as::<_, FlagConfigRow>(
			r#"
			SELECT fc.id, fc.flag_id, fc.environment_id, fc.enabled, fc.default_variant,
			       fc.rollout_percentage, fc.config_blob, fc.created_at, fc.updated_at
			FROM flag_configs fc
			JOIN environments e ON e.id = fc.environment_id
			WHERE fc.flag_id = ? AND e.name = ?
			"#,
		)
		.bind(flag.id.0.to_string())
		.bind(environment)
		.fetch_optional(&self.pool)
		.await?;

		let Some(config_row) = config_row else {
			return Ok(None);
		};
		let config_id = config_row.id.clone();
		let config = FlagConfig::try_from(config_row)?;

		let variants = self.load_variants(flag.id).await?;
		let rules = self.load_rules(&config_id).await?;

		Ok(Some(ResolvedFlagConfig {
			flag,
			config,
			variants,
			rules,
		}))
	}
}

#[async_trait]
impl FlagStore for SqliteFlagStore {
	#[instrument(skip(self))]
	async fn create_environment(&self, name: &str) -> Result<Environment> {
		let env = Environment {
			id: EnvironmentId::new(),
			name: name.to_string(),
			created_at: Utc::now(),
		};

		sqlx::query("INSERT INTO environments (id, name, created_at) VALUES (?, ?, ?)")
			.bind(env.id.0.to_string())
			.bind(&env.name)
			.bind(env.created_at.to_rfc3339())
			.execute(&self.pool)
			.await?;

		Ok(env)
	}

	#[instrument(skip(self))]
	async fn get_environment_by_name(&self, name: &str) -> Result<Option<Environment>> {
		let row = sqlx::query_as::<_, EnvironmentRow>(
			"SELECT id, name, created_at FROM environments WHERE name = ?",
		)
		.bind(name)
		.fetch_optional(&self.pool)
		.await?;
		row.map(Environment::try_from).transpose()
	}

	#[instrument(skip(self))]
	async fn list_environments(&self) -> Result<Vec<Environment>> {
		let rows = sqlx::query_as::<_, EnvironmentRow>(
			"SELECT id, name, created_at FROM environments ORDER BY created_at ASC",
		)
		.fetch_all(&self.pool)
		.await?;
		rows.into_iter().map(Environment::try_from).collect()
	}

	#[instrument(skip(self, input), fields(flag_key = %input.key))]
	async fn create_flag(&self, input: NewFlag, actor: &str) -> Result<CreatedFlag> {
		let existing: Option<(String,)> =
			sqlx::query_as("SELECT id FROM feature_flags WHERE key = ?")
				.bind(&input.key)
				.fetch_optional(&self.pool)
				.await?;
		if existing.is_some() {
			return Err(StoreError::FlagAlreadyExists(input.key));
		}

		let now = Utc::now();
		let flag = Flag {
			id: FlagId::new(),
			key: input.key,
			name: input.name,
			description: input.description,
			flag_type: input.flag_type,
			tags: input.tags,
			active: true,
			created_at: now,
			updated_at: now,
		};
		let variants = if input.variants.is_empty() {
			Flag::default_variants()
		} else {
			input.variants
		};
		let default_variant = variants
			.first()
			.map(|v| v.key.clone())
			.unwrap_or_else(|| "true".to_string());

		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
			INSERT INTO feature_flags (id, key, name, description, flag_type, tags, active, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(flag.id.0.to_string())
		.bind(&flag.key)
		.bind(&flag.name)
		.bind(&flag.description)
		.bind(flag_type_column(flag.flag_type))
		.bind(serde_json::to_string(&flag.tags)?)
		.bind(flag.active)
		.bind(flag.created_at.to_rfc3339())
		.bind(flag.updated_at.to_rfc3339())
		.execute(&mut *tx)
		.await?;

		for variant in &variants {
			sqlx::query(
				"INSERT INTO flag_variants (id, flag_id, key, value, weight) VALUES (?, ?, ?, ?, ?)",
			)
			.bind(Uuid::new_v4().to_string())
			.bind(flag.id.0.to_string())
			.bind(&variant.key)
			.bind(&variant.value)
			.bind(variant.weight as i64)
			.execute(&mut *tx)
			.await?;
		}

		let mut configs = Vec::with_capacity(input.environments.len());
		for env_name in &input.environments {
			let env_id: Option<(String,)> =
				sqlx::query_as("SELECT id FROM environments WHERE name = ?")
					.bind(env_name)
					.fetch_optional(&mut *tx)
					.await?;
			let Some((env_id,)) = env_id else {
				return Err(StoreError::EnvironmentNotFound(env_name.clone()));
			};
			let environment_id = env_id
				.parse::<Uuid>()
				.map(EnvironmentId)
				.map_err(|e| StoreError::CorruptRow {
					column: "id",
					reason: e.to_string(),
				})?;

			let config = FlagConfig {
				id: flagforge_core::FlagConfigId::new(),
				flag_id: flag.id,
				environment_id,
				enabled: false,
				default_variant: default_variant.clone(),
				rollout_percentage: 0,
				config_blob: None,
				created_at: now,
				updated_at: now,
			};

			sqlx::query(
				r#"
				INSERT INTO flag_configs (id, flag_id, environment_id, enabled, default_variant,
				                          rollout_percentage, config_blob, created_at, updated_at)
				VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
				"#,
			)
			.bind(config.id.0.to_string())
			.bind(config.flag_id.0.to_string())
			.bind(config.environment_id.0.to_string())
			.bind(config.enabled)
			.bind(&config.default_variant)
			.bind(config.rollout_percentage as i64)
			.bind(config.config_blob.as_ref().map(|v| v.to_string()))
			.bind(config.created_at.to_rfc3339())
			.bind(config.updated_at.to_rfc3339())
			.execute(&mut *tx)
			.await?;

			configs.push(config);
		}

		audit::record(&mut tx, "flag", &flag.id.to_string(), "create", Some(actor), &flag).await?;
		tx.commit().await?;

		Ok(CreatedFlag {
			flag,
			variants,
			configs,
		})
	}

	#[instrument(skip(self))]
	async fn get_flag(&self, key: &str) -> Result<Option<Flag>> {
		let row = sqlx::query_as::<_, FlagRow>(
			r#"
			SELECT id, key, name, description, flag_type, tags, active, created_at, updated_at
			FROM feature_flags WHERE key = ? AND active = 1
			"#,
		)
		.bind(key)
		.fetch_optional(&self.pool)
		.await?;
		row.map(Flag::try_from).transpose()
	}

	#[instrument(skip(self))]
	async fn list_flags(&self) -> Result<Vec<Flag>> {
		let rows = sqlx::query_as::<_, FlagRow>(
			r#"
			SELECT id, key, name, description, flag_type, tags, active, created_at, updated_at
			FROM feature_flags ORDER BY created_at ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;
		rows.into_iter().map(Flag::try_from).collect()
	}

	#[instrument(skip(self, update), fields(flag_key = %key))]
	async fn update_flag_metadata(&self, key: &str, update: FlagMetadataUpdate, actor: &str) -> Result<Flag> {
		let flag_id = self.load_flag_id(key).await?;

		let mut tx = self.pool.begin().await?;

		let current = sqlx::query_as::<_, FlagRow>(
			"SELECT id, key, name, description, flag_type, tags, active, created_at, updated_at FROM feature_flags WHERE id = ?",
		)
		.bind(flag_id.0.to_string())
		.fetch_one(&mut *tx)
		.await?;
		let mut flag = Flag::try_from(current)?;

		if let Some(name) = update.name {
			flag.name = name;
		}
		if let Some(description) = update.description {
			flag.description = description;
		}
		if let Some(tags) = update.tags {
			flag.tags = tags;
		}
		flag.updated_at = Utc::now();

		sqlx::query("UPDATE feature_flags SET name = ?, description = ?, tags = ?, updated_at = ? WHERE id = ?")
			.bind(&flag.name)
			.bind(&flag.description)
			.bind(serde_json::to_string(&flag.tags)?)
			.bind(flag.updated_at.to_rfc3339())
			.bind(flag_id.0.to_string())
			.execute(&mut *tx)
			.await?;

		audit::record(&mut tx, "flag", &flag_id.to_string(), "update", Some(actor), &flag).await?;
		tx.commit().await?;

		Ok(flag)
	}

	/// Soft delete: flips `active` off. Flags stay in place for audit
	/// (`spec.md` §3) — configs, variants, and rules are left untouched,
	/// since a later un-delete (out of scope here, but schema-compatible)
	/// should find them intact.
	#[instrument(skip(self))]
	async fn delete_flag(&self, key: &str, actor: &str) -> Result<bool> {
		let flag_id = match self.load_flag_id(key).await {
			Ok(id) => id,
			Err(StoreError::FlagNotFound(_)) => return Ok(false),
			Err(e) => return Err(e),
		};

		let mut tx = self.pool.begin().await?;
		let result = sqlx::query("UPDATE feature_flags SET active = 0, updated_at = ? WHERE id = ? AND active = 1")
			.bind(Utc::now().to_rfc3339())
			.bind(flag_id.0.to_string())
			.execute(&mut *tx)
			.await?;
		audit::record(&mut tx, "flag", &flag_id.to_string(), "delete", Some(actor), &key).await?;
		tx.commit().await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self))]
	async fn get_flag_config(
		&self,
		flag_key: &str,
		environment: &str,
	) -> Result<Option<ResolvedFlagConfig>> {
		self.load_resolved(flag_key, environment).await
	}

	#[instrument(skip(self, update), fields(flag_key = %flag_key, environment = %environment))]
	async fn update_flag_config(
		&self,
		flag_key: &str,
		environment: &str,
		update: FlagConfigUpdate,
		actor: &str,
	) -> Result<ResolvedFlagConfig> {
		let flag_id = self.load_flag_id(flag_key).await?;
		let environment_id = self.load_environment_id(environment).await?;

		let existing = sqlx::query_as::<_, FlagConfigRow>(
			"SELECT id, flag_id, environment_id, enabled, default_variant, rollout_percentage, config_blob, created_at, updated_at FROM flag_configs WHERE flag_id = ? AND environment_id = ?",
		)
		.bind(flag_id.0.to_string())
		.bind(environment_id.0.to_string())
		.fetch_optional(&self.pool)
		.await?
		.ok_or_else(|| StoreError::EnvironmentNotFound(environment.to_string()))?;

		let config_id = existing.id.clone();
		let mut config = FlagConfig::try_from(existing)?;

		if let Some(enabled) = update.enabled {
			config.enabled = enabled;
		}
		if let Some(default_variant) = update.default_variant {
			config.default_variant = default_variant;
		}
		if let Some(rollout_percentage) = update.rollout_percentage {
			config.rollout_percentage = rollout_percentage;
		}
		if let Some(config_blob) = update.config_blob {
			config.config_blob = config_blob;
		}
		config.updated_at = Utc::now();

		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
			UPDATE flag_configs
			SET enabled = ?, default_variant = ?, rollout_percentage = ?, config_blob = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(config.enabled)
		.bind(&config.default_variant)
		.bind(config.rollout_percentage as i64)
		.bind(config.config_blob.as_ref().map(|v| v.to_string()))
		.bind(config.updated_at.to_rfc3339())
		.bind(&config_id)
		.execute(&mut *tx)
		.await?;

		if let Some(variants) = &update.variants {
			sqlx::query("DELETE FROM flag_variants WHERE flag_id = ?")
				.bind(flag_id.0.to_string())
				.execute(&mut *tx)
				.await?;
			for variant in variants {
				sqlx::query(
					"INSERT INTO flag_variants (id, flag_id, key, value, weight) VALUES (?, ?, ?, ?, ?)",
				)
				.bind(Uuid::new_v4().to_string())
				.bind(flag_id.0.to_string())
				.bind(&variant.key)
				.bind(&variant.value)
				.bind(variant.weight as i64)
				.execute(&mut *tx)
				.await?;
			}
		}

		if let Some(rules) = &update.rules {
			sqlx::query("DELETE FROM rollout_rules WHERE flag_config_id = ?")
				.bind(&config_id)
				.execute(&mut *tx)
				.await?;
			for rule in rules {
				sqlx::query(
					r#"
					INSERT INTO rollout_rules (id, flag_config_id, rule_type, priority, attribute_name,
					                           attribute_operator, attribute_value, percentage, user_ids, variant_key)
					VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
					"#,
				)
				.bind(Uuid::new_v4().to_string())
				.bind(&config_id)
				.bind(rule_type_column(rule.rule_type))
				.bind(rule.priority)
				.bind(&rule.attribute_name)
				.bind(rule.attribute_operator.map(attribute_operator_column))
				.bind(&rule.attribute_value)
				.bind(rule.percentage.map(|p| p as i64))
				.bind(&rule.user_ids)
				.bind(&rule.variant_key)
				.execute(&mut *tx)
				.await?;
			}
		}

		audit::record(
			&mut tx,
			"flag_config",
			&config_id,
			"update",
			Some(actor),
			&config,
		)
		.await?;
		tx.commit().await?;

		self.load_resolved(flag_key, environment)
			.await?
			.ok_or_else(|| StoreError::FlagNotFound(flag_key.to_string()))
	}

	#[instrument(skip(self))]
	async fn toggle_flag(
		&self,
		flag_key: &str,
		environment: &str,
		enabled: bool,
		actor: &str,
	) -> Result<ResolvedFlagConfig> {
		self.update_flag_config(
			flag_key,
			environment,
			FlagConfigUpdate {
				enabled: Some(enabled),
				..Default::default()
			},
			actor,
		)
		.await
	}

	#[instrument(skip(self))]
	async fn set_kill_switch(&self, flag_key: &str, actor: &str) -> Result<Vec<ResolvedFlagConfig>> {
		let flag_id = self.load_flag_id(flag_key).await?;

		let env_rows: Vec<(String,)> = sqlx::query_as(
			"SELECT e.name FROM environments e JOIN flag_configs fc ON fc.environment_id = e.id WHERE fc.flag_id = ?",
		)
		.bind(flag_id.0.to_string())
		.fetch_all(&self.pool)
		.await?;

		let mut resolved = Vec::with_capacity(env_rows.len());
		for (environment,) in env_rows {
			let updated = self
				.update_flag_config(
					flag_key,
					&environment,
					FlagConfigUpdate {
						enabled: Some(false),
						..Default::default()
					},
					actor,
				)
				.await?;
			resolved.push(updated);
		}

		Ok(resolved)
	}

	#[instrument(skip(self))]
	async fn record_evaluation(
		&self,
		flag_key: &str,
		environment: &str,
		result: &str,
		reason: &str,
	) -> Result<()> {
		sqlx::query(
			"INSERT INTO flag_evaluations (id, flag_key, environment, result, reason, created_at) VALUES (?, ?, ?, ?, ?, ?)",
		)
		.bind(Uuid::new_v4().to_string())
		.bind(flag_key)
		.bind(environment)
		.bind(result)
		.bind(reason)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlx::sqlite::SqlitePoolOptions;

	async fn test_store() -> SqliteFlagStore {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		SqliteFlagStore::from_pool(pool).await.unwrap()
	}

	async fn seeded_store() -> SqliteFlagStore {
		let store = test_store().await;
		store.create_environment("production").await.unwrap();
		store.create_environment("staging").await.unwrap();
		store
	}

	fn new_flag(key: &str, environments: &[&str]) -> NewFlag {
		NewFlag {
			key: key.to_string(),
			name: key.to_string(),
			description: None,
			flag_type: FlagType::Boolean,
			tags: vec![],
			variants: vec![],
			environments: environments.iter().map(|s| s.to_string()).collect(),
		}
	}

	#[tokio::test]
	async fn create_flag_is_retrievable_with_default_variants() {
		let store = seeded_store().await;
		let created = store
			.create_flag(new_flag("checkout_v2", &["production"]), "test-actor")
			.await
			.unwrap();

		assert_eq!(created.variants.len(), 2);
		assert_eq!(created.configs.len(), 1);

		let flag = store.get_flag("checkout_v2").await.unwrap().unwrap();
		assert_eq!(flag.key, "checkout_v2");
		assert!(flag.active);
	}

	#[tokio::test]
	async fn update_flag_metadata_only_touches_named_fields() {
		let store = seeded_store().await;
		store
			.create_flag(new_flag("checkout_v2", &["production"]), "test-actor")
			.await
			.unwrap();

		let updated = store
			.update_flag_metadata(
				"checkout_v2",
				FlagMetadataUpdate {
					name: Some("Checkout V2".to_string()),
					tags: Some(vec!["growth".to_string()]),
					..Default::default()
				},
				"test-actor",
			)
			.await
			.unwrap();

		assert_eq!(updated.name, "Checkout V2");
		assert_eq!(updated.tags, vec!["growth".to_string()]);
		assert_eq!(updated.key, "checkout_v2");
		assert!(updated.description.is_none());
	}

	#[tokio::test]
	async fn create_flag_rejects_duplicate_key() {
		let store = seeded_store().await;
		store
			.create_flag(new_flag("checkout_v2", &["production"]), "test-actor")
			.await
			.unwrap();

		let err = store
			.create_flag(new_flag("checkout_v2", &["production"]), "test-actor")
			.await
			.unwrap_err();
		assert!(matches!(err, StoreError::FlagAlreadyExists(_)));
	}

	#[tokio::test]
	async fn create_flag_fails_atomically_on_unknown_environment() {
		let store = seeded_store().await;
		let result = store
			.create_flag(new_flag("checkout_v2", &["nonexistent"]), "test-actor")
			.await;
		assert!(result.is_err());

		// The whole transaction must have rolled back: no partial flag row.
		assert!(store.get_flag("checkout_v2").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn update_flag_config_replaces_rules_atomically() {
		let store = seeded_store().await;
		store
			.create_flag(new_flag("checkout_v2", &["production"]), "test-actor")
			.await
			.unwrap();

		let resolved = store
			.update_flag_config(
				"checkout_v2",
				"production",
				FlagConfigUpdate {
					enabled: Some(true),
					rollout_percentage: Some(50),
					rules: Some(vec![NewRule {
						rule_type: RuleType::UserId,
						priority: 0,
						attribute_name: None,
						attribute_operator: None,
						attribute_value: None,
						percentage: None,
						user_ids: Some("alice,bob".to_string()),
						variant_key: Some("true".to_string()),
					}]),
					..Default::default()
				},
				"test-actor",
			)
			.await
			.unwrap();

		assert!(resolved.config.enabled);
		assert_eq!(resolved.config.rollout_percentage, 50);
		assert_eq!(resolved.rules.len(), 1);
		assert_eq!(resolved.rules[0].user_ids.as_deref(), Some("alice,bob"));

		// Replacing again with an empty rule set must fully clear the old ones.
		let resolved = store
			.update_flag_config(
				"checkout_v2",
				"production",
				FlagConfigUpdate {
					rules: Some(vec![]),
					..Default::default()
				},
				"test-actor",
			)
			.await
			.unwrap();
		assert!(resolved.rules.is_empty());
	}

	#[tokio::test]
	async fn toggle_flag_only_affects_named_environment() {
		let store = seeded_store().await;
		store
			.create_flag(new_flag("checkout_v2", &["production", "staging"]), "test-actor")
			.await
			.unwrap();

		store.toggle_flag("checkout_v2", "production", true, "test-actor").await.unwrap();

		let prod = store.get_flag_config("checkout_v2", "production").await.unwrap().unwrap();
		let staging = store.get_flag_config("checkout_v2", "staging").await.unwrap().unwrap();
		assert!(prod.config.enabled);
		assert!(!staging.config.enabled);
	}

	#[tokio::test]
	async fn kill_switch_disables_every_environment() {
		let store = seeded_store().await;
		store
			.create_flag(new_flag("checkout_v2", &["production", "staging"]), "test-actor")
			.await
			.unwrap();
		store.toggle_flag("checkout_v2", "production", true, "test-actor").await.unwrap();
		store.toggle_flag("checkout_v2", "staging", true, "test-actor").await.unwrap();

		let resolved = store.set_kill_switch("checkout_v2", "test-actor").await.unwrap();
		assert_eq!(resolved.len(), 2);
		assert!(resolved.iter().all(|r| !r.config.enabled));
	}

	#[tokio::test]
	async fn delete_flag_soft_deletes_and_is_idempotent() {
		let store = seeded_store().await;
		store
			.create_flag(new_flag("checkout_v2", &["production"]), "test-actor")
			.await
			.unwrap();

		assert!(store.delete_flag("checkout_v2", "test-actor").await.unwrap());

		// Soft-deleted: invisible to get_flag (active-only), but the row,
		// its configs, variants and rules all survive for audit purposes.
		assert!(store.get_flag("checkout_v2").await.unwrap().is_none());
		assert!(store
			.get_flag_config("checkout_v2", "production")
			.await
			.unwrap()
			.is_some());

		// Deleting an already-inactive flag is a no-op, not an error.
		assert!(!store.delete_flag("checkout_v2", "test-actor").await.unwrap());
	}

	#[tokio::test]
	async fn concurrent_reader_never_observes_a_torn_update() {
		use std::sync::Arc;

		let store = Arc::new(seeded_store().await);
		store
			.create_flag(new_flag("checkout_v2", &["production"]), "test-actor")
			.await
			.unwrap();

		let writer_store = store.clone();
		let writer = tokio::spawn(async move {
			for pct in [10u32, 50, 90, 100] {
				writer_store
					.update_flag_config(
						"checkout_v2",
						"production",
						FlagConfigUpdate {
							rollout_percentage: Some(pct),
							rules: Some(vec![NewRule {
								rule_type: RuleType::Percentage,
								priority: 0,
								attribute_name: None,
								attribute_operator: None,
								attribute_value: None,
								percentage: Some(pct),
								user_ids: None,
								variant_key: None,
							}]),
							..Default::default()
						},
						"test-actor",
					)
					.await
					.unwrap();
			}
		});

		let reader_store = store.clone();
		let reader = tokio::spawn(async move {
			for _ in 0..20 {
				let resolved = reader_store
					.get_flag_config("checkout_v2", "production")
					.await
					.unwrap()
					.unwrap();
				// A torn read would show a config percentage with zero rules,
				// or rules whose percentage disagrees with the config row.
				if let Some(rule) = resolved.rules.first() {
					assert_eq!(rule.percentage, Some(resolved.config.rollout_percentage));
				}
			}
		});

		writer.await.unwrap();
		reader.await.unwrap();
	}
}
