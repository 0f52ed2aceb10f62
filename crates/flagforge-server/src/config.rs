// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Server configuration, loaded from the environment variables named in
//! `spec.md` §6. No config file format — the teacher's own
//! `loom-server-config` layers a file over env vars, but nothing in the
//! retrieved pack's config crate was read deeply enough to ground that
//! layering, so this stays env-only, same as `flagforge-config::env`'s
//! existing helpers assume.

use flagforge_config::{env_bool, env_or, env_or_parse, load_secret_env, SecretString};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	pub host: String,
	pub port: u16,
	pub name: String,
	pub user: String,
	pub password: Option<SecretString>,
	pub ssl: bool,
	pub max_connections: u32,
}

impl DatabaseConfig {
	/// Renders a `sqlite:` URL when `DB_HOST` is unset (the local/dev path
	/// used by the binary and the test suite), or a placeholder scheme
	/// otherwise — `spec.md` names a relational schema, not a specific
	/// engine, and this implementation targets SQLite via `flagforge-store`.
	pub fn sqlite_url(&self) -> String {
		if self.name == ":memory:" {
			"sqlite::memory:".to_string()
		} else {
			format!("sqlite://{}?mode=rwc", self.name)
		}
	}

	fn from_env() -> Result<Self, flagforge_config::SecretEnvError> {
		Ok(Self {
			host: env_or("DB_HOST", "localhost"),
			port: env_or_parse("DB_PORT", 5432),
			name: env_or("DB_NAME", "flagforge.sqlite"),
			user: env_or("DB_USER", "flagforge"),
			password: load_secret_env("DB_PASS")?,
			ssl: env_bool("DB_SSL", false),
			max_connections: env_or_parse("DB_MAX_CONNECTIONS", 20),
		})
	}
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
	pub host: String,
	pub port: u16,
	pub password: Option<SecretString>,
	pub db: u32,
	pub prefix: String,
}

impl RedisConfig {
	pub fn connection_url(&self) -> String {
		match &self.password {
			Some(password) => format!(
				"redis://:{}@{}:{}/{}",
				password.expose(),
				self.host,
				self.port,
				self.db
			),
			None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
		}
	}

	fn from_env() -> Result<Self, flagforge_config::SecretEnvError> {
		Ok(Self {
			host: env_or("REDIS_HOST", "localhost"),
			port: env_or_parse("REDIS_PORT", 6379),
			password: load_secret_env("REDIS_PASSWORD")?,
			db: env_or_parse("REDIS_DB", 0),
			prefix: env_or("REDIS_PREFIX", "flagforge"),
		})
	}
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub redis: RedisConfig,
	pub control_plane_port: u16,
	pub evaluation_service_port: u16,
	pub metrics_port: u16,
	pub cors_enabled: bool,
	pub request_logging: bool,
	pub api_key: Option<SecretString>,
	pub log_level: String,
	pub environment: String,
}

impl ServerConfig {
	/// Loads configuration from the process environment. `NODE_ENV` is
	/// honored for parity with the original deployment's env var naming
	/// (`spec.md` §6: "`NODE_ENV` -> `ENVIRONMENT`") but `ENVIRONMENT` wins
	/// if both are set.
	pub fn from_env() -> Result<Self, flagforge_config::SecretEnvError> {
		let environment = std::env::var("ENVIRONMENT")
			.or_else(|_| std::env::var("NODE_ENV"))
			.unwrap_or_else(|_| "production".to_string());

		Ok(Self {
			database: DatabaseConfig::from_env()?,
			redis: RedisConfig::from_env()?,
			control_plane_port: env_or_parse("CONTROL_PLANE_PORT", 4000),
			evaluation_service_port: env_or_parse("EVALUATION_SERVICE_PORT", 4001),
			metrics_port: env_or_parse("METRICS_PORT", 9090),
			cors_enabled: env_bool("CORS_ENABLED", true),
			request_logging: env_bool("REQUEST_LOGGING", true),
			api_key: load_secret_env("API_KEY")?,
			log_level: env_or("LOG_LEVEL", "info"),
			environment,
		})
	}
}
