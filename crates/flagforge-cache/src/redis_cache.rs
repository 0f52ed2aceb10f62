// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! A Redis-backed `ConfigCache`. Stores each resolved config as a JSON blob
//! under its `flag_config:<key>:<environment>` key, and maintains a Redis
//! `SET` index per flag key (`flag_config_index:<key>`) so that invalidating
//! every environment for a flag is a `SMEMBERS` + pipelined `DEL`, never a
//! blocking `KEYS` scan across the keyspace.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::instrument;

use crate::cache_key::{config_key, index_key, DEFAULT_TTL_SECS};
use crate::config::CachedFlagConfig;
use crate::error::Result;
use crate::stats::{CacheCounters, CacheStats};
use crate::traits::ConfigCache;

/// Registry `SET` of every flag key ever written through `set()`, used only
/// to answer `cached_flag_keys()` without a blocking `KEYS` scan. Entries
/// are not proactively removed when a flag's last environment expires by
/// TTL (cheaper, and harmless for a diagnostic listing); `invalidate_all_envs`
/// does remove them, since that's an explicit "this flag is gone" signal.
const KNOWN_FLAGS_KEY: &str = "flag_config_known_flags";

#[derive(Clone)]
pub struct RedisConfigCache {
	conn: ConnectionManager,
	ttl: Duration,
	counters: Arc<CacheCounters>,
}

impl RedisConfigCache {
	/// Connects using `redis_url` (e.g. `redis://host:port/db`), failing
	/// fast if Redis is unreachable at startup.
	pub async fn connect(redis_url: &str) -> Result<Self> {
		Self::connect_with_ttl(redis_url, Duration::from_secs(DEFAULT_TTL_SECS)).await
	}

	pub async fn connect_with_ttl(redis_url: &str, ttl: Duration) -> Result<Self> {
		let client = redis::Client::open(redis_url)?;
		let conn = ConnectionManager::new(client).await?;
		Ok(Self {
			conn,
			ttl,
			counters: Arc::new(CacheCounters::default()),
		})
	}
}

#[async_trait]
impl ConfigCache for RedisConfigCache {
	#[instrument(skip(self), fields(flag_key, environment))]
	async fn get(&self, flag_key: &str, environment: &str) -> Result<Option<CachedFlagConfig>> {
		let key = config_key(flag_key, environment);
		let mut conn = self.conn.clone();
		let raw: Option<String> = conn.get(&key).await?;

		match raw {
			Some(json) => {
				self.counters.record_hit();
				Ok(Some(serde_json::from_str(&json)?))
			}
			None => {
				self.counters.record_miss();
				Ok(None)
			}
		}
	}

	#[instrument(skip(self, value), fields(flag_key, environment))]
	async fn set(&self, flag_key: &str, environment: &str, value: &CachedFlagConfig) -> Result<()> {
		let key = config_key(flag_key, environment);
		let json = serde_json::to_string(value)?;
		let mut conn = self.conn.clone();

		let () = conn.set_ex(&key, json, self.ttl.as_secs().max(1)).await?;
		let _: i64 = conn.sadd(index_key(flag_key), &key).await?;
		let _: i64 = conn.sadd(KNOWN_FLAGS_KEY, flag_key).await?;
		Ok(())
	}

	#[instrument(skip(self), fields(flag_key, environment))]
	async fn invalidate_one(&self, flag_key: &str, environment: &str) -> Result<()> {
		let key = config_key(flag_key, environment);
		let mut conn = self.conn.clone();

		let _: i64 = conn.del(&key).await?;
		let _: i64 = conn.srem(index_key(flag_key), &key).await?;
		self.counters.record_invalidation();
		Ok(())
	}

	#[instrument(skip(self), fields(flag_key))]
	async fn invalidate_all_envs(&self, flag_key: &str) -> Result<()> {
		let idx_key = index_key(flag_key);
		let mut conn = self.conn.clone();

		let keys: Vec<String> = conn.smembers(&idx_key).await?;
		if !keys.is_empty() {
			let _: i64 = conn.del(&keys).await?;
		}
		let _: i64 = conn.del(&idx_key).await?;
		let _: i64 = conn.srem(KNOWN_FLAGS_KEY, flag_key).await?;

		self.counters.record_invalidation();
		Ok(())
	}

	async fn stats(&self) -> CacheStats {
		self.counters.snapshot()
	}

	#[instrument(skip(self))]
	async fn cached_flag_keys(&self) -> Result<Vec<String>> {
		let mut conn = self.conn.clone();
		let keys: Vec<String> = conn.smembers(KNOWN_FLAGS_KEY).await?;
		Ok(keys)
	}
}
