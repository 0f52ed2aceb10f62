// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! An in-process `ConfigCache`, used in tests and in deployments that run
//! without Redis. Mirrors the tag-indexed invalidation shape of a
//! Redis-backed cache so `invalidate_all_envs` never has to scan every key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache_key::{config_key, index_key, DEFAULT_TTL_SECS};
use crate::config::CachedFlagConfig;
use crate::error::Result;
use crate::stats::{CacheCounters, CacheStats};
use crate::traits::ConfigCache;

struct Entry {
	value: CachedFlagConfig,
	expires_at: Instant,
}

/// `RwLock<HashMap>`-backed [`ConfigCache`] with manual TTL expiry, plus a
/// flag-key -> cache-key index so invalidating every environment for a flag
/// is O(environments) rather than a scan over the whole map.
pub struct InMemoryConfigCache {
	entries: RwLock<HashMap<String, Entry>>,
	index: RwLock<HashMap<String, HashSet<String>>>,
	ttl: Duration,
	counters: Arc<CacheCounters>,
}

impl InMemoryConfigCache {
	pub fn new() -> Self {
		Self::with_ttl(Duration::from_secs(DEFAULT_TTL_SECS))
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			index: RwLock::new(HashMap::new()),
			ttl,
			counters: Arc::new(CacheCounters::default()),
		}
	}
}

impl Default for InMemoryConfigCache {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ConfigCache for InMemoryConfigCache {
	async fn get(&self, flag_key: &str, environment: &str) -> Result<Option<CachedFlagConfig>> {
		let key = config_key(flag_key, environment);
		let mut entries = self.entries.write().await;

		let Some(entry) = entries.get(&key) else {
			self.counters.record_miss();
			return Ok(None);
		};

		if entry.expires_at <= Instant::now() {
			entries.remove(&key);
			self.counters.record_miss();
			return Ok(None);
		}

		self.counters.record_hit();
		Ok(Some(entry.value.clone()))
	}

	async fn set(&self, flag_key: &str, environment: &str, value: &CachedFlagConfig) -> Result<()> {
		let key = config_key(flag_key, environment);

		let mut entries = self.entries.write().await;
		entries.insert(
			key.clone(),
			Entry {
				value: value.clone(),
				expires_at: Instant::now() + self.ttl,
			},
		);
		drop(entries);

		let mut index = self.index.write().await;
		index.entry(index_key(flag_key)).or_default().insert(key);
		Ok(())
	}

	async fn invalidate_one(&self, flag_key: &str, environment: &str) -> Result<()> {
		let key = config_key(flag_key, environment);

		self.entries.write().await.remove(&key);

		let mut index = self.index.write().await;
		if let Some(keys) = index.get_mut(&index_key(flag_key)) {
			keys.remove(&key);
		}

		self.counters.record_invalidation();
		Ok(())
	}

	async fn invalidate_all_envs(&self, flag_key: &str) -> Result<()> {
		let idx_key = index_key(flag_key);
		let mut index = self.index.write().await;

		if let Some(keys) = index.remove(&idx_key) {
			let mut entries = self.entries.write().await;
			for key in keys {
				entries.remove(&key);
			}
		}

		self.counters.record_invalidation();
		Ok(())
	}

	async fn stats(&self) -> CacheStats {
		self.counters.snapshot()
	}

	async fn cached_flag_keys(&self) -> Result<Vec<String>> {
		let prefix = index_key("");
		let index = self.index.read().await;
		Ok(index
			.iter()
			.filter(|(_, keys)| !keys.is_empty())
			.map(|(idx_key, _)| idx_key.trim_start_matches(&prefix).to_string())
			.collect())
	}
}
