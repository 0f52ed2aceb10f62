// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::config::CachedFlagConfig;
use crate::error::Result;
use crate::stats::CacheStats;

/// The Config Cache seam: a fast, environment-scoped store for resolved flag
/// configs, fronting the Flag Store. Evaluation requests read through this;
/// mutations invalidate through it.
#[async_trait]
pub trait ConfigCache: Send + Sync {
	async fn get(&self, flag_key: &str, environment: &str) -> Result<Option<CachedFlagConfig>>;

	async fn set(&self, flag_key: &str, environment: &str, value: &CachedFlagConfig) -> Result<()>;

	/// Evicts the entry for one (flag, environment) pair.
	async fn invalidate_one(&self, flag_key: &str, environment: &str) -> Result<()>;

	/// Evicts every cached environment for a flag, e.g. after a kill-switch
	/// trip that must take effect everywhere at once.
	async fn invalidate_all_envs(&self, flag_key: &str) -> Result<()>;

	async fn stats(&self) -> CacheStats;

	/// Diagnostic: flag keys with at least one live cache entry. Backs
	/// `GET /cache` and the `cached_flags` count in `/stats`.
	async fn cached_flag_keys(&self) -> Result<Vec<String>>;
}
