// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use flagforge_cache::{ConfigCache, InMemoryConfigCache};
use flagforge_config::SecretString;
use flagforge_server::metrics::Metrics;
use flagforge_server::AppState;
use flagforge_store::{FlagStore, NewFlag, SqliteFlagStore};
use sqlx::sqlite::SqlitePoolOptions;

/// A single-connection in-memory SQLite pool. `sqlite::memory:` hands out a
/// fresh, isolated database per connection, so a pool with more than one
/// connection would silently lose writes across requests; the store crate's
/// own unit tests use the same `max_connections(1)` workaround.
pub async fn test_state() -> AppState {
	test_state_with_api_key(Some("test-secret")).await
}

pub async fn test_state_with_api_key(api_key: Option<&str>) -> AppState {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	let store: Arc<dyn FlagStore> = Arc::new(SqliteFlagStore::from_pool(pool).await.unwrap());

	for env in ["development", "staging", "production"] {
		store.create_environment(env).await.unwrap();
	}

	let cache: Arc<dyn ConfigCache> = Arc::new(InMemoryConfigCache::new());
	let metrics = Arc::new(Metrics::new());

	AppState::new(store, cache, metrics, api_key.map(SecretString::from))
}

pub fn boolean_flag(key: &str) -> NewFlag {
	NewFlag {
		key: key.to_string(),
		name: key.to_string(),
		description: None,
		flag_type: flagforge_core::FlagType::Boolean,
		tags: vec![],
		variants: vec![],
		environments: vec![
			"development".to_string(),
			"staging".to_string(),
			"production".to_string(),
		],
	}
}
