// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use flagforge_cache::ConfigCache;
use flagforge_config::SecretString;
use flagforge_store::FlagStore;

use crate::metrics::Metrics;

/// Shared application state for both the Evaluation Service and the Control
/// Plane. Both axum `Router`s are built from the same `AppState` so they
/// share one store pool, one cache connection, and one metrics registry
/// even though they're served on separate ports (`spec.md` §6).
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<dyn FlagStore>,
	pub cache: Arc<dyn ConfigCache>,
	pub metrics: Arc<Metrics>,
	pub api_key: Option<SecretString>,
}

impl AppState {
	pub fn new(
		store: Arc<dyn FlagStore>,
		cache: Arc<dyn ConfigCache>,
		metrics: Arc<Metrics>,
		api_key: Option<SecretString>,
	) -> Self {
		Self {
			store,
			cache,
			metrics,
			api_key,
		}
	}
}
