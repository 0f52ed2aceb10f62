// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Config Cache: a fast, per-environment cache of resolved flag configs
//! in front of the Flag Store.
//!
//! [`ConfigCache`] is the seam both the Evaluation Service (reads, on miss
//! falls through to the Flag Store) and the Control Plane (invalidation,
//! after every mutation commits) depend on. [`RedisConfigCache`] is the
//! production backend; [`InMemoryConfigCache`] backs tests and
//! Redis-less deployments.

mod cache_key;
mod config;
mod error;
mod in_memory;
mod redis_cache;
mod stats;
mod traits;

pub use cache_key::{config_key, index_key, DEFAULT_TTL_SECS};
pub use config::CachedFlagConfig;
pub use error::{CacheError, Result};
pub use in_memory::InMemoryConfigCache;
pub use redis_cache::RedisConfigCache;
pub use stats::{CacheCounters, CacheStats};
pub use traits::ConfigCache;
