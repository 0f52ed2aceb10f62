// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a cache's hit/miss/invalidation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub invalidations: u64,
}

/// Atomic counters backing [`CacheStats`]; cheap to clone (`Arc` internally
/// via the cache impls that hold one), safe to update from concurrent
/// evaluation requests.
#[derive(Debug, Default)]
pub struct CacheCounters {
	hits: AtomicU64,
	misses: AtomicU64,
	invalidations: AtomicU64,
}

impl CacheCounters {
	pub fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_miss(&self) {
		self.misses.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_invalidation(&self) {
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> CacheStats {
		CacheStats {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			invalidations: self.invalidations.load(Ordering::Relaxed),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counters_accumulate_independently() {
		let counters = CacheCounters::default();
		counters.record_hit();
		counters.record_hit();
		counters.record_miss();
		counters.record_invalidation();

		let snapshot = counters.snapshot();
		assert_eq!(snapshot.hits, 2);
		assert_eq!(snapshot.misses, 1);
		assert_eq!(snapshot.invalidations, 1);
	}
}
