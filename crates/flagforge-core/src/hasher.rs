// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Deterministic fingerprint/bucket assignment.
//!
//! `bucket(id, salt)` must be stable across processes and releases: the
//! on-disk representation of rollout percentages depends on it. Do not
//! change the digest or byte layout without a breaking-change plan.

use sha2::{Digest, Sha256};

/// Identifier used when a context carries no `user_id`.
pub const ANONYMOUS_ID: &str = "anonymous";

/// Hashes `id || ":" || salt` with SHA-256 and reads the first four bytes
/// big-endian as a `u32` fingerprint.
pub fn fingerprint(id: &str, salt: &str) -> u32 {
	let mut hasher = Sha256::new();
	hasher.update(id.as_bytes());
	hasher.update(b":");
	hasher.update(salt.as_bytes());
	let digest = hasher.finalize();
	u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Reduces a fingerprint to a bucket in `[0, 99]`.
pub fn bucket(id: &str, salt: &str) -> u32 {
	fingerprint(id, salt) % 100
}

/// `bucket`, substituting [`ANONYMOUS_ID`] when `user_id` is absent.
pub fn bucket_for_user(user_id: Option<&str>, salt: &str) -> u32 {
	bucket(user_id.unwrap_or(ANONYMOUS_ID), salt)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashMap;

	#[test]
	fn bucket_is_in_range() {
		for i in 0..1000 {
			let id = format!("user{i}");
			let b = bucket(&id, "flag.salt");
			assert!(b < 100);
		}
	}

	#[test]
	fn bucket_is_roughly_uniform() {
		let mut counts = HashMap::new();
		for i in 0..10_000 {
			let id = format!("user{i}");
			let b = bucket(&id, "uniformity.check");
			*counts.entry(b / 10).or_insert(0u32) += 1;
		}
		// 10 deciles, expect roughly 1000 each; chi-square-lite tolerance.
		for decile in 0..10 {
			let count = *counts.get(&decile).unwrap_or(&0);
			assert!(
				(700..1300).contains(&count),
				"decile {decile} had {count} samples, expected ~1000"
			);
		}
	}

	proptest! {
		#[test]
		fn bucket_is_deterministic(id in "[a-zA-Z0-9]{1,50}", salt in "[a-zA-Z0-9._:-]{1,50}") {
			let a = bucket(&id, &salt);
			let b = bucket(&id, &salt);
			prop_assert_eq!(a, b);
		}

		#[test]
		fn bucket_always_in_range(id in "[a-zA-Z0-9]{1,50}", salt in "[a-zA-Z0-9._:-]{1,50}") {
			prop_assert!(bucket(&id, &salt) < 100);
		}

		#[test]
		fn rollout_monotonicity(id in "[a-zA-Z0-9]{1,50}", salt in "[a-zA-Z0-9._:-]{1,50}") {
			let b = bucket(&id, &salt);
			// If included at rollout p (b < p), must remain included for all p' >= p.
			for p in (b + 1)..=100 {
				prop_assert!(b < p);
			}
		}

		#[test]
		fn anonymous_default_matches_literal(salt in "[a-zA-Z0-9._:-]{1,50}") {
			prop_assert_eq!(bucket_for_user(None, &salt), bucket(ANONYMOUS_ID, &salt));
		}
	}
}
