// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The local config snapshot: an eventually-consistent copy of one
//! environment's active flags, keyed by flag key (`spec.md` §3's "SDK holds
//! an eventually-consistent local snapshot" ownership note). `/sdk/config`
//! returns the full `{flag, config, variants, rules}` set per flag, so a
//! snapshot replacement needs no separate fetch to become evaluable.

use std::collections::HashMap;
use std::sync::RwLock;

use flagforge_core::ResolvedFlagConfig;

#[derive(Default)]
pub struct Snapshot {
	inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
	flags: HashMap<String, ResolvedFlagConfig>,
	etag: Option<String>,
}

impl Snapshot {
	pub fn get(&self, flag_key: &str) -> Option<ResolvedFlagConfig> {
		self.inner.read().expect("snapshot lock poisoned").flags.get(flag_key).cloned()
	}

	pub fn contains(&self, flag_key: &str) -> bool {
		self.inner.read().expect("snapshot lock poisoned").flags.contains_key(flag_key)
	}

	pub fn len(&self) -> usize {
		self.inner.read().expect("snapshot lock poisoned").flags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn etag(&self) -> Option<String> {
		self.inner.read().expect("snapshot lock poisoned").etag.clone()
	}

	/// Atomically replaces the whole snapshot. Called on every non-304 poll
	/// response; there is no partial merge, matching the server's own
	/// "replace, don't patch" treatment of `/sdk/config`.
	pub fn replace(&self, flags: Vec<ResolvedFlagConfig>, etag: Option<String>) {
		let mut inner = self.inner.write().expect("snapshot lock poisoned");
		inner.flags = flags.into_iter().map(|f| (f.flag.key.clone(), f)).collect();
		inner.etag = etag;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use flagforge_core::{Flag, FlagConfig, FlagType};
	use flagforge_core::ids::{EnvironmentId, FlagConfigId, FlagId};

	fn resolved(key: &str) -> ResolvedFlagConfig {
		ResolvedFlagConfig {
			flag: Flag {
				id: FlagId::new(),
				key: key.to_string(),
				name: key.to_string(),
				description: None,
				flag_type: FlagType::Boolean,
				tags: vec![],
				active: true,
				created_at: Utc::now(),
				updated_at: Utc::now(),
			},
			config: FlagConfig {
				id: FlagConfigId::new(),
				flag_id: FlagId::new(),
				environment_id: EnvironmentId::new(),
				enabled: true,
				default_variant: "false".to_string(),
				rollout_percentage: 100,
				config_blob: None,
				created_at: Utc::now(),
				updated_at: Utc::now(),
			},
			variants: Flag::default_variants(),
			rules: vec![],
		}
	}

	#[test]
	fn empty_snapshot_has_no_flags() {
		let snapshot = Snapshot::default();
		assert!(snapshot.is_empty());
		assert!(snapshot.get("dark_mode").is_none());
		assert!(snapshot.etag().is_none());
	}

	#[test]
	fn replace_is_atomic_and_total() {
		let snapshot = Snapshot::default();
		snapshot.replace(vec![resolved("dark_mode")], Some("\"etag-1\"".to_string()));
		assert!(snapshot.contains("dark_mode"));
		assert_eq!(snapshot.len(), 1);
		assert_eq!(snapshot.etag(), Some("\"etag-1\"".to_string()));

		snapshot.replace(vec![resolved("checkout_v2")], Some("\"etag-2\"".to_string()));
		assert!(!snapshot.contains("dark_mode"));
		assert!(snapshot.contains("checkout_v2"));
		assert_eq!(snapshot.etag(), Some("\"etag-2\"".to_string()));
	}
}
