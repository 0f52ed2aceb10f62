// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

/// Default cache entry lifetime, in seconds. Matches `spec.md` §4.4.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Builds the canonical cache key for a flag's resolved config in one
/// environment: `flag_config:<flag_key>:<environment>`.
pub fn config_key(flag_key: &str, environment: &str) -> String {
	format!("flag_config:{flag_key}:{environment}")
}

/// Builds the index key tracking every per-environment cache key written for
/// a given flag, so `invalidate_all_envs` doesn't need a blocking `KEYS`
/// scan.
pub fn index_key(flag_key: &str) -> String {
	format!("flag_config_index:{flag_key}")
}
