// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::flag::{Flag, FlagConfig, Variant};
use crate::rule::Rule;

/// The full snapshot the Rule Engine needs to evaluate one flag in one
/// environment. This is what the Flag Store assembles on a cache miss, what
/// the Config Cache stores verbatim as one JSON blob, and what `/sdk/config`
/// returns per flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFlagConfig {
	pub flag: Flag,
	pub config: FlagConfig,
	pub variants: Vec<Variant>,
	pub rules: Vec<Rule>,
}
