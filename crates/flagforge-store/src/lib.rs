// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Flag Store: transactional SQLite persistence for flags, their
//! per-environment configs, variants, and rollout rules.
//!
//! [`FlagStore`] is the seam the Evaluation Service falls through to on a
//! cache miss and the Control Plane mutates through. `create_flag` and
//! `update_flag_config` run inside an explicit transaction so that a flag's
//! variants and per-environment configs (or a config and its replaced rule
//! set) are never visible in a partially-written state.

mod audit;
mod error;
mod rows;
mod store;

pub use error::{Result, StoreError};
pub use store::{
	CreatedFlag, FlagConfigUpdate, FlagMetadataUpdate, FlagStore, NewFlag, NewRule, SqliteFlagStore,
};
