// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Core domain types, fingerprint hasher, and rule engine for FlagForge.
//!
//! This crate has no I/O dependencies. It is shared, unmodified, between the
//! server-side Evaluation Service (`flagforge-server`) and the client SDK
//! (`flagforge-sdk`) so that local and remote evaluation produce identical
//! decisions for the same inputs.

pub mod decision;
pub mod environment;
pub mod error;
pub mod flag;
pub mod hasher;
pub mod ids;
pub mod resolved;
pub mod rule;
pub mod rule_engine;
pub mod user_context;

pub use decision::{Decision, EvaluationReason};
pub use environment::Environment;
pub use error::{CoreError, Result};
pub use flag::{Flag, FlagConfig, FlagType, TypedValue, Variant};
pub use hasher::{bucket, bucket_for_user, fingerprint, ANONYMOUS_ID};
pub use ids::{EnvironmentId, FlagConfigId, FlagId, RuleId};
pub use resolved::ResolvedFlagConfig;
pub use rule::{AttributeOperator, Rule, RuleType};
pub use rule_engine::{evaluate, evaluate_rule, RuleOutcome};
pub use user_context::UserContext;
