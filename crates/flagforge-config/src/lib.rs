// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Environment-variable configuration loading for FlagForge.
//!
//! Re-exports [`Secret`]/[`SecretString`] from `flagforge-secret` and adds
//! [`env`] helpers for reading plain and secret values out of the process
//! environment, including `<NAME>_FILE` indirection for secrets.

pub mod env;

pub use env::{env_bool, env_or, env_or_parse, load_secret_env, required_secret_env, RequiredSecretError, SecretEnvError};
pub use flagforge_secret::{Secret, SecretString, REDACTED};
