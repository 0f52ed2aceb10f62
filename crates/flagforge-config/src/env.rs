// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use std::env::VarError;
use std::fs;

use flagforge_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file {path}: {source}")]
	FileRead {
		path: String,
		#[source]
		source: std::io::Error,
	},
	#[error("environment variable {0} is not valid unicode")]
	NotUnicode(String),
}

#[derive(Debug, Error)]
#[error("required secret {0} is not set (checked {0} and {0}_FILE)")]
pub struct RequiredSecretError(pub String);

/// Loads a secret from the environment, preferring the `<NAME>_FILE`
/// indirection (read file contents, trim trailing newline) over the literal
/// `<NAME>` variable, so secrets can be mounted as files in container
/// deployments without appearing in `docker inspect`/`ps`.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{name}_FILE");
	if let Ok(path) = std::env::var(&file_var) {
		let contents = fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
			path: path.clone(),
			source,
		})?;
		return Ok(Some(SecretString::from(contents.trim_end_matches('\n'))));
	}

	match std::env::var(name) {
		Ok(value) => Ok(Some(SecretString::from(value))),
		Err(VarError::NotPresent) => Ok(None),
		Err(VarError::NotUnicode(_)) => Err(SecretEnvError::NotUnicode(name.to_string())),
	}
}

/// Like [`load_secret_env`] but fails if neither `<NAME>` nor `<NAME>_FILE`
/// is set.
pub fn required_secret_env(name: &str) -> Result<SecretString, RequiredSecretError> {
	load_secret_env(name)
		.ok()
		.flatten()
		.ok_or_else(|| RequiredSecretError(name.to_string()))
}

/// Reads a plain (non-secret) environment variable, falling back to
/// `default` when unset.
pub fn env_or(name: &str, default: &str) -> String {
	std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Reads a plain environment variable and parses it, falling back to
/// `default` when unset or unparseable.
pub fn env_or_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
	std::env::var(name)
		.ok()
		.and_then(|v| v.parse().ok())
		.unwrap_or(default)
}

/// Reads a boolean-ish environment variable (`"true"`/`"1"` are truthy,
/// everything else — including unset — is falsy unless `default` is true).
pub fn env_bool(name: &str, default: bool) -> bool {
	match std::env::var(name) {
		Ok(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
		Err(_) => default,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn load_secret_env_prefers_file_indirection() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file-secret").unwrap();

		let file_var = "FLAGFORGE_TEST_SECRET_FILE";
		let direct_var = "FLAGFORGE_TEST_SECRET";
		std::env::set_var(file_var, file.path());
		std::env::set_var(direct_var, "from-direct-var");

		let secret = load_secret_env("FLAGFORGE_TEST_SECRET").unwrap().unwrap();
		assert_eq!(secret.expose(), "from-file-secret");

		std::env::remove_var(file_var);
		std::env::remove_var(direct_var);
	}

	#[test]
	fn load_secret_env_returns_none_when_unset() {
		std::env::remove_var("FLAGFORGE_TEST_UNSET");
		std::env::remove_var("FLAGFORGE_TEST_UNSET_FILE");
		assert!(load_secret_env("FLAGFORGE_TEST_UNSET").unwrap().is_none());
	}

	#[test]
	fn env_bool_recognizes_truthy_values() {
		std::env::set_var("FLAGFORGE_TEST_BOOL", "1");
		assert!(env_bool("FLAGFORGE_TEST_BOOL", false));
		std::env::set_var("FLAGFORGE_TEST_BOOL", "false");
		assert!(!env_bool("FLAGFORGE_TEST_BOOL", true));
		std::env::remove_var("FLAGFORGE_TEST_BOOL");
		assert!(env_bool("FLAGFORGE_TEST_BOOL", true));
	}
}
