// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Shared HTTP client with a consistent User-Agent header.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

/// Creates a new HTTP client with the standard FlagForge User-Agent header.
pub fn new_client() -> Client {
	builder().build().expect("failed to build HTTP client")
}

/// Creates a new HTTP client builder with the standard FlagForge User-Agent
/// header. Use this when the caller needs to customize the client (timeout,
/// redirect policy, ...).
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client builder with a custom User-Agent header.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	Client::builder().user_agent(user_agent.into())
}

/// Creates a new HTTP client with a custom timeout and the standard
/// User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> Client {
	builder()
		.timeout(timeout)
		.build()
		.expect("failed to build HTTP client")
}

/// Creates a new HTTP client with a custom User-Agent and timeout.
pub fn new_client_with_user_agent(user_agent: impl Into<String>) -> Client {
	builder_with_user_agent(user_agent)
		.build()
		.expect("failed to build HTTP client")
}

/// Returns the standard FlagForge User-Agent string, e.g.
/// `flagforge/0.1.0`.
pub fn user_agent() -> String {
	format!("flagforge/{}", flagforge_version::BuildInfo::current().version)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_expected_prefix() {
		let ua = user_agent();
		assert!(ua.starts_with("flagforge/"));
	}

	#[test]
	fn builder_with_custom_user_agent_builds() {
		let client = builder_with_user_agent("my-custom-agent/1.0").build();
		assert!(client.is_ok());
	}

	#[test]
	fn new_client_with_timeout_builds() {
		let _client = new_client_with_timeout(Duration::from_secs(5));
	}
}
