// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Shared HTTP client configuration for FlagForge.
//!
//! A pre-configured `reqwest` client with a consistent User-Agent header,
//! used by both the SDK's polling client and any service-to-service calls.

mod client;

pub use client::{
	builder, builder_with_user_agent, new_client, new_client_with_timeout,
	new_client_with_user_agent, user_agent,
};
