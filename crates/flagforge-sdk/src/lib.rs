// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Client SDK for FlagForge.
//!
//! This crate evaluates flags against a FlagForge Evaluation Service. It
//! holds an eventually-consistent local snapshot of one environment's
//! active flags, refreshed by conditional long-poll, and evaluates against
//! that snapshot using the same Rule Engine the server uses
//! ([`flagforge_core::evaluate`]) whenever the requested flag is present
//! locally. A cache miss, or local evaluation being disabled, falls through
//! to a remote `/evaluate` call; any failure in either path degrades to the
//! caller's default value.
//!
//! # Example
//!
//! ```ignore
//! use flagforge_sdk::{FlagsClient, UserContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FlagsClient::builder("sdk-key", "https://flags.example.com")
//!         .environment("production")
//!         .build()
//!         .await?;
//!
//!     let context = UserContext::anonymous()
//!         .with_user_id("user-123")
//!         .with_attribute("plan", "enterprise");
//!
//!     let value = client.evaluate_flag("dark_mode", &context, serde_json::json!(false)).await;
//!     println!("dark_mode = {value}");
//!     Ok(())
//! }
//! ```

mod analytics;
mod client;
mod config;
mod error;
mod events;
mod snapshot;

pub use analytics::FlagExposure;
pub use client::{BatchRequest, FlagsClient, FlagsClientBuilder};
pub use config::SdkConfig;
pub use error::{Result, SdkError};
pub use events::{
	AnalyticsFlushEvent, ConfigUpdatedEvent, ErrorEvent, EvaluationErrorEvent, EvaluationEvent,
	PollErrorEvent, ReadyEvent,
};
pub use snapshot::Snapshot;

// Re-exported so callers don't need a direct `flagforge-core` dependency
// just to build an evaluation context.
pub use flagforge_core::UserContext;
