// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! SDK-facing error type. `evaluate_flag` never surfaces these to a caller
//! directly — every evaluation fault degrades to the caller's default value
//! per `spec.md` §4.7 step 3 — but they're used internally to drive the
//! `pollError`/`evaluationError` event streams and are returned by
//! [`crate::client::FlagsClient::refresh`] for callers that want to observe
//! poll failures directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
	#[error("connection failed: {0}")]
	ConnectionFailed(#[from] reqwest::Error),
	#[error("server returned {status}: {message}")]
	ServerError { status: u16, message: String },
	#[error("failed to parse response: {0}")]
	ParseFailed(String),
	#[error("request exceeded its configured timeout")]
	Timeout,
	#[error("client has been destroyed")]
	Destroyed,
}

pub type Result<T> = std::result::Result<T, SdkError>;
