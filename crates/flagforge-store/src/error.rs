// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("failed to (de)serialize stored JSON: {0}")]
	Serialize(#[from] serde_json::Error),
	#[error("flag not found: {0}")]
	FlagNotFound(String),
	#[error("environment not found: {0}")]
	EnvironmentNotFound(String),
	#[error("flag already exists: {0}")]
	FlagAlreadyExists(String),
	#[error("invalid stored data in column {column}: {reason}")]
	CorruptRow { column: &'static str, reason: String },
	#[error(transparent)]
	Core(#[from] flagforge_core::CoreError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
