// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
	#[error("redis error: {0}")]
	Redis(#[from] redis::RedisError),
	#[error("failed to serialize cached config: {0}")]
	Serialize(#[from] serde_json::Error),
	#[error("cache backend unavailable: {0}")]
	Unavailable(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
