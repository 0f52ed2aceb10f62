// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Evaluation Service, Control Plane, and Metrics surface for Flagforge.
//!
//! These are three independent HTTP applications sharing one [`AppState`]
//! (one store pool, one cache connection, one metrics registry), served on
//! the three ports named in `spec.md` §6.

pub mod auth;
pub mod config;
pub mod error;
pub mod evaluation_service;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, Result};
pub use state::AppState;

use axum::Router;

/// Builds the Evaluation Service router, unauthenticated, per `spec.md` §6.
pub fn evaluation_router(state: AppState) -> Router {
	routes::evaluation::router(state)
}

/// Builds the Control Plane router; every route but the implicit health
/// check sits behind [`auth::require_api_key`].
pub fn control_router(state: AppState) -> Router {
	routes::control::router(state)
}

/// Builds the Metrics router (`/metrics`, `/health`).
pub fn metrics_router(state: AppState) -> Router {
	routes::metrics::router(state)
}
