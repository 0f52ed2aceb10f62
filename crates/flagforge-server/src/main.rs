// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Flagforge server binary: starts the Evaluation Service, Control Plane,
//! and Metrics HTTP applications, each on its own configured port.

use std::sync::Arc;

use clap::Parser;
use flagforge_cache::{ConfigCache, InMemoryConfigCache, RedisConfigCache};
use flagforge_server::{control_router, evaluation_router, metrics_router, AppState, ServerConfig};
use flagforge_store::{FlagStore, SqliteFlagStore};
use flagforge_server::metrics::Metrics;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Flagforge server - Evaluation Service, Control Plane, and Metrics.
#[derive(Parser, Debug)]
#[command(name = "flagforge-server", about = "Flagforge server", version)]
struct Args {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let _args = Args::parse();

	let config = ServerConfig::from_env()?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.log_level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		environment = %config.environment,
		control_plane_port = config.control_plane_port,
		evaluation_service_port = config.evaluation_service_port,
		metrics_port = config.metrics_port,
		"starting flagforge-server"
	);

	let store: Arc<dyn FlagStore> = Arc::new(SqliteFlagStore::connect(&config.database.sqlite_url()).await?);

	let cache: Arc<dyn ConfigCache> = match RedisConfigCache::connect(&config.redis.connection_url()).await {
		Ok(redis_cache) => Arc::new(redis_cache),
		Err(e) => {
			tracing::warn!(error = %e, "redis unavailable, falling back to in-memory config cache");
			Arc::new(InMemoryConfigCache::new())
		}
	};

	let metrics = Arc::new(Metrics::new());
	let state = AppState::new(store, cache, metrics, config.api_key.clone());

	let mut cors = CorsLayer::new();
	if config.cors_enabled {
		cors = cors.allow_origin(Any).allow_methods(Any).allow_headers(Any);
	}

	let evaluation_app = evaluation_router(state.clone())
		.layer(TraceLayer::new_for_http())
		.layer(cors.clone());
	let control_app = control_router(state.clone())
		.layer(TraceLayer::new_for_http())
		.layer(cors.clone());
	let metrics_app = metrics_router(state).layer(TraceLayer::new_for_http());

	let evaluation_listener =
		tokio::net::TcpListener::bind(("0.0.0.0", config.evaluation_service_port)).await?;
	let control_listener = tokio::net::TcpListener::bind(("0.0.0.0", config.control_plane_port)).await?;
	let metrics_listener = tokio::net::TcpListener::bind(("0.0.0.0", config.metrics_port)).await?;

	tracing::info!(addr = %evaluation_listener.local_addr()?, "evaluation service listening");
	tracing::info!(addr = %control_listener.local_addr()?, "control plane listening");
	tracing::info!(addr = %metrics_listener.local_addr()?, "metrics listening");

	tokio::select! {
		result = axum::serve(evaluation_listener, evaluation_app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "evaluation service error");
			}
		}
		result = axum::serve(control_listener, control_app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "control plane error");
			}
		}
		result = axum::serve(metrics_listener, metrics_app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "metrics server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	tracing::info!("flagforge-server shutdown complete");
	Ok(())
}
