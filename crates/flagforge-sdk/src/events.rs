// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Named event streams (`spec.md` §4.7): `ready`, `error`, `configUpdated`,
//! `evaluation`, `evaluationError`, `pollError`, `analyticsFlush`. The
//! teacher's own `FlagsBroadcaster`/SSE machinery fans server-side updates
//! out over HTTP to many clients; this is the client side of one such
//! connection, so "a small set of named asynchronous streams" is modeled
//! directly as one `tokio::sync::broadcast` channel per stream rather than
//! as a wire protocol.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ReadyEvent {
	pub flag_count: usize,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
	pub message: String,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConfigUpdatedEvent {
	pub environment: String,
	pub flag_count: usize,
	pub etag: Option<String>,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EvaluationEvent {
	pub flag_key: String,
	pub value: Value,
	pub variant_key: Option<String>,
	pub reason: String,
	pub local: bool,
	pub timestamp: DateTime<Utc>,
}

/// Emitted when `evaluate_flag` falls back to the caller-supplied default.
/// Carries the failure cause, never the raw context (`spec.md` §4.7's
/// "redacted context" requirement), since attributes may hold PII.
#[derive(Debug, Clone)]
pub struct EvaluationErrorEvent {
	pub flag_key: String,
	pub cause: String,
	pub default_value: Value,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PollErrorEvent {
	pub message: String,
	pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AnalyticsFlushEvent {
	pub exposure_count: usize,
	pub timestamp: DateTime<Utc>,
}

/// Owns one broadcast sender per named stream. Subscribers that never call
/// `subscribe_*` pay nothing; a stream with no active receivers silently
/// drops events rather than erroring, matching `broadcast::Sender::send`'s
/// own semantics.
#[derive(Debug)]
pub struct EventBus {
	ready: broadcast::Sender<ReadyEvent>,
	error: broadcast::Sender<ErrorEvent>,
	config_updated: broadcast::Sender<ConfigUpdatedEvent>,
	evaluation: broadcast::Sender<EvaluationEvent>,
	evaluation_error: broadcast::Sender<EvaluationErrorEvent>,
	poll_error: broadcast::Sender<PollErrorEvent>,
	analytics_flush: broadcast::Sender<AnalyticsFlushEvent>,
}

impl Default for EventBus {
	fn default() -> Self {
		Self {
			ready: broadcast::channel(CHANNEL_CAPACITY).0,
			error: broadcast::channel(CHANNEL_CAPACITY).0,
			config_updated: broadcast::channel(CHANNEL_CAPACITY).0,
			evaluation: broadcast::channel(CHANNEL_CAPACITY).0,
			evaluation_error: broadcast::channel(CHANNEL_CAPACITY).0,
			poll_error: broadcast::channel(CHANNEL_CAPACITY).0,
			analytics_flush: broadcast::channel(CHANNEL_CAPACITY).0,
		}
	}
}

macro_rules! stream {
	($emit:ident, $subscribe:ident, $field:ident, $event:ty) => {
		pub fn $emit(&self, event: $event) {
			let _ = self.$field.send(event);
		}

		pub fn $subscribe(&self) -> broadcast::Receiver<$event> {
			self.$field.subscribe()
		}
	};
}

impl EventBus {
	stream!(emit_ready, subscribe_ready, ready, ReadyEvent);
	stream!(emit_error, subscribe_error, error, ErrorEvent);
	stream!(
		emit_config_updated,
		subscribe_config_updated,
		config_updated,
		ConfigUpdatedEvent
	);
	stream!(emit_evaluation, subscribe_evaluation, evaluation, EvaluationEvent);
	stream!(
		emit_evaluation_error,
		subscribe_evaluation_error,
		evaluation_error,
		EvaluationErrorEvent
	);
	stream!(emit_poll_error, subscribe_poll_error, poll_error, PollErrorEvent);
	stream!(
		emit_analytics_flush,
		subscribe_analytics_flush,
		analytics_flush,
		AnalyticsFlushEvent
	);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn subscriber_receives_emitted_event() {
		let bus = EventBus::default();
		let mut rx = bus.subscribe_ready();

		bus.emit_ready(ReadyEvent {
			flag_count: 3,
			timestamp: Utc::now(),
		});

		let received = rx.recv().await.unwrap();
		assert_eq!(received.flag_count, 3);
	}

	#[test]
	fn emit_without_subscribers_does_not_panic() {
		let bus = EventBus::default();
		bus.emit_poll_error(PollErrorEvent {
			message: "timeout".to_string(),
			timestamp: Utc::now(),
		});
	}
}
