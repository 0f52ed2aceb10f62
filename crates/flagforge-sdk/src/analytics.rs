// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Evaluation exposure tracking (`spec.md` §4.7): a bounded ring buffer of
//! [`FlagExposure`] records, drained on `flush_analytics()` or once the
//! buffer's high watermark is reached. User attributes never survive into
//! a retained exposure — `hash_attributes` replaces the raw map with a
//! stable token so the original values never leave the process.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{AnalyticsFlushEvent, EventBus};

/// Ring buffer capacity. Once reached, the buffer is drained down to
/// [`DRAIN_WATERMARK`] rather than dropping new exposures, so the most
/// recent activity is never the activity that gets discarded.
const RING_CAPACITY: usize = 1000;
const DRAIN_WATERMARK: usize = 500;

/// One recorded flag evaluation, ready for retention or export. `context_hash`
/// replaces the caller's raw attribute map; see [`hash_attributes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagExposure {
	pub flag_key: String,
	pub variant_key: Option<String>,
	pub reason: String,
	pub user_id: Option<String>,
	pub context_hash: String,
	pub timestamp: DateTime<Utc>,
}

impl FlagExposure {
	pub fn new(
		flag_key: impl Into<String>,
		variant_key: Option<String>,
		reason: impl Into<String>,
		user_id: Option<String>,
		context_hash: impl Into<String>,
	) -> Self {
		Self {
			flag_key: flag_key.into(),
			variant_key,
			reason: reason.into(),
			user_id,
			context_hash: context_hash.into(),
			timestamp: Utc::now(),
		}
	}
}

/// FNV-1a 64-bit: deterministic, non-cryptographic, no external dependency.
/// Good enough to turn an attribute map into a stable redaction token; not a
/// security boundary, since it's collision-tolerant by design.
fn fnv1a(bytes: &[u8]) -> u64 {
	const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
	const PRIME: u64 = 0x100000001b3;
	let mut hash = OFFSET_BASIS;
	for &byte in bytes {
		hash ^= byte as u64;
		hash = hash.wrapping_mul(PRIME);
	}
	hash
}

/// Folds a user context's merged attributes into one stable hex token. Keys
/// are sorted first so the token doesn't depend on map iteration order.
pub fn hash_attributes(attributes: &HashMap<String, String>) -> String {
	let mut entries: Vec<(&String, &String)> = attributes.iter().collect();
	entries.sort_by(|a, b| a.0.cmp(b.0));

	let mut buf = String::new();
	for (key, value) in entries {
		buf.push_str(key);
		buf.push('=');
		buf.push_str(value);
		buf.push(';');
	}

	format!("{:016x}", fnv1a(buf.as_bytes()))
}

/// Bounded ring buffer of exposures plus a `tokio::sync::broadcast` hook
/// that fires `analyticsFlush` whenever the buffer is drained.
pub struct AnalyticsBuffer {
	buffer: Mutex<VecDeque<FlagExposure>>,
	enabled: bool,
}

impl AnalyticsBuffer {
	pub fn new(enabled: bool) -> Self {
		Self {
			buffer: Mutex::new(VecDeque::with_capacity(RING_CAPACITY)),
			enabled,
		}
	}

	/// Records an exposure; a no-op when analytics is disabled. Drains down
	/// to the watermark in place once the buffer hits capacity.
	pub fn record(&self, exposure: FlagExposure) {
		if !self.enabled {
			return;
		}

		let mut buffer = self.buffer.lock().expect("analytics buffer mutex poisoned");
		buffer.push_back(exposure);
		if buffer.len() > RING_CAPACITY {
			while buffer.len() > DRAIN_WATERMARK {
				buffer.pop_front();
			}
		}
	}

	pub fn len(&self) -> usize {
		self.buffer.lock().expect("analytics buffer mutex poisoned").len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drains the entire buffer and emits `analyticsFlush` with the count
	/// that was cleared.
	pub fn flush(&self, events: &EventBus) -> Vec<FlagExposure> {
		let drained: Vec<FlagExposure> = {
			let mut buffer = self.buffer.lock().expect("analytics buffer mutex poisoned");
			buffer.drain(..).collect()
		};

		events.emit_analytics_flush(AnalyticsFlushEvent {
			exposure_count: drained.len(),
			timestamp: Utc::now(),
		});

		drained
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn exposure(key: &str) -> FlagExposure {
		FlagExposure::new(key, Some("true".to_string()), "full_rollout", None, "deadbeef")
	}

	#[test]
	fn hash_attributes_is_deterministic_and_order_independent() {
		let mut a = HashMap::new();
		a.insert("country".to_string(), "US".to_string());
		a.insert("plan".to_string(), "enterprise".to_string());

		let mut b = HashMap::new();
		b.insert("plan".to_string(), "enterprise".to_string());
		b.insert("country".to_string(), "US".to_string());

		assert_eq!(hash_attributes(&a), hash_attributes(&b));
	}

	#[test]
	fn hash_attributes_differs_for_different_values() {
		let mut a = HashMap::new();
		a.insert("country".to_string(), "US".to_string());
		let mut b = HashMap::new();
		b.insert("country".to_string(), "DE".to_string());

		assert_ne!(hash_attributes(&a), hash_attributes(&b));
	}

	#[test]
	fn hash_attributes_never_contains_raw_values() {
		let mut attrs = HashMap::new();
		attrs.insert("email".to_string(), "person@example.com".to_string());
		let token = hash_attributes(&attrs);
		assert!(!token.contains("person@example.com"));
	}

	#[test]
	fn disabled_buffer_records_nothing() {
		let buffer = AnalyticsBuffer::new(false);
		buffer.record(exposure("dark_mode"));
		assert!(buffer.is_empty());
	}

	#[test]
	fn buffer_drains_to_watermark_past_capacity() {
		let buffer = AnalyticsBuffer::new(true);
		for i in 0..(RING_CAPACITY + 50) {
			buffer.record(exposure(&format!("flag_{i}")));
		}
		assert_eq!(buffer.len(), DRAIN_WATERMARK);
	}

	#[test]
	fn flush_clears_the_buffer_and_emits_event() {
		let buffer = AnalyticsBuffer::new(true);
		let events = EventBus::default();
		let mut flush_rx = events.subscribe_analytics_flush();

		buffer.record(exposure("dark_mode"));
		buffer.record(exposure("checkout_v2"));

		let drained = buffer.flush(&events);
		assert_eq!(drained.len(), 2);
		assert!(buffer.is_empty());

		let flushed_event = flush_rx.try_recv().unwrap();
		assert_eq!(flushed_event.exposure_count, 2);
	}
}
