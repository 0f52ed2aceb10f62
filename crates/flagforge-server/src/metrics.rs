// Copyright (c) 2025 Flagforge contributors. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

/// Prometheus metrics for both planes. Fields are registered with the
/// registry and exposed via `encode()`; most are written through the
/// `record_*` helpers below, not touched directly by callers.
#[allow(dead_code)]
pub struct Metrics {
	registry: Registry,

	pub flag_evaluations_total: CounterVec,
	pub flag_evaluation_duration_seconds: HistogramVec,
	pub cache_hits_total: CounterVec,
	pub cache_misses_total: CounterVec,
	pub cache_invalidations_total: CounterVec,
	pub flag_config_changes_total: CounterVec,
	pub kill_switch_activations_total: CounterVec,
	pub http_requests_total: CounterVec,
	pub http_request_duration_seconds: Histogram,
}

impl Default for Metrics {
	fn default() -> Self {
		Self::new()
	}
}

impl Metrics {
	pub fn new() -> Self {
		let registry = Registry::new();

		let flag_evaluations_total = CounterVec::new(
			Opts::new("flag_evaluations_total", "Total flag evaluations"),
			&["flag", "env", "result", "reason"],
		)
		.unwrap();
		registry.register(Box::new(flag_evaluations_total.clone())).unwrap();

		let flag_evaluation_duration_seconds = HistogramVec::new(
			HistogramOpts::new(
				"flag_evaluation_duration_seconds",
				"Evaluation request duration",
			)
			.buckets(vec![
				0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
			]),
			&["flag"],
		)
		.unwrap();
		registry
			.register(Box::new(flag_evaluation_duration_seconds.clone()))
			.unwrap();

		let cache_hits_total = CounterVec::new(
			Opts::new("flag_cache_hits_total", "Config Cache hits"),
			&["flag", "env"],
		)
		.unwrap();
		registry.register(Box::new(cache_hits_total.clone())).unwrap();

		let cache_misses_total = CounterVec::new(
			Opts::new("flag_cache_misses_total", "Config Cache misses"),
			&["flag", "env"],
		)
		.unwrap();
		registry.register(Box::new(cache_misses_total.clone())).unwrap();

		let cache_invalidations_total = CounterVec::new(
			Opts::new("flag_cache_invalidations_total", "Config Cache invalidations"),
			&["flag", "scope"],
		)
		.unwrap();
		registry
			.register(Box::new(cache_invalidations_total.clone()))
			.unwrap();

		let flag_config_changes_total = CounterVec::new(
			Opts::new("flag_config_changes_total", "Control Plane mutations"),
			&["action"],
		)
		.unwrap();
		registry
			.register(Box::new(flag_config_changes_total.clone()))
			.unwrap();

		let kill_switch_activations_total = CounterVec::new(
			Opts::new("kill_switch_activations_total", "Kill switch activations"),
			&["flag"],
		)
		.unwrap();
		registry
			.register(Box::new(kill_switch_activations_total.clone()))
			.unwrap();

		let http_requests_total = CounterVec::new(
			Opts::new("http_requests_total", "HTTP requests"),
			&["route", "method", "status"],
		)
		.unwrap();
		registry.register(Box::new(http_requests_total.clone())).unwrap();

		let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
			"http_request_duration_seconds",
			"HTTP request duration across both planes",
		))
		.unwrap();
		registry
			.register(Box::new(http_request_duration_seconds.clone()))
			.unwrap();

		Metrics {
			registry,
			flag_evaluations_total,
			flag_evaluation_duration_seconds,
			cache_hits_total,
			cache_misses_total,
			cache_invalidations_total,
			flag_config_changes_total,
			kill_switch_activations_total,
			http_requests_total,
			http_request_duration_seconds,
		}
	}

	pub fn record_evaluation(&self, flag: &str, env: &str, result: bool, reason: &str, duration_secs: f64) {
		self
			.flag_evaluations_total
			.with_label_values(&[flag, env, if result { "enabled" } else { "disabled" }, reason])
			.inc();
		self.flag_evaluation_duration_seconds
			.with_label_values(&[flag])
			.observe(duration_secs);
	}

	pub fn record_cache_hit(&self, flag: &str, env: &str) {
		self.cache_hits_total.with_label_values(&[flag, env]).inc();
	}

	pub fn record_cache_miss(&self, flag: &str, env: &str) {
		self.cache_misses_total.with_label_values(&[flag, env]).inc();
	}

	pub fn record_invalidation(&self, flag: &str, scope: &str) {
		self.cache_invalidations_total.with_label_values(&[flag, scope]).inc();
	}

	pub fn record_config_change(&self, action: &str) {
		self.flag_config_changes_total.with_label_values(&[action]).inc();
	}

	pub fn record_kill_switch(&self, flag: &str) {
		self.kill_switch_activations_total.with_label_values(&[flag]).inc();
	}

	pub fn encode(&self) -> String {
		let encoder = TextEncoder::new();
		let metric_families = self.registry.gather();
		let mut buffer = Vec::new();
		encoder.encode(&metric_families, &mut buffer).unwrap();
		String::from_utf8(buffer).unwrap()
	}
}
