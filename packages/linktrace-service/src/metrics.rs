//! Process-lifetime lookup counters.
//!
//! A `SearchMetrics` is created once at startup and shared with whoever needs it. Nothing is
//! persisted; counters restart from zero with the process.

use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Debug)]
pub struct SearchMetrics {
	started: Instant,
	started_at: OffsetDateTime,
	deep_searches: AtomicU64,
	exact_lookups: AtomicU64,
	name_searches: AtomicU64,
	failed_lookups: AtomicU64,
}
impl SearchMetrics {
	pub fn new() -> Self {
		Self {
			started: Instant::now(),
			started_at: OffsetDateTime::now_utc(),
			deep_searches: AtomicU64::new(0),
			exact_lookups: AtomicU64::new(0),
			name_searches: AtomicU64::new(0),
			failed_lookups: AtomicU64::new(0),
		}
	}

	pub fn record_deep_search(&self) {
		self.deep_searches.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_exact_lookup(&self) {
		self.exact_lookups.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_name_search(&self) {
		self.name_searches.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_failure(&self) {
		self.failed_lookups.fetch_add(1, Ordering::Relaxed);
	}

	pub fn uptime(&self) -> Duration {
		self.started.elapsed()
	}

	pub fn snapshot(&self) -> MetricsSnapshot {
		let deep_searches = self.deep_searches.load(Ordering::Relaxed);
		let exact_lookups = self.exact_lookups.load(Ordering::Relaxed);
		let name_searches = self.name_searches.load(Ordering::Relaxed);
		let uptime = self.uptime();

		MetricsSnapshot {
			total_searches: deep_searches + exact_lookups + name_searches,
			deep_searches,
			exact_lookups,
			name_searches,
			failed_lookups: self.failed_lookups.load(Ordering::Relaxed),
			started_at: self.started_at.format(&Rfc3339).unwrap_or_default(),
			uptime_secs: uptime.as_secs(),
			uptime: format_uptime(uptime),
		}
	}
}
impl Default for SearchMetrics {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
	pub total_searches: u64,
	pub deep_searches: u64,
	pub exact_lookups: u64,
	pub name_searches: u64,
	pub failed_lookups: u64,
	pub started_at: String,
	pub uptime_secs: u64,
	pub uptime: String,
}

/// Renders `3d 4h 5m 6s`, omitting leading zero units. Seconds are always shown.
pub fn format_uptime(uptime: Duration) -> String {
	let total = uptime.as_secs();
	let (days, rem) = (total / 86_400, total % 86_400);
	let (hours, rem) = (rem / 3_600, rem % 3_600);
	let (minutes, secs) = (rem / 60, rem % 60);
	let mut parts = Vec::with_capacity(4);

	if days > 0 {
		parts.push(format!("{days}d"));
	}
	if hours > 0 {
		parts.push(format!("{hours}h"));
	}
	if minutes > 0 {
		parts.push(format!("{minutes}m"));
	}

	parts.push(format!("{secs}s"));

	parts.join(" ")
}
