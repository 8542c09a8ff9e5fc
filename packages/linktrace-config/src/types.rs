use std::path::PathBuf;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Origins allowed to issue cross-origin GET requests. `"*"` allows any origin.
	#[serde(default)]
	pub cors_origins: Vec<String>,
	/// Deadline for one deep search, measured by the HTTP surface.
	#[serde(default = "default_lookup_timeout_ms")]
	pub lookup_timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	/// Path to the SQLite dataset. The file must already exist.
	pub path: PathBuf,
	#[serde(default = "default_busy_timeout_ms")]
	pub busy_timeout_ms: u64,
	/// Page cache budget in KiB, applied as a negative `cache_size`.
	#[serde(default = "default_cache_size_kib")]
	pub cache_size_kib: u64,
	#[serde(default = "default_mmap_size_bytes")]
	pub mmap_size_bytes: u64,
	/// Row cap for every single-identifier query.
	#[serde(default = "default_max_results")]
	pub max_results: u32,
	#[serde(default)]
	pub retry: Retry,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_attempts: u32,
	pub base_delay_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_attempts: 3, base_delay_ms: 500 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub max_depth: u32,
	/// Upper bound for per-request depth overrides.
	pub max_depth_limit: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { max_depth: 3, max_depth_limit: 5 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_lookup_timeout_ms() -> u64 {
	30_000
}

fn default_busy_timeout_ms() -> u64 {
	10_000
}

fn default_cache_size_kib() -> u64 {
	64_000
}

fn default_mmap_size_bytes() -> u64 {
	2_147_483_648
}

fn default_max_results() -> u32 {
	50
}
