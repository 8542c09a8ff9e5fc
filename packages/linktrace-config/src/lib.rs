mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Retry, Search, Service, Storage};

use std::{fs, path::Path};

/// Hard ceiling for any configured traversal depth.
pub const MAX_DEPTH_CEILING: u32 = 8;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.service.lookup_timeout_ms == 0 {
		return Err(invalid("service.lookup_timeout_ms", "must be greater than zero."));
	}
	if cfg.storage.path.as_os_str().is_empty() {
		return Err(invalid("storage.path", "must point at the dataset file."));
	}
	if cfg.storage.max_results == 0 {
		return Err(invalid("storage.max_results", "must be greater than zero."));
	}
	if cfg.storage.retry.max_attempts == 0 {
		return Err(invalid("storage.retry.max_attempts", "must be greater than zero."));
	}
	if cfg.storage.retry.base_delay_ms == 0 {
		return Err(invalid("storage.retry.base_delay_ms", "must be greater than zero."));
	}
	if cfg.search.max_depth == 0 {
		return Err(invalid("search.max_depth", "must be greater than zero."));
	}
	if cfg.search.max_depth_limit > MAX_DEPTH_CEILING {
		return Err(invalid(
			"search.max_depth_limit",
			format!("must be {MAX_DEPTH_CEILING} or less."),
		));
	}
	if cfg.search.max_depth > cfg.search.max_depth_limit {
		return Err(invalid("search.max_depth", "must not exceed search.max_depth_limit."));
	}

	Ok(())
}

fn invalid(key: &'static str, message: impl Into<String>) -> Error {
	Error::Validation { key, message: message.into() }
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.service.cors_origins.retain(|origin| !origin.trim().is_empty());
}
