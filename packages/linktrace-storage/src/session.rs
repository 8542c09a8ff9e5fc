//! The single long-lived connection to the dataset.

use std::path::{Path, PathBuf};

use sqlx::{
	ConnectOptions, Connection, Executor, SqliteConnection, sqlite::SqliteConnectOptions,
};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
struct Tuning {
	busy_timeout_ms: u64,
	cache_size_kib: u64,
	mmap_size_bytes: u64,
}

/// Owns at most one open `SqliteConnection`.
///
/// The connection is tuned for large read-only workloads when opened and is guarded by an async
/// mutex, so concurrent lookups share it one statement at a time.
pub struct Session {
	path: PathBuf,
	tuning: Tuning,
	conn: Mutex<Option<SqliteConnection>>,
}
impl Session {
	pub fn new(cfg: &linktrace_config::Storage) -> Self {
		Self {
			path: cfg.path.clone(),
			tuning: Tuning {
				busy_timeout_ms: cfg.busy_timeout_ms,
				cache_size_kib: cfg.cache_size_kib,
				mmap_size_bytes: cfg.mmap_size_bytes,
			},
			conn: Mutex::new(None),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Opens and tunes the connection. Opening an already open session does nothing.
	pub async fn open(&self) -> Result<()> {
		let mut slot = self.conn.lock().await;

		if slot.is_some() {
			return Ok(());
		}

		let mut conn = SqliteConnectOptions::new()
			.filename(&self.path)
			.create_if_missing(false)
			.connect()
			.await
			.map_err(|source| Error::Connection { path: self.path.clone(), source })?;

		// Order matters: `query_only` must come last so the earlier pragmas may still write.
		for pragma in self.tuning_pragmas() {
			conn.execute(pragma.as_str())
				.await
				.map_err(|source| Error::Connection { path: self.path.clone(), source })?;
		}

		*slot = Some(conn);

		tracing::info!(
			path = %self.path.display(),
			cache_size_kib = self.tuning.cache_size_kib,
			mmap_size_bytes = self.tuning.mmap_size_bytes,
			"Dataset session opened in WAL read-only mode."
		);

		Ok(())
	}

	/// Releases the connection. Safe to call repeatedly or on a session that was never opened.
	pub async fn close(&self) {
		let Some(conn) = self.conn.lock().await.take() else {
			return;
		};

		if let Err(err) = conn.close().await {
			tracing::warn!(error = %err, path = %self.path.display(), "Dataset session close failed.");
		} else {
			tracing::info!(path = %self.path.display(), "Dataset session closed.");
		}
	}

	pub async fn is_open(&self) -> bool {
		self.conn.lock().await.is_some()
	}

	/// Exclusive access to the open connection.
	pub async fn handle(&self) -> Result<MappedMutexGuard<'_, SqliteConnection>> {
		let guard = self.conn.lock().await;

		MutexGuard::try_map(guard, |slot| slot.as_mut()).map_err(|_| Error::NotConnected)
	}

	fn tuning_pragmas(&self) -> [String; 6] {
		[
			"PRAGMA journal_mode = WAL".to_string(),
			format!("PRAGMA busy_timeout = {}", self.tuning.busy_timeout_ms),
			format!("PRAGMA cache_size = -{}", self.tuning.cache_size_kib),
			format!("PRAGMA mmap_size = {}", self.tuning.mmap_size_bytes),
			"PRAGMA temp_store = MEMORY".to_string(),
			"PRAGMA query_only = ON".to_string(),
		]
	}
}
