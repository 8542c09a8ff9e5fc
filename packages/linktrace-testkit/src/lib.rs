mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use sqlx::{ConnectOptions, Connection, Executor, SqliteConnection, sqlite::SqliteConnectOptions};
use uuid::Uuid;

/// Reference layout of the bulk table. Production datasets are provisioned elsewhere.
pub const USERS_SCHEMA_SQL: &str = include_str!("../sql/users.sql");

/// One fixture row. Unset columns are stored as `NULL`.
#[derive(Clone, Debug, Default)]
pub struct FixtureRow {
	pub mobile: Option<String>,
	pub alt_mobile: Option<String>,
	pub name: Option<String>,
	pub fname: Option<String>,
	pub email: Option<String>,
	pub address: Option<String>,
	pub circle: Option<String>,
	pub operator_id: Option<String>,
}
impl FixtureRow {
	pub fn new(mobile: &str) -> Self {
		Self { mobile: Some(mobile.to_string()), ..Default::default() }
	}

	pub fn alt(mut self, alt_mobile: &str) -> Self {
		self.alt_mobile = Some(alt_mobile.to_string());

		self
	}

	pub fn name(mut self, name: &str) -> Self {
		self.name = Some(name.to_string());

		self
	}

	pub fn fname(mut self, fname: &str) -> Self {
		self.fname = Some(fname.to_string());

		self
	}

	pub fn email(mut self, email: &str) -> Self {
		self.email = Some(email.to_string());

		self
	}

	pub fn address(mut self, address: &str) -> Self {
		self.address = Some(address.to_string());

		self
	}

	pub fn circle(mut self, circle: &str) -> Self {
		self.circle = Some(circle.to_string());

		self
	}

	pub fn operator_id(mut self, operator_id: &str) -> Self {
		self.operator_id = Some(operator_id.to_string());

		self
	}
}

/// A throwaway SQLite dataset file. The file and its WAL side files are removed on drop.
pub struct TestDataset {
	path: PathBuf,
}
impl TestDataset {
	pub async fn new(rows: &[FixtureRow]) -> Result<Self> {
		let mut path = env::temp_dir();

		path.push(format!("linktrace_test_{}.db", Uuid::new_v4().simple()));

		let dataset = Self { path };
		let mut conn = SqliteConnectOptions::new()
			.filename(&dataset.path)
			.create_if_missing(true)
			.connect()
			.await?;

		for statement in USERS_SCHEMA_SQL.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			conn.execute(trimmed).await?;
		}

		insert_rows(&mut conn, rows).await?;

		conn.close().await?;

		Ok(dataset)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Storage settings pointing at this dataset, with a short retry budget.
	pub fn storage_config(&self) -> linktrace_config::Storage {
		linktrace_config::Storage {
			path: self.path.clone(),
			busy_timeout_ms: 1_000,
			cache_size_kib: 2_000,
			mmap_size_bytes: 0,
			max_results: 50,
			retry: linktrace_config::Retry { max_attempts: 2, base_delay_ms: 10 },
		}
	}

	/// Appends rows through a separate writable connection.
	pub async fn insert(&self, rows: &[FixtureRow]) -> Result<()> {
		let mut conn = SqliteConnectOptions::new().filename(&self.path).connect().await?;

		insert_rows(&mut conn, rows).await?;

		conn.close().await?;

		Ok(())
	}

	/// Runs a raw statement through a separate writable connection.
	pub async fn execute(&self, sql: &str) -> Result<()> {
		let mut conn = SqliteConnectOptions::new().filename(&self.path).connect().await?;

		conn.execute(sql).await?;

		conn.close().await?;

		Ok(())
	}
}
impl Drop for TestDataset {
	fn drop(&mut self) {
		for suffix in ["", "-wal", "-shm"] {
			let mut raw = self.path.clone().into_os_string();

			raw.push(suffix);

			let path = PathBuf::from(raw);

			if path.exists()
				&& let Err(err) = fs::remove_file(&path)
			{
				eprintln!("Test dataset cleanup failed for {path:?}: {err}.");
			}
		}
	}
}

/// A path inside the temp dir that does not exist.
pub fn missing_dataset_path() -> PathBuf {
	let mut path = env::temp_dir();

	path.push(format!("linktrace_missing_{}", Uuid::new_v4().simple()));
	path.push("users.db");

	path
}

async fn insert_rows(conn: &mut SqliteConnection, rows: &[FixtureRow]) -> Result<()> {
	let mut tx = conn.begin().await?;

	for row in rows {
		sqlx::query(
			"\
INSERT INTO users (mobile, alt_mobile, name, fname, email, address, circle, operator_id)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
		)
		.bind(row.mobile.as_deref())
		.bind(row.alt_mobile.as_deref())
		.bind(row.name.as_deref())
		.bind(row.fname.as_deref())
		.bind(row.email.as_deref())
		.bind(row.address.as_deref())
		.bind(row.circle.as_deref())
		.bind(row.operator_id.as_deref())
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(())
}
