use std::{future::Future, pin::Pin};

use sqlx::SqliteConnection;

use crate::{Error, Result, retry::RetryPolicy, session::Session};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read access to the dataset. Every statement goes through [`Db::read`], so the retry policy is
/// applied uniformly.
pub struct Db {
	session: Session,
	retry: RetryPolicy,
	max_results: u32,
}
impl Db {
	pub fn new(cfg: &linktrace_config::Storage) -> Self {
		Self {
			session: Session::new(cfg),
			retry: RetryPolicy::from_config(&cfg.retry),
			max_results: cfg.max_results,
		}
	}

	pub async fn connect(cfg: &linktrace_config::Storage) -> Result<Self> {
		let db = Self::new(cfg);

		db.session.open().await?;

		Ok(db)
	}

	pub async fn close(&self) {
		self.session.close().await;
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn retry_policy(&self) -> RetryPolicy {
		self.retry
	}

	pub fn max_results(&self) -> u32 {
		self.max_results
	}

	/// Runs `statement` against the session connection under the retry policy. The connection
	/// guard is dropped before any backoff sleep.
	pub async fn read<T, F>(&self, operation: &'static str, statement: F) -> Result<T>
	where
		F: for<'c> Fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Sync,
	{
		let session = &self.session;
		let statement = &statement;

		self.retry
			.run(operation, move || async move {
				let mut conn = session.handle().await?;
				let value = statement(&mut *conn).await?;

				Ok::<T, Error>(value)
			})
			.await
	}
}
