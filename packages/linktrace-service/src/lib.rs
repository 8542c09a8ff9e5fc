pub mod identifier;
pub mod metrics;
pub mod profile;
pub mod traversal;

mod error;

pub use error::{Error, Result};
pub use identifier::Identifier;
pub use metrics::{MetricsSnapshot, SearchMetrics};
pub use profile::Profile;
pub use traversal::{CancelFlag, LinkIndex, Traversal};

use std::{sync::Arc, time::Instant};

use serde::Serialize;

use linktrace_config::Search;
use linktrace_storage::{db::Db, models::Record, queries};

pub type BoxFuture<'a, T> = linktrace_storage::db::BoxFuture<'a, T>;

/// Everything the service reads from the dataset.
///
/// Traversal only sees the [`LinkIndex`] half. The rest serves single-hop and admin requests.
pub trait Dataset
where
	Self: LinkIndex,
{
	fn search_by_name<'a>(
		&'a self,
		fragment: &'a str,
	) -> BoxFuture<'a, linktrace_storage::Result<Vec<Record>>>;

	fn row_count(&self) -> BoxFuture<'_, linktrace_storage::Result<i64>>;

	fn storage_size_bytes(&self) -> BoxFuture<'_, linktrace_storage::Result<i64>>;
}

#[derive(Clone, Debug, Serialize)]
pub struct ExactLookup {
	pub number: String,
	pub records: Vec<Record>,
	pub total: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct NameSearch {
	pub query: String,
	pub records: Vec<Record>,
	pub total: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct DatasetStats {
	pub total_records: i64,
	pub database_size_bytes: i64,
	pub metrics: MetricsSnapshot,
}

pub struct LinkTraceService {
	pub cfg: Search,
	pub dataset: Arc<dyn Dataset>,
	pub metrics: Arc<SearchMetrics>,
}
impl LinkTraceService {
	/// Shortest name fragment accepted by [`Self::search_by_name`].
	pub const MIN_NAME_FRAGMENT: usize = 3;

	pub fn new(cfg: Search, dataset: Arc<dyn Dataset>, metrics: Arc<SearchMetrics>) -> Self {
		Self { cfg, dataset, metrics }
	}

	/// Single-hop match on the `mobile` column.
	pub async fn lookup_exact(&self, raw: &str) -> Result<ExactLookup> {
		let identifier = parse_identifier(raw)?;
		let records = self.dataset.find_by_primary(identifier.as_str()).await.map_err(|err| {
			self.metrics.record_failure();

			Error::from(err)
		})?;

		self.metrics.record_exact_lookup();

		tracing::info!(number = %identifier, records = records.len(), "Exact lookup served.");

		let total = records.len();

		Ok(ExactLookup { number: identifier.into_string(), records, total })
	}

	/// Follows `mobile` / `alt_mobile` links from `raw` and consolidates every reachable row.
	pub async fn deep_search(&self, raw: &str, max_depth: Option<u32>) -> Result<Profile> {
		self.deep_search_with_cancel(raw, max_depth, None).await
	}

	pub async fn deep_search_with_cancel(
		&self,
		raw: &str,
		max_depth: Option<u32>,
		cancel: Option<&CancelFlag>,
	) -> Result<Profile> {
		let identifier = parse_identifier(raw)?;
		let max_depth = self.resolve_depth(max_depth)?;
		let started = Instant::now();
		let traversal =
			match traversal::traverse(self.dataset.as_ref(), identifier.as_str(), max_depth, cancel)
				.await
			{
				Ok(traversal) => traversal,
				Err(err) => {
					self.metrics.record_failure();

					return Err(err);
				},
			};
		let profile = profile::consolidate(identifier.as_str(), &traversal.records);

		self.metrics.record_deep_search();

		tracing::info!(
			number = %identifier,
			max_depth,
			levels = traversal.levels,
			visited = traversal.visited.len(),
			records = profile.total_records,
			phones = profile.total_phones,
			failed_lookups = traversal.failed_lookups,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Deep search served."
		);

		Ok(profile)
	}

	/// Substring search on names. This scans the table and is capped like every other query.
	pub async fn search_by_name(&self, fragment: &str) -> Result<NameSearch> {
		let fragment = fragment.trim();

		if fragment.chars().count() < Self::MIN_NAME_FRAGMENT {
			return Err(Error::InvalidRequest {
				message: format!(
					"Name fragment must be at least {} characters.",
					Self::MIN_NAME_FRAGMENT
				),
			});
		}

		let records = self.dataset.search_by_name(fragment).await.map_err(|err| {
			self.metrics.record_failure();

			Error::from(err)
		})?;

		self.metrics.record_name_search();

		let total = records.len();

		Ok(NameSearch { query: fragment.to_string(), records, total })
	}

	pub async fn stats(&self) -> Result<DatasetStats> {
		let total_records = self.dataset.row_count().await?;
		let database_size_bytes = self.dataset.storage_size_bytes().await?;

		Ok(DatasetStats { total_records, database_size_bytes, metrics: self.metrics.snapshot() })
	}

	fn resolve_depth(&self, requested: Option<u32>) -> Result<u32> {
		let Some(depth) = requested else {
			return Ok(self.cfg.max_depth);
		};

		if depth == 0 || depth > self.cfg.max_depth_limit {
			return Err(Error::InvalidRequest {
				message: format!("depth must be between 1 and {}.", self.cfg.max_depth_limit),
			});
		}

		Ok(depth)
	}
}

impl LinkIndex for Db {
	fn find_by_primary<'a>(
		&'a self,
		identifier: &'a str,
	) -> BoxFuture<'a, linktrace_storage::Result<Vec<Record>>> {
		Box::pin(queries::find_by_primary(self, identifier))
	}

	fn find_by_secondary<'a>(
		&'a self,
		identifier: &'a str,
	) -> BoxFuture<'a, linktrace_storage::Result<Vec<Record>>> {
		Box::pin(queries::find_by_secondary(self, identifier))
	}
}

impl Dataset for Db {
	fn search_by_name<'a>(
		&'a self,
		fragment: &'a str,
	) -> BoxFuture<'a, linktrace_storage::Result<Vec<Record>>> {
		Box::pin(queries::search_by_name(self, fragment))
	}

	fn row_count(&self) -> BoxFuture<'_, linktrace_storage::Result<i64>> {
		Box::pin(queries::row_count(self))
	}

	fn storage_size_bytes(&self) -> BoxFuture<'_, linktrace_storage::Result<i64>> {
		Box::pin(queries::storage_size_bytes(self))
	}
}

fn parse_identifier(raw: &str) -> Result<Identifier> {
	Identifier::parse(raw).ok_or_else(|| Error::InvalidIdentifier {
		message: "expected a 10-digit mobile number starting with 6, 7, 8, or 9.".to_string(),
	})
}
