use std::{sync::Arc, time::Duration};

use linktrace_config::{Config, Storage};
use linktrace_service::{Dataset, LinkTraceService, SearchMetrics};
use linktrace_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LinkTraceService>,
	pub db: Arc<Db>,
	pub storage: Storage,
	pub cors_origins: Vec<String>,
	pub lookup_timeout: Duration,
}
impl AppState {
	/// Opens the dataset session. A failure here is fatal to startup.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let db = Arc::new(Db::connect(&config.storage).await?);

		tracing::info!(
			path = %config.storage.path.display(),
			max_results = config.storage.max_results,
			max_depth = config.search.max_depth,
			"Dataset session opened."
		);

		Ok(Self::with_db(config, db))
	}

	pub fn with_db(config: Config, db: Arc<Db>) -> Self {
		let dataset: Arc<dyn Dataset> = db.clone();
		let service =
			LinkTraceService::new(config.search, dataset, Arc::new(SearchMetrics::new()));

		Self {
			service: Arc::new(service),
			db,
			storage: config.storage,
			cors_origins: config.service.cors_origins,
			lookup_timeout: Duration::from_millis(config.service.lookup_timeout_ms),
		}
	}
}
