use std::time::{Duration, Instant};

use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderValue, Method, StatusCode},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;
use linktrace_service::{
	CancelFlag, DatasetStats, Error as ServiceError, ExactLookup, MetricsSnapshot, NameSearch,
	Profile,
};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

pub fn router(state: AppState) -> Router {
	let cors = cors_layer(&state.cors_origins);
	let router = Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.route("/api/lookup", get(lookup))
		.route("/api/lookup/exact", get(lookup_exact))
		.route("/api/search/name", get(search_name))
		.route("/api/stats", get(stats))
		.with_state(state);

	match cors {
		Some(layer) => router.layer(layer),
		None => router,
	}
}

/// `None` when no origin is configured. A `*` entry allows every origin.
pub fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
	if origins.is_empty() {
		return None;
	}

	let allow_origin = if origins.iter().any(|origin| origin == "*") {
		AllowOrigin::any()
	} else {
		let values: Vec<HeaderValue> = origins
			.iter()
			.filter_map(|origin| match HeaderValue::from_str(origin) {
				Ok(value) => Some(value),
				Err(_) => {
					tracing::warn!(%origin, "Ignoring invalid CORS origin.");

					None
				},
			})
			.collect();

		AllowOrigin::list(values)
	};

	Some(CorsLayer::new().allow_origin(allow_origin).allow_methods([Method::GET]))
}

/// Renders byte counts the way the stats endpoint reports them, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
	let mut size = bytes as f64;

	for unit in SIZE_UNITS {
		if size < 1024.0 {
			return format!("{size:.1} {unit}");
		}

		size /= 1024.0;
	}

	format!("{size:.1} PB")
}

#[derive(Debug, Serialize)]
struct RootResponse {
	status: &'static str,
	name: &'static str,
	version: &'static str,
	endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
struct Endpoints {
	lookup: &'static str,
	exact: &'static str,
	name_search: &'static str,
	stats: &'static str,
}

#[derive(Debug, Deserialize)]
struct LookupParams {
	number: String,
	depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ExactParams {
	number: String,
}

#[derive(Debug, Deserialize)]
struct NameParams {
	q: String,
}

#[derive(Debug, Serialize)]
struct LookupResponse {
	#[serde(flatten)]
	profile: Profile,
	response_time_ms: u64,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
	total_records: i64,
	database_size: String,
	database_size_bytes: i64,
	engine: &'static str,
	cache: String,
	mmap: String,
	metrics: MetricsSnapshot,
}

async fn root() -> Json<RootResponse> {
	Json(RootResponse {
		status: "online",
		name: "linktrace",
		version: env!("CARGO_PKG_VERSION"),
		endpoints: Endpoints {
			lookup: "/api/lookup?number=9876543210",
			exact: "/api/lookup/exact?number=9876543210",
			name_search: "/api/search/name?q=name",
			stats: "/api/stats",
		},
	})
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn lookup(
	State(state): State<AppState>,
	Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>, ApiError> {
	let started = Instant::now();
	let cancel = CancelFlag::new();
	let _deadline = Deadline::arm(state.lookup_timeout, cancel.clone());
	let result =
		state.service.deep_search_with_cancel(&params.number, params.depth, Some(&cancel)).await;

	if let Err(ServiceError::Cancelled) = &result {
		tracing::warn!(
			number = %params.number,
			timeout_ms = state.lookup_timeout.as_millis() as u64,
			"Deep search stopped at the lookup deadline."
		);
	}

	let profile = result?;
	let response_time_ms = started.elapsed().as_millis() as u64;

	Ok(Json(LookupResponse { profile, response_time_ms }))
}

/// Trips a [`CancelFlag`] once `timeout` passes. Dropping the guard disarms it.
struct Deadline(JoinHandle<()>);
impl Deadline {
	fn arm(timeout: Duration, cancel: CancelFlag) -> Self {
		Self(tokio::spawn(async move {
			tokio::time::sleep(timeout).await;

			cancel.cancel();
		}))
	}
}
impl Drop for Deadline {
	fn drop(&mut self) {
		self.0.abort();
	}
}

async fn lookup_exact(
	State(state): State<AppState>,
	Query(params): Query<ExactParams>,
) -> Result<Json<ExactLookup>, ApiError> {
	let response = state.service.lookup_exact(&params.number).await?;

	Ok(Json(response))
}

async fn search_name(
	State(state): State<AppState>,
	Query(params): Query<NameParams>,
) -> Result<Json<NameSearch>, ApiError> {
	let response = state.service.search_by_name(&params.q).await?;

	Ok(Json(response))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
	let DatasetStats { total_records, database_size_bytes, metrics } =
		state.service.stats().await?;
	let storage = &state.storage;

	Ok(Json(StatsResponse {
		total_records,
		database_size: format_size(database_size_bytes.max(0) as u64),
		database_size_bytes,
		engine: "SQLite WAL",
		cache: format_size(storage.cache_size_kib.saturating_mul(1024)),
		mmap: format_size(storage.mmap_size_bytes),
		metrics,
	}))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidIdentifier { message } => json_error(
				StatusCode::BAD_REQUEST,
				"invalid_number",
				format!("Invalid number: {message}"),
				Some(vec!["number".to_string()]),
			),
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::StoreBusy { message } => {
				tracing::warn!(error = %message, "Dataset stayed busy past the retry budget.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"store_busy",
					"Dataset is busy. Try again shortly.",
					None,
				)
			},
			ServiceError::NotConnected => json_error(
				StatusCode::SERVICE_UNAVAILABLE,
				"not_connected",
				"Dataset session is not open.",
				None,
			),
			ServiceError::Cancelled => json_error(
				StatusCode::GATEWAY_TIMEOUT,
				"timeout",
				"Lookup did not finish in time.",
				None,
			),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Dataset query failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_error",
					"Dataset query failed.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
