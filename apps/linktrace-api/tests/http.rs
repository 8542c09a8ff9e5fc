use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use serde_json::Value;
use tower::util::ServiceExt;

use linktrace_api::{routes, state::AppState};
use linktrace_config::{Config, Search, Service};
use linktrace_storage::db::Db;
use linktrace_testkit::{FixtureRow, TestDataset};

fn fixture_rows() -> Vec<FixtureRow> {
	vec![
		FixtureRow::new("9876543210")
			.alt("919123456789")
			.name("Asha Rao")
			.address("12 Lake Road")
			.circle("KARNATAKA")
			.operator_id("OP-7"),
		FixtureRow::new("9123456789").name("Asha R").address("12 Lake Road").circle("KARNATAKA"),
		FixtureRow::new("9800000000").name("Solo Holder").circle("DELHI"),
	]
}

fn test_config(dataset: &TestDataset, cors_origins: Vec<String>) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			cors_origins,
			lookup_timeout_ms: 5_000,
		},
		storage: dataset.storage_config(),
		search: Search::default(),
	}
}

async fn test_app(dataset: &TestDataset) -> Router {
	let state = AppState::new(test_config(dataset, Vec::new()))
		.await
		.expect("Failed to build app state.");

	routes::router(state)
}

async fn get(app: Router, uri: &str) -> Response {
	app.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call router.")
}

async fn json_body(response: Response) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response body.")
}

#[tokio::test]
async fn health_ok() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = get(test_app(&dataset).await, "/health").await;

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn root_reports_status() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = get(test_app(&dataset).await, "/").await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "online");
	assert_eq!(json["endpoints"]["stats"], "/api/stats");
}

#[tokio::test]
async fn lookup_returns_consolidated_profile() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = get(test_app(&dataset).await, "/api/lookup?number=%2B919876543210").await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["seed"], "9876543210");
	assert_eq!(json["total_records"], 2);
	assert_eq!(json["phones"][0], "9876543210");
	assert_eq!(json["names"][1], "Asha R");
	assert_eq!(json["addresses"].as_array().map(Vec::len), Some(1));
	assert!(json["response_time_ms"].is_u64());
}

#[tokio::test]
async fn lookup_rejects_invalid_number() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = get(test_app(&dataset).await, "/api/lookup?number=12345").await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "invalid_number");
	assert_eq!(json["fields"][0], "number");
}

#[tokio::test]
async fn lookup_rejects_depth_outside_limit() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = get(test_app(&dataset).await, "/api/lookup?number=9876543210&depth=9").await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await["error_code"], "invalid_request");
}

#[tokio::test]
async fn lookup_requires_number() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = get(test_app(&dataset).await, "/api/lookup").await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exact_lookup_returns_matching_rows() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = get(test_app(&dataset).await, "/api/lookup/exact?number=9800000000").await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["number"], "9800000000");
	assert_eq!(json["total"], 1);
	assert_eq!(json["records"][0]["name"], "Solo Holder");
	assert!(json["records"][0].get("rowid").is_none());
}

#[tokio::test]
async fn name_search_validates_fragment() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let app = test_app(&dataset).await;
	let response = get(app.clone(), "/api/search/name?q=ab").await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let response = get(app, "/api/search/name?q=asha").await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["total"], 2);
}

#[tokio::test]
async fn stats_report_dataset_and_counters() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let app = test_app(&dataset).await;
	let response = get(app.clone(), "/api/lookup?number=9800000000").await;

	assert_eq!(response.status(), StatusCode::OK);

	let response = get(app, "/api/stats").await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["total_records"], 3);
	assert_eq!(json["engine"], "SQLite WAL");
	assert!(json["database_size_bytes"].as_i64().is_some_and(|bytes| bytes > 0));
	assert!(json["database_size"].as_str().is_some_and(|size| size.ends_with("KB")));
	assert_eq!(json["metrics"]["deep_searches"], 1);
}

#[tokio::test]
async fn closed_session_is_reported_as_unavailable() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let config = test_config(&dataset, Vec::new());
	let db = Arc::new(Db::connect(&config.storage).await.expect("Failed to connect."));
	let app = routes::router(AppState::with_db(config, db.clone()));

	db.close().await;

	let response = get(app, "/api/lookup?number=9876543210").await;

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json_body(response).await["error_code"], "not_connected");
}

#[tokio::test]
async fn configured_origins_receive_cors_headers() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let origin = "http://localhost:3000";
	let state = AppState::new(test_config(&dataset, vec![origin.to_string()]))
		.await
		.expect("Failed to build app state.");
	let response = routes::router(state)
		.oneshot(
			Request::builder()
				.uri("/health")
				.header(header::ORIGIN, origin)
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call router.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
		Some(origin)
	);
}

#[tokio::test]
async fn cors_is_off_without_origins() {
	let dataset = TestDataset::new(&fixture_rows()).await.expect("Failed to create test dataset.");
	let response = test_app(&dataset)
		.await
		.oneshot(
			Request::builder()
				.uri("/health")
				.header(header::ORIGIN, "http://localhost:3000")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call router.");

	assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
