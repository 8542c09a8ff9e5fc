use std::time::{Duration, Instant};

use sqlx::{
	ConnectOptions, Connection, Executor, SqliteConnection, sqlite::SqliteConnectOptions,
};

use linktrace_storage::{Error, db::Db, queries, retry::RetryPolicy};
use linktrace_testkit::{FixtureRow, TestDataset};

fn rows() -> Vec<FixtureRow> {
	vec![
		FixtureRow::new("9876543210").alt("919123456789").name("Asha Rao").fname("Mohan"),
		FixtureRow::new("9876543210").name("Asha R").address("12 Lake Road"),
		FixtureRow::new("9123456789").alt("9876543210").name("Ravi Rao"),
		FixtureRow::new("9000000001").name("100%_match"),
		FixtureRow::new("9000000002").name("100 percent"),
	]
}

async fn connect(dataset: &TestDataset) -> Db {
	Db::connect(&dataset.storage_config()).await.expect("Failed to connect to dataset.")
}

#[tokio::test]
async fn primary_lookup_matches_mobile_column_only() {
	let dataset = TestDataset::new(&rows()).await.expect("Failed to create test dataset.");
	let db = connect(&dataset).await;
	let records =
		queries::find_by_primary(&db, "9876543210").await.expect("Primary lookup failed.");

	assert_eq!(records.len(), 2);
	assert!(records.iter().all(|record| record.mobile.as_deref() == Some("9876543210")));
	assert_eq!(records[0].name.as_deref(), Some("Asha Rao"));
	assert_eq!(records[0].alt_mobile.as_deref(), Some("919123456789"));
	assert!(records[0].rowid < records[1].rowid);

	db.close().await;
}

#[tokio::test]
async fn numeric_cells_are_read_as_text() {
	let dataset = TestDataset::new(&[]).await.expect("Failed to create test dataset.");

	dataset
		.execute("INSERT INTO users (mobile, name, operator_id) VALUES (9700000000, 'Numeric', 42)")
		.await
		.expect("Failed to insert numeric row.");

	let db = connect(&dataset).await;
	let records =
		queries::find_by_primary(&db, "9700000000").await.expect("Primary lookup failed.");

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].mobile.as_deref(), Some("9700000000"));
	assert_eq!(records[0].operator_id.as_deref(), Some("42"));

	db.close().await;
}

#[tokio::test]
async fn db_carries_storage_settings() {
	let dataset = TestDataset::new(&rows()).await.expect("Failed to create test dataset.");
	let db = connect(&dataset).await;

	assert_eq!(db.retry_policy(), RetryPolicy::new(2, Duration::from_millis(10)));
	assert_eq!(db.max_results(), 50);
	assert_eq!(db.session().path(), dataset.path());
	assert!(db.session().is_open().await);

	db.close().await;

	assert!(!db.session().is_open().await);
}

#[tokio::test]
async fn secondary_lookup_matches_alt_mobile_column_only() {
	let dataset = TestDataset::new(&rows()).await.expect("Failed to create test dataset.");
	let db = connect(&dataset).await;
	let records =
		queries::find_by_secondary(&db, "9876543210").await.expect("Secondary lookup failed.");

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].mobile.as_deref(), Some("9123456789"));

	let prefixed =
		queries::find_by_secondary(&db, "9123456789").await.expect("Secondary lookup failed.");

	assert!(prefixed.is_empty(), "Equality lookups must not match prefixed values.");

	db.close().await;
}

#[tokio::test]
async fn lookups_respect_result_cap() {
	let many: Vec<FixtureRow> =
		(0..8).map(|idx| FixtureRow::new("9800000000").name(&format!("Holder {idx}"))).collect();
	let dataset = TestDataset::new(&many).await.expect("Failed to create test dataset.");
	let mut cfg = dataset.storage_config();

	cfg.max_results = 3;

	let db = Db::connect(&cfg).await.expect("Failed to connect to dataset.");
	let records =
		queries::find_by_primary(&db, "9800000000").await.expect("Primary lookup failed.");

	assert_eq!(records.len(), 3);
	assert_eq!(records[0].name.as_deref(), Some("Holder 0"));

	db.close().await;
}

#[tokio::test]
async fn name_search_treats_wildcards_literally() {
	let dataset = TestDataset::new(&rows()).await.expect("Failed to create test dataset.");
	let db = connect(&dataset).await;
	let literal = queries::search_by_name(&db, "100%_").await.expect("Name search failed.");

	assert_eq!(literal.len(), 1);
	assert_eq!(literal[0].mobile.as_deref(), Some("9000000001"));

	let substring = queries::search_by_name(&db, "Rao").await.expect("Name search failed.");

	assert_eq!(substring.len(), 2);

	db.close().await;
}

#[tokio::test]
async fn row_count_uses_highest_rowid() {
	let dataset = TestDataset::new(&[]).await.expect("Failed to create test dataset.");
	let db = connect(&dataset).await;

	assert_eq!(queries::row_count(&db).await.expect("Row count failed."), 0);

	db.close().await;
	dataset.insert(&rows()).await.expect("Failed to insert rows.");

	let db = connect(&dataset).await;

	assert_eq!(queries::row_count(&db).await.expect("Row count failed."), 5);

	db.close().await;
}

#[tokio::test]
async fn storage_size_is_page_aligned() {
	let dataset = TestDataset::new(&rows()).await.expect("Failed to create test dataset.");
	let db = connect(&dataset).await;
	let size = queries::storage_size_bytes(&db).await.expect("Size query failed.");

	assert!(size > 0);
	assert_eq!(size % 512, 0);

	db.close().await;
}

#[tokio::test]
async fn queries_on_closed_db_fail_without_retry() {
	let dataset = TestDataset::new(&rows()).await.expect("Failed to create test dataset.");
	let db = Db::new(&dataset.storage_config());
	let err = queries::find_by_primary(&db, "9876543210")
		.await
		.expect_err("Unopened db must not answer queries.");

	assert!(matches!(err, Error::NotConnected));
}

/// Holds an exclusive lock on the dataset until closed.
async fn lock_dataset(dataset: &TestDataset) -> SqliteConnection {
	let mut locker = SqliteConnectOptions::new()
		.filename(dataset.path())
		.connect()
		.await
		.expect("Failed to open locking connection.");

	for statement in [
		"PRAGMA locking_mode = EXCLUSIVE",
		"BEGIN EXCLUSIVE",
		"INSERT INTO users (mobile, name) VALUES ('9111111111', 'Locker')",
	] {
		locker.execute(statement).await.expect("Failed to take the dataset lock.");
	}

	locker
}

#[tokio::test]
async fn locked_dataset_is_reported_as_busy_after_retries() {
	let dataset = TestDataset::new(&rows()).await.expect("Failed to create test dataset.");
	let mut cfg = dataset.storage_config();

	cfg.busy_timeout_ms = 0;

	let db = Db::connect(&cfg).await.expect("Failed to connect to dataset.");
	let locker = lock_dataset(&dataset).await;
	let started = Instant::now();
	let err = queries::find_by_primary(&db, "9876543210")
		.await
		.expect_err("Locked dataset must not answer.");

	assert!(matches!(err, Error::TransientStoreBusy { .. }), "Unexpected error: {err:?}");
	assert!(err.is_transient());
	assert!(started.elapsed() >= db.retry_policy().max_total_delay());

	locker.close().await.expect("Failed to release the dataset lock.");

	let records =
		queries::find_by_primary(&db, "9876543210").await.expect("Lookup after unlock failed.");

	assert_eq!(records.len(), 2);

	db.close().await;
}
