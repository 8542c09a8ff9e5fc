//! The statements issued against the `users` table.
//!
//! Traversal only ever uses the two equality lookups, both backed by column indexes. The name
//! search is a full scan and stays off the traversal path.

use crate::{Result, db::Db, models::Record};

const FIND_BY_PRIMARY_SQL: &str = "\
SELECT
	rowid,
	CAST(mobile AS TEXT) AS mobile,
	CAST(alt_mobile AS TEXT) AS alt_mobile,
	CAST(name AS TEXT) AS name,
	CAST(fname AS TEXT) AS fname,
	CAST(email AS TEXT) AS email,
	CAST(address AS TEXT) AS address,
	CAST(circle AS TEXT) AS circle,
	CAST(operator_id AS TEXT) AS operator_id
FROM users
WHERE mobile = ?1
ORDER BY rowid
LIMIT ?2";

const FIND_BY_SECONDARY_SQL: &str = "\
SELECT
	rowid,
	CAST(mobile AS TEXT) AS mobile,
	CAST(alt_mobile AS TEXT) AS alt_mobile,
	CAST(name AS TEXT) AS name,
	CAST(fname AS TEXT) AS fname,
	CAST(email AS TEXT) AS email,
	CAST(address AS TEXT) AS address,
	CAST(circle AS TEXT) AS circle,
	CAST(operator_id AS TEXT) AS operator_id
FROM users
WHERE alt_mobile = ?1
ORDER BY rowid
LIMIT ?2";

const SEARCH_BY_NAME_SQL: &str = "\
SELECT
	rowid,
	CAST(mobile AS TEXT) AS mobile,
	CAST(alt_mobile AS TEXT) AS alt_mobile,
	CAST(name AS TEXT) AS name,
	CAST(fname AS TEXT) AS fname,
	CAST(email AS TEXT) AS email,
	CAST(address AS TEXT) AS address,
	CAST(circle AS TEXT) AS circle,
	CAST(operator_id AS TEXT) AS operator_id
FROM users
WHERE name LIKE ?1 ESCAPE '\\'
LIMIT ?2";

/// Rows whose `mobile` column equals `identifier`.
pub async fn find_by_primary(db: &Db, identifier: &str) -> Result<Vec<Record>> {
	fetch_records(db, "find_by_primary", FIND_BY_PRIMARY_SQL, identifier.to_string()).await
}

/// Rows whose `alt_mobile` column equals `identifier`.
pub async fn find_by_secondary(db: &Db, identifier: &str) -> Result<Vec<Record>> {
	fetch_records(db, "find_by_secondary", FIND_BY_SECONDARY_SQL, identifier.to_string()).await
}

/// Substring match on `name`. Scans the table.
pub async fn search_by_name(db: &Db, fragment: &str) -> Result<Vec<Record>> {
	let pattern = format!("%{}%", escape_like(fragment));

	fetch_records(db, "search_by_name", SEARCH_BY_NAME_SQL, pattern).await
}

/// Approximate row count taken from the highest rowid.
pub async fn row_count(db: &Db) -> Result<i64> {
	let max = db
		.read("row_count", |conn| {
			Box::pin(async move {
				sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(rowid) FROM users")
					.fetch_one(conn)
					.await
			})
		})
		.await?;

	Ok(max.unwrap_or(0))
}

/// Dataset size derived from page accounting.
pub async fn storage_size_bytes(db: &Db) -> Result<i64> {
	db.read("storage_size_bytes", |conn| {
		Box::pin(async move {
			sqlx::query_scalar::<_, i64>(
				"SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
			)
			.fetch_one(conn)
			.await
		})
	})
	.await
}

async fn fetch_records(
	db: &Db,
	operation: &'static str,
	sql: &'static str,
	value: String,
) -> Result<Vec<Record>> {
	let limit = i64::from(db.max_results());

	db.read(operation, |conn| {
		let value = value.clone();

		Box::pin(async move {
			sqlx::query_as::<_, Record>(sql).bind(value).bind(limit).fetch_all(conn).await
		})
	})
	.await
}

fn escape_like(fragment: &str) -> String {
	let mut out = String::with_capacity(fragment.len());

	for ch in fragment.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
