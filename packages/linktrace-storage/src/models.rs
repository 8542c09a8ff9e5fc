use serde::Serialize;

/// One row of the `users` table.
///
/// Every text column is optional; the dataset mixes `NULL`, empty strings, and the literal markers
/// `"None"` and `"N/A"` for missing values. Consumers decide how to interpret them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Record {
	/// Storage sequence position. Used for ordering and statistics only.
	#[serde(skip)]
	pub rowid: i64,
	pub mobile: Option<String>,
	pub alt_mobile: Option<String>,
	pub name: Option<String>,
	pub fname: Option<String>,
	pub email: Option<String>,
	pub address: Option<String>,
	pub circle: Option<String>,
	pub operator_id: Option<String>,
}
