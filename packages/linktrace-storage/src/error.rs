use std::path::PathBuf;

/// SQLite primary result code for `SQLITE_BUSY`.
const SQLITE_BUSY: i32 = 5;
/// SQLite primary result code for `SQLITE_LOCKED`.
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to open dataset at {path:?}.")]
	Connection { path: PathBuf, source: sqlx::Error },
	#[error("Storage session is not connected.")]
	NotConnected,
	#[error("Store busy: {message}")]
	TransientStoreBusy { message: String },
	#[error(transparent)]
	Query(sqlx::Error),
}
impl Error {
	/// Whether the retry policy may absorb this error.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::TransientStoreBusy { .. })
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		if is_busy_or_locked(&err) {
			Self::TransientStoreBusy { message: err.to_string() }
		} else {
			Self::Query(err)
		}
	}
}

fn is_busy_or_locked(err: &sqlx::Error) -> bool {
	let sqlx::Error::Database(db_err) = err else {
		return false;
	};
	// SQLite reports extended codes; the primary code lives in the low byte.
	if let Some(code) = db_err.code().and_then(|code| code.parse::<i32>().ok())
		&& matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
	{
		return true;
	}

	let message = db_err.message().to_ascii_lowercase();

	message.contains("busy") || message.contains("locked")
}
