pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid identifier: {message}")]
	InvalidIdentifier { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Storage is not connected.")]
	NotConnected,
	#[error("Storage busy: {message}")]
	StoreBusy { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Lookup cancelled.")]
	Cancelled,
}

impl From<linktrace_storage::Error> for Error {
	fn from(err: linktrace_storage::Error) -> Self {
		match err {
			linktrace_storage::Error::NotConnected => Self::NotConnected,
			linktrace_storage::Error::TransientStoreBusy { message } => Self::StoreBusy { message },
			err @ linktrace_storage::Error::Connection { .. } =>
				Self::Storage { message: err.to_string() },
			linktrace_storage::Error::Query(inner) => Self::Storage { message: inner.to_string() },
		}
	}
}
