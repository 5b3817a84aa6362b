pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<scout_storage::Error> for Error {
	fn from(err: scout_storage::Error) -> Self {
		match err {
			scout_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			scout_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			scout_storage::Error::NotFound(message) => Self::NotFound { message },
			scout_storage::Error::Conflict(message) => Self::Storage { message },
		}
	}
}

impl From<scout_providers::Error> for Error {
	fn from(err: scout_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
