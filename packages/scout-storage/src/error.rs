pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// True when the underlying failure is a unique-constraint violation;
	/// ingestion treats those as "already seen" rather than as errors.
	pub fn is_unique_violation(&self) -> bool {
		let Self::Sqlx(sqlx::Error::Database(db_err)) = self else {
			return false;
		};

		db_err.code().as_deref() == Some("23505")
	}
}
