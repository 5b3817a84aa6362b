pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Provider returned status {status}: {body}")]
	Status { status: u16, body: String },
}
impl Error {
	/// Quota-shaped platform failure: a 403 whose body names one of the
	/// known quota rejection reasons. The platform adapter rotates
	/// credentials on these and nothing else.
	pub fn is_quota_shaped(&self) -> bool {
		let Self::Status { status, body } = self else {
			return false;
		};

		*status == 403
			&& ["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"]
				.iter()
				.any(|marker| body.contains(marker))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quota_shape_requires_403_and_marker() {
		let quota = Error::Status { status: 403, body: r#"{"reason":"quotaExceeded"}"#.to_string() };
		let daily =
			Error::Status { status: 403, body: r#"{"reason":"dailyLimitExceeded"}"#.to_string() };
		let forbidden = Error::Status { status: 403, body: "access denied".to_string() };
		let throttled = Error::Status { status: 429, body: "rateLimitExceeded".to_string() };

		assert!(quota.is_quota_shaped());
		assert!(daily.is_quota_shaped());
		assert!(!forbidden.is_quota_shaped());
		assert!(!throttled.is_quota_shaped());
	}
}
