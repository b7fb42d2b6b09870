pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Bad request: {message}")]
	BadRequest { message: String },
	#[error("Forbidden: {message}")]
	Forbidden { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Malformed data: {message}")]
	DataFormat { message: String },
	#[error("Backend unavailable: {message}")]
	BackendUnavailable { message: String },
	#[error("Invalid configuration: {message}")]
	InvalidConfig { message: String },
}
impl From<roster_domain::Error> for Error {
	fn from(err: roster_domain::Error) -> Self {
		match err {
			roster_domain::Error::InvalidInput { message } => Self::BadRequest { message },
			roster_domain::Error::DataFormat { message } => Self::DataFormat { message },
			err @ roster_domain::Error::UnknownField { .. } =>
				Self::InvalidConfig { message: err.to_string() },
		}
	}
}

impl From<roster_storage::Error> for Error {
	fn from(err: roster_storage::Error) -> Self {
		match err {
			roster_storage::Error::InvalidArgument(message) => Self::BadRequest { message },
			err @ roster_storage::Error::InvalidDocument { .. } =>
				Self::DataFormat { message: err.to_string() },
			err => Self::BackendUnavailable { message: err.to_string() },
		}
	}
}

impl From<roster_providers::Error> for Error {
	fn from(err: roster_providers::Error) -> Self {
		Self::BackendUnavailable { message: format!("Verification service: {err}") }
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::BackendUnavailable { message: format!("Background task failed: {err}") }
	}
}
