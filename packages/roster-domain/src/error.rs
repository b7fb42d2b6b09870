pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidInput { message: String },
	#[error("Malformed stored data: {message}")]
	DataFormat { message: String },
	#[error("Unknown field {name:?} in {setting}.")]
	UnknownField { setting: String, name: String },
}
