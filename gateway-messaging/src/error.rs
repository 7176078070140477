use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
	#[error("transport error: {0}")]
	Transport(String),

	#[error("no response received within the timeout")]
	Timeout,

	#[error("peer returned an rpc error {code}: {message}")]
	Rpc { code: i64, message: String },

	#[error("serialization error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MessagingError>;
