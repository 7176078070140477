use thiserror::Error;

#[derive(Debug, Error)]
pub enum LightningError {
	#[error("transport error: {0}")]
	Transport(String),

	#[error("lightning backend rejected request: {0}")]
	Backend(String),

	#[error("invalid invoice: {0}")]
	InvalidInvoice(String),

	#[error("backend does not support HODL invoices")]
	HodlNotSupported,
}

pub type Result<T> = std::result::Result<T, LightningError>;
