use thiserror::Error;

#[derive(Debug, Error)]
pub enum MintError {
	#[error("transport error: {0}")]
	Transport(String),

	#[error("mint rejected request: {0}")]
	Mint(String),

	#[error("amount mismatch: inputs sum to {inputs}, outputs sum to {outputs}")]
	AmountMismatch { inputs: u64, outputs: u64 },

	#[error("invalid witness: {0}")]
	InvalidWitness(String),

	#[error("signature verification failed")]
	SignatureInvalid,

	#[error("unknown keyset id {0}")]
	UnknownKeyset(String),

	#[error("unknown denomination {amount} for keyset {keyset_id}")]
	UnknownDenomination { keyset_id: String, amount: u64 },

	#[error(transparent)]
	Core(#[from] gateway_core::Error),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MintError>;
