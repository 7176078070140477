//! Error taxonomy for a peer process (`spec.md` §7): validation errors map
//! to `-32602`, protocol-state/crypto/transport failures to `-32603`, and
//! unknown methods are handled by the dispatcher directly with `-32601`.

use gateway_models::rpc::{ERROR_INTERNAL, ERROR_INVALID_PARAMS};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
	#[error(transparent)]
	Core(#[from] gateway_core::Error),

	#[error(transparent)]
	Wallet(#[from] gateway_wallet::WalletError),

	#[error(transparent)]
	Mint(#[from] gateway_mint_client::MintError),

	#[error(transparent)]
	Lightning(#[from] gateway_lightning_client::LightningError),

	#[error(transparent)]
	Messaging(#[from] gateway_messaging::MessagingError),

	#[error(transparent)]
	Token(#[from] gateway_models::token::TokenError),

	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid hex: {0}")]
	Hex(String),

	#[error("no pending request found for key {0}")]
	UnknownPendingRequest(String),

	#[error("amount mismatch: expected {expected}, got {actual}")]
	AmountMismatch { expected: u64, actual: u64 },

	#[error("invoice payment_hash does not match the HTLC's locked hash")]
	PaymentHashMismatch,

	#[error("revealed preimage does not hash to the expected value")]
	PreimageMismatch,

	#[error("invalid bolt11 invoice: {0}")]
	InvalidInvoice(String),

	#[error("received proof does not lock to this wallet's own pubkey")]
	ForeignLock,

	#[error("config error: {0}")]
	Config(String),
}

impl NodeError {
	/// JSON-RPC error code this failure should be reported under.
	pub fn rpc_code(&self) -> i64 {
		match self {
			NodeError::AmountMismatch { .. }
			| NodeError::PaymentHashMismatch
			| NodeError::InvalidInvoice(_)
			| NodeError::Hex(_)
			| NodeError::Json(_) => ERROR_INVALID_PARAMS,
			_ => ERROR_INTERNAL,
		}
	}
}

pub type Result<T> = std::result::Result<T, NodeError>;
