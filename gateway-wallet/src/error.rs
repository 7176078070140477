use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
	#[error(transparent)]
	Core(#[from] gateway_core::Error),

	#[error(transparent)]
	Mint(#[from] gateway_mint_client::MintError),

	#[error(transparent)]
	Token(#[from] gateway_models::token::TokenError),

	#[error("mint has no keyset for unit {0}")]
	NoKeyset(String),

	#[error("mint keyset {keyset_id} has no key for denomination {amount}")]
	UnknownDenomination { keyset_id: String, amount: u64 },

	#[error("a received proof's secret does not lock to this wallet's own pubkey")]
	ForeignLock,
}

pub type Result<T> = std::result::Result<T, WalletError>;
