use thiserror::Error;

/// Errors produced by the cryptographic primitives, contract encoding, and
/// proof bookkeeping in this crate.
#[derive(Debug, Error)]
pub enum Error {
	/// A hash-to-curve search exceeded its iteration bound without finding a
	/// valid curve point. Should not happen in practice.
	#[error("hash-to-curve did not converge")]
	HashToCurveExhausted,

	/// secp256k1 rejected a key, point, or signature operation.
	#[error("secp256k1 error: {0}")]
	Secp256k1(#[from] secp256k1::Error),

	/// Malformed hex input.
	#[error("invalid hex: {0}")]
	Hex(String),

	/// A `Secret` string did not decode to the expected two-element
	/// `[kind, data]` JSON array shape.
	#[error("malformed secret: {0}")]
	MalformedSecret(String),

	/// `Secret.data` was not the expected length (32 bytes for an HTLC hash,
	/// 33 bytes for a P2PK pubkey).
	#[error("invalid secret data length: expected {expected}, got {actual}")]
	InvalidSecretDataLength { expected: usize, actual: usize },

	/// A numeric tag (`locktime`, `n_sigs`, `n_sigs_refund`) was not a valid
	/// decimal integer string.
	#[error("invalid numeric tag {tag}: {value}")]
	InvalidNumericTag { tag: &'static str, value: String },

	/// `serde_json` (de)serialization failure for a contract-encoded value.
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	/// Tried to split an amount that has no valid power-of-two denomination
	/// decomposition (never happens for `amount >= 0` in base 2, kept for
	/// defensiveness against a zero-amount request).
	#[error("cannot split amount {0} into denominations")]
	UnsplittableAmount(u64),

	/// The local proof store was asked to select more value than it holds.
	#[error("insufficient balance: have {available}, need {requested}")]
	InsufficientBalance { available: u64, requested: u64 },

	/// A proof with the same `Y` already exists in the store.
	#[error("duplicate proof for Y={0}")]
	DuplicateProof(String),
}

pub type Result<T> = std::result::Result<T, Error>;
