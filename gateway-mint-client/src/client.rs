//! The `MintClient` trait decouples peer protocol logic from the mint
//! transport so tests can swap in an in-memory mint that performs real
//! signing without standing up a network service.

use async_trait::async_trait;
use gateway_core::{BlindedMessage, BlindedSignature, Proof};
use secp256k1::PublicKey;
use tokio::sync::mpsc;

use crate::error::Result;

/// One mint public key per denomination for a given keyset.
#[derive(Debug, Clone)]
pub struct Keyset {
	pub id: String,
	pub unit: String,
	pub keys: std::collections::BTreeMap<u64, PublicKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofState {
	Unspent,
	Pending,
	Spent,
}

#[derive(Debug, Clone)]
pub struct ProofStateEvent {
	pub y_hex: String,
	pub state: ProofState,
	/// Preimage observed in the spending witness, if any — used by the
	/// Proof-State Tracker to recover a counterparty-revealed secret.
	pub preimage: Option<String>,
}

#[async_trait]
pub trait MintClient: Send + Sync {
	/// Loads the mint's active keysets, refreshing any local cache on miss.
	async fn load_keysets(&self) -> Result<Vec<Keyset>>;

	/// Atomically swaps `inputs` for freshly blinded `outputs`. The mint
	/// validates amount balance, witnesses, and sigflag before responding;
	/// signatures are returned in the same order as `outputs`.
	async fn swap(
		&self,
		inputs: Vec<Proof>,
		outputs: Vec<BlindedMessage>,
	) -> Result<Vec<BlindedSignature>>;

	/// Subscribes to proof-state transitions for a set of `Y` values. The
	/// returned channel delivers every transition (not just terminal
	/// states); the Proof-State Tracker decides when a tracked set is fully
	/// `SPENT`.
	async fn subscribe_proof_state(&self, ys: Vec<String>) -> Result<mpsc::Receiver<ProofStateEvent>>;
}
