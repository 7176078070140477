//! In-memory test mint: generates its own keyset, performs real BDHKE
//! signing, and verifies spending conditions (including SIG_ALL and HTLC)
//! exactly as `verify.rs` would for a real mint. Lets the seed test
//! scenarios of `spec.md` §8 exercise a genuine signature round-trip
//! end-to-end without a network service.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use gateway_core::{BlindedMessage, BlindedSignature, Proof};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use tokio::sync::{mpsc, Mutex};

use crate::client::{Keyset, MintClient, ProofState, ProofStateEvent};
use crate::error::{MintError, Result};
use crate::verify::verify_swap_request;

fn now_unix() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_secs()
}

struct Subscriber {
	ys: Vec<String>,
	sender: mpsc::Sender<ProofStateEvent>,
}

pub struct MockMint {
	secp: Secp256k1<secp256k1::All>,
	keyset_id: String,
	unit: String,
	secret_keys: BTreeMap<u64, SecretKey>,
	states: Mutex<HashMap<String, (ProofState, Option<String>)>>,
	subscribers: Mutex<Vec<Subscriber>>,
	/// Clock `swap` evaluates locktime/refund conditions against. `0` (the
	/// default) means "use the wall clock"; tests that need to exercise a
	/// post-locktime refund path under `#[tokio::test(start_paused = true)]`
	/// set this explicitly instead, since pausing Tokio's timer only
	/// advances virtual time, not `SystemTime::now`.
	now_override: AtomicU64,
}

impl MockMint {
	/// Generates a fresh keyset covering the given power-of-two
	/// denominations (e.g. `&[1, 2, 4, 8, ..., 1 << 20]`).
	pub fn new(keyset_id: impl Into<String>, unit: impl Into<String>, denominations: &[u64]) -> Self {
		let secp = Secp256k1::new();
		let secret_keys = denominations
			.iter()
			.map(|&amount| (amount, SecretKey::new(&mut rand::thread_rng())))
			.collect();
		MockMint {
			secp,
			keyset_id: keyset_id.into(),
			unit: unit.into(),
			secret_keys,
			states: Mutex::new(HashMap::new()),
			subscribers: Mutex::new(Vec::new()),
			now_override: AtomicU64::new(0),
		}
	}

	pub fn keyset_id(&self) -> &str {
		&self.keyset_id
	}

	/// Overrides the clock used for locktime/refund evaluation in `swap`.
	/// Test-only: lets a scenario fast-forward past a 24h invoice locktime
	/// without waiting for real wall-clock time to elapse.
	pub fn set_now(&self, now: u64) {
		self.now_override.store(now, Ordering::SeqCst);
	}

	fn now(&self) -> u64 {
		match self.now_override.load(Ordering::SeqCst) {
			0 => now_unix(),
			overridden => overridden,
		}
	}

	/// Test-only faucet: signs `outputs` directly with no input proofs,
	/// standing in for the real mint's NUT-04 `mint`-against-lightning-quote
	/// endpoint (out of this workspace's scope per `spec.md` §1). Lets
	/// integration tests fund a wallet's starting balance without modeling
	/// that external flow.
	pub fn issue(&self, outputs: &[BlindedMessage]) -> Result<Vec<BlindedSignature>> {
		outputs.iter().map(|o| self.sign_output(o)).collect()
	}

	fn sign_output(&self, output: &BlindedMessage) -> Result<BlindedSignature> {
		if output.id != self.keyset_id {
			return Err(MintError::UnknownKeyset(output.id.clone()));
		}
		let sk = self
			.secret_keys
			.get(&output.amount)
			.ok_or_else(|| MintError::UnknownDenomination {
				keyset_id: output.id.clone(),
				amount: output.amount,
			})?;
		let scalar = Scalar::from(*sk);
		let c = output.b.mul_tweak(&self.secp, &scalar)?;
		Ok(BlindedSignature { id: output.id.clone(), amount: output.amount, c })
	}

	async fn mark_spent(&self, y_hex: &str, preimage: Option<String>) {
		{
			let mut states = self.states.lock().await;
			states.insert(y_hex.to_string(), (ProofState::Spent, preimage.clone()));
		}
		let subscribers = self.subscribers.lock().await;
		for sub in subscribers.iter() {
			if sub.ys.iter().any(|y| y == y_hex) {
				let _ = sub
					.sender
					.send(ProofStateEvent {
						y_hex: y_hex.to_string(),
						state: ProofState::Spent,
						preimage: preimage.clone(),
					})
					.await;
			}
		}
	}
}

#[async_trait]
impl MintClient for MockMint {
	async fn load_keysets(&self) -> Result<Vec<Keyset>> {
		let keys = self
			.secret_keys
			.iter()
			.map(|(amount, sk)| (*amount, PublicKey::from_secret_key(&self.secp, sk)))
			.collect();
		Ok(vec![Keyset { id: self.keyset_id.clone(), unit: self.unit.clone(), keys }])
	}

	async fn swap(
		&self,
		inputs: Vec<Proof>,
		outputs: Vec<BlindedMessage>,
	) -> Result<Vec<BlindedSignature>> {
		verify_swap_request(&self.secp, &inputs, &outputs, self.now())?;

		for proof in &inputs {
			let y_hex = proof.y_hex()?;
			let existing = self.states.lock().await.get(&y_hex).cloned();
			if matches!(existing, Some((ProofState::Spent, _))) {
				return Err(MintError::Mint(format!("proof {y_hex} already spent")));
			}
		}

		let preimage = inputs
			.first()
			.and_then(|p| p.witness.as_ref())
			.and_then(|w| w.preimage.clone());

		let signatures = outputs.iter().map(|o| self.sign_output(o)).collect::<Result<Vec<_>>>()?;

		for proof in &inputs {
			let y_hex = proof.y_hex()?;
			self.mark_spent(&y_hex, preimage.clone()).await;
		}

		Ok(signatures)
	}

	async fn subscribe_proof_state(&self, ys: Vec<String>) -> Result<mpsc::Receiver<ProofStateEvent>> {
		let (tx, rx) = mpsc::channel(64);

		{
			let states = self.states.lock().await;
			for y in &ys {
				if let Some((state, preimage)) = states.get(y) {
					let _ = tx
						.send(ProofStateEvent { y_hex: y.clone(), state: *state, preimage: preimage.clone() })
						.await;
				}
			}
		}

		self.subscribers.lock().await.push(Subscriber { ys, sender: tx });
		Ok(rx)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gateway_core::{generate_outputs, to_blinded_messages, LockSpec, Witness};
	use secp256k1::{PublicKey as Pk, SecretKey as Sk};

	fn denominations() -> Vec<u64> {
		(0..20).map(|i| 1u64 << i).collect()
	}

	#[tokio::test]
	async fn swap_signs_outputs_and_marks_inputs_spent() {
		let mint = MockMint::new("00deadbeef123456", "sat", &denominations());
		let secp = Secp256k1::new();

		let owner_sk = Sk::new(&mut rand::thread_rng());
		let owner_pk = Pk::from_secret_key(&secp, &owner_sk);

		let lock = LockSpec::P2PK {
			pubkeys: vec![owner_pk.to_string()],
			sigflag: gateway_core::SigFlag::SigInputs,
			n_sigs: None,
			locktime: None,
			refund: vec![],
		};
		let outputs_in = generate_outputs(&secp, mint.keyset_id(), 4, &lock).unwrap();
		let blinded_in = to_blinded_messages(&outputs_in);
		let sigs_in = mint.load_keysets().await.unwrap();
		let keys = &sigs_in[0].keys;

		// mint "signs" so we can build a spendable proof for the swap below.
		let blind_sig = blinded_in[0].b.mul_tweak(&secp, &Scalar::from(mint.secret_keys[&4])).unwrap();
		let unblinded = gateway_core::crypto::unblind_signature(
			&secp,
			&blind_sig,
			&outputs_in[0].blinding_factor,
			&keys[&4],
		)
		.unwrap();

		let mut proof = Proof {
			id: mint.keyset_id().to_string(),
			amount: 4,
			secret: outputs_in[0].secret.clone(),
			c: unblinded,
			witness: None,
		};

		let message = gateway_core::crypto::sha256(&proof.secret.canonical_bytes());
		let sig = gateway_core::crypto::sign_schnorr(&secp, &message, &owner_sk);
		proof.witness = Some(Witness::signatures_only(vec![sig.to_string()]));

		let new_lock = LockSpec::P2PK {
			pubkeys: vec![owner_pk.to_string()],
			sigflag: gateway_core::SigFlag::SigInputs,
			n_sigs: None,
			locktime: None,
			refund: vec![],
		};
		let fresh_outputs = generate_outputs(&secp, mint.keyset_id(), 4, &new_lock).unwrap();
		let fresh_blinded = to_blinded_messages(&fresh_outputs);

		let y_hex = proof.y_hex().unwrap();
		let signatures = mint.swap(vec![proof], fresh_blinded).await.unwrap();
		assert_eq!(signatures.len(), fresh_outputs.len());

		let mut rx = mint.subscribe_proof_state(vec![y_hex]).await.unwrap();
		let event = rx.recv().await.unwrap();
		assert_eq!(event.state, ProofState::Spent);
	}
}
