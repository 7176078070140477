//! Proof-State Tracker (`spec.md` §4.5.3): watches a tracked set of `Y`
//! values and resolves once every one of them has transitioned to SPENT,
//! surfacing any preimage the mint observed in the spending witness along
//! the way. Used opportunistically — nothing on the required RPC path
//! blocks on it — by G to notice when its self-minted HTLC is eventually
//! settled, and available to a CLI/operator for the optional
//! reconstruct-from-mint-state fallback noted in §4.5.1.

use std::collections::HashSet;
use std::sync::Arc;

use gateway_mint_client::{MintClient, ProofState};

use crate::error::{NodeError, Result};

pub struct ProofStateTracker {
	mint: Arc<dyn MintClient>,
}

impl ProofStateTracker {
	pub fn new(mint: Arc<dyn MintClient>) -> Self {
		ProofStateTracker { mint }
	}

	/// Blocks until every `Y` in `ys` has been reported SPENT. Reopens the
	/// mint subscription whenever its channel drains before the set has
	/// fully settled (connection loss); resolves once the set is empty.
	pub async fn wait_for_all_spent(&self, ys: Vec<String>) -> Result<Option<String>> {
		let mut remaining: HashSet<String> = ys.into_iter().collect();
		let mut preimage = None;

		while !remaining.is_empty() {
			let to_watch: Vec<String> = remaining.iter().cloned().collect();
			let mut rx = self
				.mint
				.subscribe_proof_state(to_watch)
				.await
				.map_err(NodeError::Mint)?;

			while let Some(event) = rx.recv().await {
				if event.state == ProofState::Spent && remaining.remove(&event.y_hex) {
					if event.preimage.is_some() {
						preimage = event.preimage;
					}
				}
				if remaining.is_empty() {
					break;
				}
			}
		}

		Ok(preimage)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gateway_core::crypto::{sha256, sign_schnorr, unblind_signature};
	use gateway_core::{generate_outputs, to_blinded_messages, LockSpec, Proof, SigFlag, Witness};
	use gateway_mint_client::MockMint;
	use secp256k1::Secp256k1;

	fn denominations() -> Vec<u64> {
		(0..10).map(|i| 1u64 << i).collect()
	}

	#[tokio::test]
	async fn resolves_once_all_tracked_ys_are_spent() {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let secp = Secp256k1::new();

		let owner_sk = secp256k1::SecretKey::new(&mut rand::thread_rng());
		let owner_pk = secp256k1::PublicKey::from_secret_key(&secp, &owner_sk);
		let lock = LockSpec::P2PK {
			pubkeys: vec![owner_pk.to_string()],
			sigflag: SigFlag::SigInputs,
			n_sigs: None,
			locktime: None,
			refund: vec![],
		};
		let outputs_in = generate_outputs(&secp, mint.keyset_id(), 4, &lock).unwrap();
		let blinded_in = to_blinded_messages(&outputs_in);
		let sigs_in = mint.issue(&blinded_in).unwrap();

		let keysets = mint.load_keysets().await.unwrap();
		let mint_key = keysets[0].keys[&4];
		let unblinded =
			unblind_signature(&secp, &sigs_in[0].c, &outputs_in[0].blinding_factor, &mint_key).unwrap();

		let mut proof = Proof {
			id: mint.keyset_id().to_string(),
			amount: 4,
			secret: outputs_in[0].secret.clone(),
			c: unblinded,
			witness: None,
		};
		let message = sha256(&proof.secret.canonical_bytes());
		let sig = sign_schnorr(&secp, &message, &owner_sk);
		// a non-HTLC proof may still carry an incidental preimage in its
		// witness; the tracker only cares that the mint echoes one back.
		proof.witness = Some(Witness::htlc("ab".repeat(32), vec![sig.to_string()]));
		let y_hex = proof.y_hex().unwrap();

		let tracker = ProofStateTracker::new(mint.clone());
		let ys = vec![y_hex.clone()];
		let wait = tokio::spawn(async move { tracker.wait_for_all_spent(ys).await });
		tokio::task::yield_now().await;

		let new_lock = LockSpec::P2PK {
			pubkeys: vec![owner_pk.to_string()],
			sigflag: SigFlag::SigInputs,
			n_sigs: None,
			locktime: None,
			refund: vec![],
		};
		let fresh_outputs = generate_outputs(&secp, mint.keyset_id(), 4, &new_lock).unwrap();
		let fresh_blinded = to_blinded_messages(&fresh_outputs);
		mint.swap(vec![proof], fresh_blinded).await.unwrap();

		let preimage = wait.await.unwrap().unwrap();
		assert_eq!(preimage, Some("ab".repeat(32)));
	}
}
