use std::collections::BTreeMap;
use std::sync::Arc;

use gateway_core::crypto::{sha256, sign_schnorr, unblind_signature};
use gateway_core::sigall::sig_all_message;
use gateway_core::{
	generate_outputs, to_blinded_messages, BlindedMessage, BlindedSignature, LocalProofStore,
	LockSpec, OutputData, Proof, Secret, Witness,
};
use gateway_mint_client::{Keyset, MintClient};
use gateway_models::token::TokenEnvelope;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tokio::sync::Mutex;

use crate::error::{Result, WalletError};

/// One peer's keypair, mint connection, and local proof store, with the
/// mechanical operations every role needs: preparing locked outputs,
/// unblinding a mint's response, and selecting+signing its own proofs as
/// swap inputs.
pub struct Wallet {
	secp: Secp256k1<secp256k1::All>,
	secret_key: SecretKey,
	pubkey: PublicKey,
	mint: Arc<dyn MintClient>,
	store: Mutex<LocalProofStore>,
}

impl Wallet {
	pub fn new(secret_key: SecretKey, mint: Arc<dyn MintClient>) -> Self {
		let secp = Secp256k1::new();
		let pubkey = PublicKey::from_secret_key(&secp, &secret_key);
		Wallet { secp, secret_key, pubkey, mint, store: Mutex::new(LocalProofStore::new()) }
	}

	pub fn pubkey(&self) -> PublicKey {
		self.pubkey
	}

	pub fn pubkey_hex(&self) -> String {
		self.pubkey.to_string()
	}

	pub fn mint(&self) -> &Arc<dyn MintClient> {
		&self.mint
	}

	pub async fn balance(&self) -> u64 {
		self.store.lock().await.balance()
	}

	/// The mint's active keyset. Only the first keyset returned is used;
	/// multi-mint/multi-keyset routing is out of scope (`spec.md` §1).
	pub async fn active_keyset(&self) -> Result<Keyset> {
		let keysets = self.mint.load_keysets().await?;
		keysets.into_iter().next().ok_or_else(|| WalletError::NoKeyset("(none)".to_string()))
	}

	/// Builds fresh blinded outputs for `amount` under `lock`, split across
	/// the mint's power-of-two denominations. Does not touch the local
	/// store or spend anything — used both for a peer requesting brand-new
	/// value (A's `M_A`, D's dealer-fee `M_D`) and as the output half of a
	/// self-swap.
	pub async fn prepare_locked_outputs(&self, amount: u64, lock: &LockSpec) -> Result<(String, Vec<OutputData>)> {
		let keyset = self.active_keyset().await?;
		let outputs = generate_outputs(&self.secp, &keyset.id, amount, lock)?;
		Ok((keyset.id, outputs))
	}

	/// Unblinds a mint's signatures against the `OutputData` that produced
	/// them, in matching order. Pass `store = true` only for outputs this
	/// wallet intends to keep spendable; HTLC outputs that are about to be
	/// handed to a counterparty as a token should not be stored here (the
	/// peer layer tracks them separately for refund purposes instead).
	pub async fn unblind(
		&self,
		outputs: &[OutputData],
		signatures: &[BlindedSignature],
		store: bool,
	) -> Result<Vec<Proof>> {
		let keyset = self.active_keyset().await?;
		let mut proofs = Vec::with_capacity(outputs.len());
		for (output, signature) in outputs.iter().zip(signatures) {
			let mint_pubkey = keyset
				.keys
				.get(&output.blinded_message.amount)
				.ok_or_else(|| WalletError::UnknownDenomination {
					keyset_id: keyset.id.clone(),
					amount: output.blinded_message.amount,
				})?;
			let c = unblind_signature(&self.secp, &signature.c, &output.blinding_factor, mint_pubkey)?;
			proofs.push(Proof {
				id: keyset.id.clone(),
				amount: output.blinded_message.amount,
				secret: output.secret.clone(),
				c,
				witness: None,
			});
		}
		if store {
			let mut guard = self.store.lock().await;
			for proof in &proofs {
				guard.save(proof.clone())?;
			}
		}
		Ok(proofs)
	}

	/// Selects this wallet's own proofs covering at least `amount`, removes
	/// them from the store, and signs each with a SIG_INPUTS Schnorr
	/// signature over its own secret — the witness shape required to spend
	/// a proof P2PK-locked to this wallet's pubkey. Returns the signed
	/// inputs and the change left over (`sum(inputs) - amount`), which the
	/// caller is responsible for re-minting as change outputs in the same
	/// swap.
	pub async fn select_and_sign_inputs(&self, amount: u64) -> Result<(Vec<Proof>, u64)> {
		let mut guard = self.store.lock().await;
		let ys = guard.select_for_spend(amount)?;
		let mut inputs = Vec::with_capacity(ys.len());
		let mut total = 0u64;
		for y in ys {
			let mut proof = guard.take(&y).expect("select_for_spend only returns keys present in the store");
			total += proof.amount;
			let message = sha256(&proof.secret.canonical_bytes());
			let signature = sign_schnorr(&self.secp, &message, &self.secret_key);
			proof.witness = Some(Witness::signatures_only(vec![signature.to_string()]));
			inputs.push(proof);
		}
		Ok((inputs, total - amount))
	}

	/// Signs a SIG_ALL witness authorizing a *future* spend of `input_secrets`
	/// into `outputs`, as the holder of a `sigflag=SIG_ALL` lock must when
	/// handing a not-yet-spent token to a counterparty who will perform the
	/// actual mint swap (`spec.md` §4.5.1 step 6: G pre-authorizes D's
	/// `swap_htlc`). `preimage`, when present, is attached alongside the
	/// signature so a single witness can carry both the hashlock reveal and
	/// the owner's signature.
	pub fn sign_sig_all(
		&self,
		input_secrets: &[Secret],
		outputs: &[BlindedMessage],
		preimage: Option<String>,
	) -> Witness {
		let message = sig_all_message(input_secrets, outputs);
		let sig = sign_schnorr(&self.secp, &message, &self.secret_key);
		Witness { signatures: vec![sig.to_string()], preimage }
	}

	/// Attaches a per-proof SIG_INPUTS witness (signature over each proof's
	/// own secret, plus the shared `preimage`) to every proof in place, as
	/// required to spend a `sigflag=SIG_INPUTS` HTLC lock (`spec.md` §4.5.2
	/// step 3).
	pub fn sign_htlc_inputs(&self, proofs: &mut [Proof], preimage: &str) {
		for proof in proofs.iter_mut() {
			let message = sha256(&proof.secret.canonical_bytes());
			let sig = sign_schnorr(&self.secp, &message, &self.secret_key);
			proof.witness = Some(Witness::htlc(preimage.to_string(), vec![sig.to_string()]));
		}
	}

	/// Convenience P2PK-to-self change lock used after a self-swap leaves a
	/// remainder.
	pub fn self_lock(&self) -> LockSpec {
		LockSpec::P2PK {
			pubkeys: vec![self.pubkey_hex()],
			sigflag: gateway_core::SigFlag::SigInputs,
			n_sigs: None,
			locktime: None,
			refund: vec![],
		}
	}

	/// Submits a swap to the mint. Thin pass-through kept on `Wallet` so
	/// tests can exercise the whole unblind round-trip without reaching
	/// past this crate's boundary.
	pub async fn swap(&self, inputs: Vec<Proof>, outputs: Vec<BlindedMessage>) -> Result<Vec<BlindedSignature>> {
		Ok(self.mint.swap(inputs, outputs).await?)
	}

	/// Stores the proofs carried by a received token. `mint` on the
	/// envelope is informational only (no multi-mint routing, `spec.md`
	/// §1); every proof is simply validated against `Y`-uniqueness and
	/// saved.
	pub async fn receive_token(&self, token: &TokenEnvelope) -> Result<u64> {
		let mut guard = self.store.lock().await;
		let mut total = 0u64;
		for proof in &token.proofs {
			guard.save(proof.clone())?;
			total += proof.amount;
		}
		Ok(total)
	}

	/// Encodes a set of proofs (already unblinded, not necessarily stored)
	/// as a transportable token string.
	pub fn encode_token(&self, mint_url: &str, unit: &str, proofs: Vec<Proof>) -> TokenEnvelope {
		TokenEnvelope::new(mint_url, unit, proofs)
	}

	/// Snapshot of this wallet's currently held keyset's per-denomination
	/// mint pubkeys, used by callers that need to unblind outside of
	/// `unblind` (e.g. verifying a counterparty's own unblinding work in
	/// tests).
	pub async fn keyset_keys(&self) -> Result<BTreeMap<u64, PublicKey>> {
		Ok(self.active_keyset().await?.keys)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gateway_mint_client::MockMint;

	fn denominations() -> Vec<u64> {
		(0..20).map(|i| 1u64 << i).collect()
	}

	fn keypair() -> SecretKey {
		SecretKey::new(&mut rand::thread_rng())
	}

	async fn fund(wallet: &Wallet, mint: &MockMint, amount: u64) {
		let lock = wallet.self_lock();
		let (_id, outputs) = wallet.prepare_locked_outputs(amount, &lock).await.unwrap();
		let blinded = to_blinded_messages(&outputs);
		let signatures = mint.issue(&blinded).unwrap();
		wallet.unblind(&outputs, &signatures, true).await.unwrap();
	}

	#[tokio::test]
	async fn prepare_locked_outputs_splits_by_denomination() {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let wallet = Wallet::new(keypair(), mint);

		let lock = wallet.self_lock();
		let (_id, outputs) = wallet.prepare_locked_outputs(13, &lock).await.unwrap();
		assert_eq!(outputs.len(), 3);
	}

	#[tokio::test]
	async fn unblind_round_trips_a_funded_balance() {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let wallet = Wallet::new(keypair(), mint.clone());

		fund(&wallet, &mint, 13).await;
		assert_eq!(wallet.balance().await, 13);
	}

	#[tokio::test]
	async fn select_and_sign_inputs_leaves_correct_change_and_empties_store() {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let wallet = Wallet::new(keypair(), mint.clone());
		fund(&wallet, &mint, 13).await;

		let (inputs, change) = wallet.select_and_sign_inputs(5).await.unwrap();
		let total: u64 = inputs.iter().map(|p| p.amount).sum();
		assert_eq!(total, 13);
		assert_eq!(change, 8);
		assert_eq!(wallet.balance().await, 0);
		for proof in &inputs {
			let witness = proof.witness.as_ref().unwrap();
			assert_eq!(witness.signatures.len(), 1);
		}
	}

	#[tokio::test]
	async fn self_swap_into_htlc_and_change_preserves_total_amount() {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let wallet = Wallet::new(keypair(), mint.clone());
		fund(&wallet, &mint, 13).await;

		let (inputs, change) = wallet.select_and_sign_inputs(5).await.unwrap();
		assert_eq!(change, 8);

		let htlc_lock = LockSpec::Htlc {
			preimage_hash_hex: "cc".repeat(32),
			pubkeys: vec![],
			sigflag: gateway_core::SigFlag::SigInputs,
			n_sigs: None,
			locktime: Some(1_000_000),
			refund: vec![wallet.pubkey_hex()],
			n_sigs_refund: None,
		};
		let (_id, htlc_outputs) = wallet.prepare_locked_outputs(5, &htlc_lock).await.unwrap();
		let change_lock = wallet.self_lock();
		let (_id, change_outputs) = wallet.prepare_locked_outputs(change, &change_lock).await.unwrap();

		let mut all_outputs = htlc_outputs.clone();
		all_outputs.extend(change_outputs.clone());
		let blinded = to_blinded_messages(&all_outputs);

		let signatures = wallet.swap(inputs, blinded).await.unwrap();
		let (htlc_sigs, change_sigs) = signatures.split_at(htlc_outputs.len());

		let htlc_proofs = wallet.unblind(&htlc_outputs, htlc_sigs, false).await.unwrap();
		assert_eq!(htlc_proofs.iter().map(|p| p.amount).sum::<u64>(), 5);

		wallet.unblind(&change_outputs, change_sigs, true).await.unwrap();
		assert_eq!(wallet.balance().await, change);
	}

	#[tokio::test]
	async fn sign_sig_all_produces_a_verifiable_witness() {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let wallet = Wallet::new(keypair(), mint.clone());

		let secret = gateway_core::Secret::new_htlc(
			"cc".repeat(32),
			vec![vec!["pubkeys".to_string(), wallet.pubkey_hex()]],
		);
		let outputs = generate_outputs(
			&Secp256k1::new(),
			&wallet.active_keyset().await.unwrap().id,
			4,
			&wallet.self_lock(),
		)
		.unwrap();
		let blinded = to_blinded_messages(&outputs);

		let witness = wallet.sign_sig_all(&[secret.clone()], &blinded, Some("ab".repeat(32)));
		assert_eq!(witness.signatures.len(), 1);
		assert_eq!(witness.preimage, Some("ab".repeat(32)));

		use hex::FromHex;
		let sig_bytes = Vec::<u8>::from_hex(&witness.signatures[0]).unwrap();
		let sig = secp256k1::schnorr::Signature::from_slice(&sig_bytes).unwrap();
		assert!(gateway_core::sigall::verify_sig_all_compressed(
			&Secp256k1::new(),
			&[secret],
			&blinded,
			&sig,
			&wallet.pubkey(),
		));
	}

	#[tokio::test]
	async fn sign_htlc_inputs_attaches_a_witness_per_proof() {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let wallet = Wallet::new(keypair(), mint.clone());
		fund(&wallet, &mint, 5).await;

		let (mut inputs, _change) = wallet.select_and_sign_inputs(5).await.unwrap();
		for proof in inputs.iter_mut() {
			proof.witness = None;
		}
		wallet.sign_htlc_inputs(&mut inputs, &"ee".repeat(32));

		for proof in &inputs {
			let witness = proof.witness.as_ref().unwrap();
			assert_eq!(witness.signatures.len(), 1);
			assert_eq!(witness.preimage.as_deref(), Some("ee".repeat(32).as_str()));
		}
	}
}
