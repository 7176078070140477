//! Local Proof Store: a peer's in-memory wallet of unspent proofs, keyed by
//! `Y` so the same secret can never be stored twice, with deterministic
//! selection for spending (smallest-amount-first, then lexicographic by
//! `Y`) so repeated runs pick the same proofs given the same balance.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::proof::Proof;

#[derive(Debug, Default)]
pub struct LocalProofStore {
	proofs: BTreeMap<String, Proof>,
}

impl LocalProofStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `proof` to the store. Rejects a proof whose `Y` is already
	/// present, since `Y` uniquely identifies a secret and the mint would
	/// reject the duplicate anyway.
	pub fn save(&mut self, proof: Proof) -> Result<()> {
		let y = proof.y_hex()?;
		if self.proofs.contains_key(&y) {
			return Err(Error::DuplicateProof(y));
		}
		self.proofs.insert(y, proof);
		Ok(())
	}

	/// Removes a proof by its `Y`, returning it if present. Used once a
	/// proof has been spent or melted away.
	pub fn remove(&mut self, y_hex: &str) -> Option<Proof> {
		self.proofs.remove(y_hex)
	}

	pub fn contains(&self, y_hex: &str) -> bool {
		self.proofs.contains_key(y_hex)
	}

	pub fn balance(&self) -> u64 {
		self.proofs.values().map(|p| p.amount).sum()
	}

	pub fn len(&self) -> usize {
		self.proofs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.proofs.is_empty()
	}

	pub fn all(&self) -> impl Iterator<Item = &Proof> {
		self.proofs.values()
	}

	/// Selects the smallest set of proofs, ordered smallest-amount-first and
	/// then by `Y`, whose amounts sum to at least `target`. Returns the
	/// selected proofs' `Y` keys (not removed from the store; the caller
	/// removes them once the spend actually succeeds).
	pub fn select_for_spend(&self, target: u64) -> Result<Vec<String>> {
		let mut candidates: Vec<(&String, &Proof)> = self.proofs.iter().collect();
		candidates.sort_by(|a, b| a.1.amount.cmp(&b.1.amount).then_with(|| a.0.cmp(b.0)));

		let mut selected = Vec::new();
		let mut accumulated = 0u64;
		for (y, proof) in candidates {
			if accumulated >= target {
				break;
			}
			selected.push(y.clone());
			accumulated += proof.amount;
		}

		if accumulated < target {
			return Err(Error::InsufficientBalance { available: self.balance(), requested: target });
		}
		Ok(selected)
	}

	pub fn take(&mut self, y_hex: &str) -> Option<Proof> {
		self.remove(y_hex)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::secret::Secret;
	use secp256k1::{PublicKey, Secp256k1, SecretKey};

	fn dummy_proof(amount: u64) -> Proof {
		let secp = Secp256k1::new();
		let sk = SecretKey::new(&mut rand::thread_rng());
		let c = PublicKey::from_secret_key(&secp, &sk);
		Proof {
			id: "00deadbeef123456".to_string(),
			amount,
			secret: Secret::new_p2pk("02".to_string() + &"ab".repeat(32), vec![]),
			c,
			witness: None,
		}
	}

	#[test]
	fn save_rejects_duplicate_y() {
		let mut store = LocalProofStore::new();
		let proof = dummy_proof(4);
		store.save(proof.clone()).unwrap();
		assert!(store.save(proof).is_err());
	}

	#[test]
	fn balance_sums_amounts() {
		let mut store = LocalProofStore::new();
		store.save(dummy_proof(1)).unwrap();
		store.save(dummy_proof(4)).unwrap();
		store.save(dummy_proof(8)).unwrap();
		assert_eq!(store.balance(), 13);
	}

	#[test]
	fn select_for_spend_is_smallest_first() {
		let mut store = LocalProofStore::new();
		store.save(dummy_proof(8)).unwrap();
		store.save(dummy_proof(1)).unwrap();
		store.save(dummy_proof(4)).unwrap();

		let selected = store.select_for_spend(5).unwrap();
		let amounts: Vec<u64> =
			selected.iter().map(|y| store.proofs.get(y).unwrap().amount).collect();
		assert_eq!(amounts, vec![1, 4]);
	}

	#[test]
	fn select_for_spend_errors_when_insufficient() {
		let mut store = LocalProofStore::new();
		store.save(dummy_proof(1)).unwrap();
		assert!(store.select_for_spend(100).is_err());
	}
}
