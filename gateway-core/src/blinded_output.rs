//! Splits an amount into mint-acceptable power-of-two denominations and
//! builds the blinded outputs a peer sends to the mint to request proofs
//! locked under a given spending condition.

use secp256k1::{Secp256k1, SecretKey};

use crate::crypto::blind_message;
use crate::error::Result;
use crate::proof::BlindedMessage;
use crate::secret::{Secret, SigFlag};

/// Decomposes `amount` into its standard power-of-two Cashu denominations,
/// largest first. Zero decomposes to the empty list.
pub fn split_amount(amount: u64) -> Vec<u64> {
	let mut denominations = Vec::new();
	let mut remaining = amount;
	let mut bit = 1u64;
	while remaining > 0 {
		if remaining & 1 == 1 {
			denominations.push(bit);
		}
		remaining >>= 1;
		bit <<= 1;
	}
	denominations.reverse();
	denominations
}

/// Describes the spending condition new outputs should be locked under.
#[derive(Debug, Clone)]
pub enum LockSpec {
	P2PK {
		pubkeys: Vec<String>,
		sigflag: SigFlag,
		n_sigs: Option<u64>,
		locktime: Option<u64>,
		refund: Vec<String>,
	},
	Htlc {
		preimage_hash_hex: String,
		pubkeys: Vec<String>,
		sigflag: SigFlag,
		n_sigs: Option<u64>,
		locktime: Option<u64>,
		refund: Vec<String>,
		n_sigs_refund: Option<u64>,
	},
}

impl LockSpec {
	fn build_secret(&self) -> Secret {
		match self {
			LockSpec::P2PK { pubkeys, sigflag, n_sigs, locktime, refund } => Secret::new_p2pk(
				pubkeys[0].clone(),
				// `data` already carries pubkeys[0]; the tag only needs the rest.
				build_tags(&pubkeys[1..], *sigflag, *n_sigs, *locktime, refund, None),
			),
			LockSpec::Htlc { preimage_hash_hex, pubkeys, sigflag, n_sigs, locktime, refund, n_sigs_refund } => {
				Secret::new_htlc(
					preimage_hash_hex.clone(),
					// `data` is the preimage hash, not a pubkey; the full list belongs in the tag.
					build_tags(pubkeys, *sigflag, *n_sigs, *locktime, refund, *n_sigs_refund),
				)
			}
		}
	}
}

fn build_tags(
	pubkeys: &[String],
	sigflag: SigFlag,
	n_sigs: Option<u64>,
	locktime: Option<u64>,
	refund: &[String],
	n_sigs_refund: Option<u64>,
) -> Vec<Vec<String>> {
	let mut tags = Vec::new();
	if sigflag == SigFlag::SigAll {
		tags.push(vec!["sigflag".to_string(), "SIG_ALL".to_string()]);
	}
	if !pubkeys.is_empty() {
		let mut tag = vec!["pubkeys".to_string()];
		tag.extend(pubkeys.iter().cloned());
		tags.push(tag);
	}
	if let Some(n) = n_sigs {
		tags.push(vec!["n_sigs".to_string(), n.to_string()]);
	}
	if let Some(lt) = locktime {
		tags.push(vec!["locktime".to_string(), lt.to_string()]);
	}
	if !refund.is_empty() {
		let mut tag = vec!["refund".to_string()];
		tag.extend(refund.iter().cloned());
		tags.push(tag);
	}
	if let Some(n) = n_sigs_refund {
		tags.push(vec!["n_sigs_refund".to_string(), n.to_string()]);
	}
	tags
}

/// A single blinded output awaiting the mint's signature, bundled with the
/// secret/blinding-factor needed to unblind the response.
pub struct OutputData {
	pub blinded_message: BlindedMessage,
	pub blinding_factor: SecretKey,
	pub secret: Secret,
}

/// Generates the set of blinded outputs needed to request `amount` worth of
/// proofs under `lock`, one output per power-of-two denomination.
pub fn generate_outputs(
	secp: &Secp256k1<secp256k1::All>,
	keyset_id: &str,
	amount: u64,
	lock: &LockSpec,
) -> Result<Vec<OutputData>> {
	split_amount(amount)
		.into_iter()
		.map(|denomination| {
			let secret = lock.build_secret();
			let blinded = blind_message(secp, &secret.canonical_bytes())?;
			Ok(OutputData {
				blinded_message: BlindedMessage {
					id: keyset_id.to_string(),
					amount: denomination,
					b: blinded.blinded_point,
				},
				blinding_factor: blinded.blinding_factor,
				secret,
			})
		})
		.collect()
}

/// Extracts the blinded-message list to send to the mint, preserving order.
pub fn to_blinded_messages(outputs: &[OutputData]) -> Vec<BlindedMessage> {
	outputs.iter().map(|o| o.blinded_message.clone()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn split_amount_matches_binary_decomposition() {
		assert_eq!(split_amount(0), Vec::<u64>::new());
		assert_eq!(split_amount(1), vec![1]);
		assert_eq!(split_amount(13), vec![8, 4, 1]);
		assert_eq!(split_amount(64), vec![64]);
	}

	#[test]
	fn generate_outputs_one_per_denomination() {
		let secp = Secp256k1::new();
		let lock = LockSpec::P2PK {
			pubkeys: vec!["02".to_string() + &"11".repeat(32)],
			sigflag: SigFlag::SigInputs,
			n_sigs: None,
			locktime: None,
			refund: vec![],
		};
		let outputs = generate_outputs(&secp, "00deadbeef123456", 13, &lock).unwrap();
		assert_eq!(outputs.len(), 3);
		let amounts: Vec<u64> = outputs.iter().map(|o| o.blinded_message.amount).collect();
		assert_eq!(amounts, vec![8, 4, 1]);
	}

	#[test]
	fn htlc_lock_carries_preimage_hash_and_refund_tags() {
		let secp = Secp256k1::new();
		let lock = LockSpec::Htlc {
			preimage_hash_hex: "cc".repeat(32),
			pubkeys: vec!["02".to_string() + &"22".repeat(32)],
			sigflag: SigFlag::SigInputs,
			n_sigs: None,
			locktime: Some(1000),
			refund: vec!["02".to_string() + &"33".repeat(32)],
			n_sigs_refund: None,
		};
		let outputs = generate_outputs(&secp, "00deadbeef123456", 2, &lock).unwrap();
		let tags = outputs[0].secret.tags();
		assert_eq!(tags.locktime().unwrap(), Some(1000));
		assert_eq!(tags.refund_pubkeys().len(), 1);
	}

	#[test]
	fn sig_all_lock_sets_sigflag_tag() {
		let secp = Secp256k1::new();
		let lock = LockSpec::Htlc {
			preimage_hash_hex: "dd".repeat(32),
			pubkeys: vec!["02".to_string() + &"44".repeat(32)],
			sigflag: SigFlag::SigAll,
			n_sigs: Some(1),
			locktime: Some(2000),
			refund: vec!["02".to_string() + &"55".repeat(32)],
			n_sigs_refund: Some(1),
		};
		let outputs = generate_outputs(&secp, "00deadbeef123456", 1, &lock).unwrap();
		assert_eq!(outputs[0].secret.tags().sigflag(), SigFlag::SigAll);
	}

	#[test]
	fn htlc_lock_with_single_signer_still_carries_pubkeys_tag() {
		// HTLC `data` is the preimage hash, not a pubkey, so unlike P2PK the
		// single signer must still land in the `pubkeys` tag or the mint has
		// nothing to check a SIG_ALL signature against.
		let secp = Secp256k1::new();
		let gateway_pubkey = "02".to_string() + &"66".repeat(32);
		let lock = LockSpec::Htlc {
			preimage_hash_hex: "ee".repeat(32),
			pubkeys: vec![gateway_pubkey.clone()],
			sigflag: SigFlag::SigAll,
			n_sigs: Some(1),
			locktime: Some(3000),
			refund: vec![gateway_pubkey.clone()],
			n_sigs_refund: Some(1),
		};
		let outputs = generate_outputs(&secp, "00deadbeef123456", 1, &lock).unwrap();
		assert_eq!(outputs[0].secret.tags().pubkeys(), vec![gateway_pubkey.as_str()]);
	}

	#[test]
	fn p2pk_lock_omits_pubkeys_tag_for_sole_owner() {
		// P2PK's `data` already is pubkeys[0]; a lone owner needs no tag.
		let secp = Secp256k1::new();
		let lock = LockSpec::P2PK {
			pubkeys: vec!["02".to_string() + &"77".repeat(32)],
			sigflag: SigFlag::SigInputs,
			n_sigs: None,
			locktime: None,
			refund: vec![],
		};
		let outputs = generate_outputs(&secp, "00deadbeef123456", 1, &lock).unwrap();
		assert!(outputs[0].secret.tags().pubkeys().is_empty());
	}
}
