//! Spending-condition verification for a swap request, as the real mint
//! would perform it. Used by the in-memory test mint so the SIG_ALL/HTLC
//! round-trip tests exercise real verification rather than a stub that
//! always succeeds.

use gateway_core::sigall::sig_all_message;
use gateway_core::{BlindedMessage, Proof, SigFlag};
use hex::FromHex;
use secp256k1::schnorr::Signature;
use secp256k1::{PublicKey, Secp256k1, XOnlyPublicKey};

use crate::error::{MintError, Result};

fn parse_pubkey(hex_str: &str) -> Result<PublicKey> {
	let bytes = Vec::<u8>::from_hex(hex_str).map_err(|e| MintError::InvalidWitness(e.to_string()))?;
	PublicKey::from_slice(&bytes).map_err(|e| MintError::InvalidWitness(e.to_string()))
}

fn parse_signature(hex_str: &str) -> Result<Signature> {
	let bytes = Vec::<u8>::from_hex(hex_str).map_err(|e| MintError::InvalidWitness(e.to_string()))?;
	Signature::from_slice(&bytes).map_err(|e| MintError::InvalidWitness(e.to_string()))
}

fn count_valid_signatures(
	secp: &Secp256k1<secp256k1::All>,
	signatures: &[String],
	pubkeys: &[XOnlyPublicKey],
	message: &[u8; 32],
) -> Result<usize> {
	let mut satisfied = std::collections::HashSet::new();
	for sig_hex in signatures {
		let sig = parse_signature(sig_hex)?;
		for (idx, pk) in pubkeys.iter().enumerate() {
			if satisfied.contains(&idx) {
				continue;
			}
			if gateway_core::crypto::verify_schnorr(secp, &sig, message, pk) {
				satisfied.insert(idx);
				break;
			}
		}
	}
	Ok(satisfied.len())
}

/// Validates the full set of `inputs` against `outputs`: amount balance and
/// every input's spending condition. `now` is a unix timestamp used for
/// locktime/refund evaluation.
pub fn verify_swap_request(
	secp: &Secp256k1<secp256k1::All>,
	inputs: &[Proof],
	outputs: &[BlindedMessage],
	now: u64,
) -> Result<()> {
	if inputs.is_empty() {
		return Err(MintError::InvalidWitness("swap with no inputs".to_string()));
	}

	let total_in: u64 = inputs.iter().map(|p| p.amount).sum();
	let total_out: u64 = outputs.iter().map(|o| o.amount).sum();
	if total_in != total_out {
		return Err(MintError::AmountMismatch { inputs: total_in, outputs: total_out });
	}

	let secrets: Vec<_> = inputs.iter().map(|p| p.secret.clone()).collect();
	let sig_all = inputs[0].secret.tags().sigflag() == SigFlag::SigAll;
	let sig_all_msg = sig_all_message(&secrets, outputs);
	let shared_witness = if sig_all { inputs[0].witness.clone() } else { None };

	for proof in inputs {
		verify_one(secp, proof, sig_all, &sig_all_msg, shared_witness.as_ref(), now)?;
	}
	Ok(())
}

fn verify_one(
	secp: &Secp256k1<secp256k1::All>,
	proof: &Proof,
	sig_all: bool,
	sig_all_msg: &[u8; 32],
	shared_witness: Option<&gateway_core::Witness>,
	now: u64,
) -> Result<()> {
	let tags = proof.secret.tags();
	let own_witness = proof.witness.as_ref();
	let witness = if sig_all { shared_witness } else { own_witness };

	let own_secret_msg = gateway_core::crypto::sha256(&proof.secret.canonical_bytes());
	let message = if sig_all { sig_all_msg } else { &own_secret_msg };

	let locktime = tags.locktime()?;
	let locktime_passed = locktime.map(|lt| now >= lt).unwrap_or(false);

	match &proof.secret {
		gateway_core::Secret::Htlc(data) => {
			let preimage_hash = Vec::<u8>::from_hex(&data.data)
				.map_err(|e| MintError::InvalidWitness(e.to_string()))?;

			let preimage_ok = witness
				.and_then(|w| w.preimage.as_deref())
				.map(|pi| {
					Vec::<u8>::from_hex(pi)
						.ok()
						.map(|bytes| gateway_core::crypto::sha256(&bytes).to_vec() == preimage_hash)
						.unwrap_or(false)
				})
				.unwrap_or(false);

			if preimage_ok {
				// Unlike P2PK, `data` here is the preimage hash, not a
				// pubkey: the only signer requirement comes from an
				// explicit `pubkeys` tag, if any.
				verify_signature_requirement(
					secp,
					&tags.pubkeys(),
					&[],
					tags.n_sigs()?,
					witness,
					message,
				)
			} else if locktime_passed {
				verify_signature_requirement(
					secp,
					&tags.refund_pubkeys(),
					&[],
					tags.n_sigs_refund()?,
					witness,
					message,
				)
			} else {
				Err(MintError::InvalidWitness("HTLC preimage missing or mismatched".to_string()))
			}
		}
		gateway_core::Secret::P2PK(data) => verify_signature_requirement(
			secp,
			&tags.pubkeys(),
			&[data.data.as_str()],
			tags.n_sigs()?,
			witness,
			message,
		),
	}
}

/// `default_pubkey` covers the case where the secret's own `data` field is
/// the sole required signer (no explicit `pubkeys` tag); `extra_pubkeys`
/// from the `pubkeys`/`refund` tag are appended. An empty required-pubkey
/// set (refund with no tag, post-locktime) means anyone may spend.
fn verify_signature_requirement(
	secp: &Secp256k1<secp256k1::All>,
	tagged_pubkeys: &[&str],
	default_pubkey: &[&str],
	n_sigs: Option<u64>,
	witness: Option<&gateway_core::Witness>,
	message: &[u8; 32],
) -> Result<()> {
	let mut required: Vec<&str> = default_pubkey.to_vec();
	required.extend(tagged_pubkeys.iter().copied());

	if required.is_empty() {
		return Ok(());
	}

	let required_pubkeys: Vec<XOnlyPublicKey> = required
		.iter()
		.map(|hex_str| parse_pubkey(hex_str).map(|pk| pk.x_only_public_key().0))
		.collect::<Result<_>>()?;

	let signatures = witness.map(|w| w.signatures.as_slice()).unwrap_or(&[]);
	let needed = n_sigs.unwrap_or(1) as usize;

	let satisfied = count_valid_signatures(secp, signatures, &required_pubkeys, message)?;
	if satisfied < needed {
		return Err(MintError::SignatureInvalid);
	}
	Ok(())
}
