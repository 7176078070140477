//! Blind Diffie-Hellman key exchange (BDHKE) primitives and SIG_ALL Schnorr
//! helpers shared by every peer role.
//!
//! The hash-to-curve construction and blind/unblind arithmetic mirror the
//! Cashu NUT-00 reference algorithm: a secret is mapped to a curve point via
//! try-and-increment, blinded with a random scalar before being sent to the
//! mint, and unblinded once the mint's signature comes back.

use secp256k1::{
	Keypair, Message, PublicKey, Scalar, Secp256k1, SecretKey, XOnlyPublicKey, schnorr,
};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const DOMAIN_SEPARATOR: &[u8] = b"Secp256k1_HashToCurve_Cashu_";
const MAX_ITERATIONS: u32 = 1_000_000;

/// Computes `SHA256(data)`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(data);
	hasher.finalize().into()
}

/// Maps an arbitrary secret message to a point `Y` on secp256k1 via
/// try-and-increment, matching the Cashu hash-to-curve domain separator.
pub fn hash_to_curve(secret_bytes: &[u8]) -> Result<PublicKey> {
	let mut hasher = Sha256::new();
	hasher.update(DOMAIN_SEPARATOR);
	hasher.update(secret_bytes);
	let msg_hash: [u8; 32] = hasher.finalize().into();

	for counter in 0..MAX_ITERATIONS {
		let mut candidate = Vec::with_capacity(36);
		candidate.extend_from_slice(&msg_hash);
		candidate.extend_from_slice(&counter.to_le_bytes());
		let point_hash = sha256(&candidate);

		let mut compressed = [0u8; 33];
		compressed[0] = 0x02;
		compressed[1..].copy_from_slice(&point_hash);

		if let Ok(point) = PublicKey::from_slice(&compressed) {
			return Ok(point);
		}
	}
	Err(Error::HashToCurveExhausted)
}

/// The blinding factor `r` and resulting blinded point `B_ = Y + rG` for one
/// output.
pub struct Blinded {
	pub blinding_factor: SecretKey,
	pub blinded_point: PublicKey,
}

/// Blinds `secret_bytes` with a freshly generated blinding factor.
pub fn blind_message(secp: &Secp256k1<secp256k1::All>, secret_bytes: &[u8]) -> Result<Blinded> {
	blind_message_with_factor(secp, secret_bytes, SecretKey::new(&mut rand::thread_rng()))
}

/// Blinds `secret_bytes` with a caller-supplied blinding factor. Used by
/// tests that need deterministic blinding.
pub fn blind_message_with_factor(
	secp: &Secp256k1<secp256k1::All>,
	secret_bytes: &[u8],
	blinding_factor: SecretKey,
) -> Result<Blinded> {
	let y = hash_to_curve(secret_bytes)?;
	let r_point = PublicKey::from_secret_key(secp, &blinding_factor);
	let blinded_point = y.combine(&r_point)?;
	Ok(Blinded { blinding_factor, blinded_point })
}

/// Unblinds a mint's signature `C_` into the final signature `C = C_ - rK`
/// where `K` is the mint's public key for the keyset/amount.
pub fn unblind_signature(
	secp: &Secp256k1<secp256k1::All>,
	blinded_signature: &PublicKey,
	blinding_factor: &SecretKey,
	mint_pubkey: &PublicKey,
) -> Result<PublicKey> {
	let scalar = Scalar::from(*blinding_factor);
	let r_k = mint_pubkey.mul_tweak(secp, &scalar)?;
	let r_k_neg = r_k.negate(secp);
	Ok(blinded_signature.combine(&r_k_neg)?)
}

/// Verifies a mint's blind signature against the original secret before it
/// is unblinded, as performed by the mint itself: `C_ = rK + H(secret)`.
pub fn verify_blind_signature(
	secp: &Secp256k1<secp256k1::All>,
	blinded_signature: &PublicKey,
	secret_bytes: &[u8],
	blinding_factor: &SecretKey,
	mint_pubkey: &PublicKey,
) -> Result<bool> {
	let y = hash_to_curve(secret_bytes)?;
	let scalar = Scalar::from(*blinding_factor);
	let r_k = mint_pubkey.mul_tweak(secp, &scalar)?;
	let reconstructed = y.combine(&r_k)?;
	Ok(reconstructed == *blinded_signature)
}

/// Reduces a possibly-33-byte compressed public key to its x-only form, as
/// required before Schnorr signing/verification (BIP340 keys carry no
/// parity byte).
pub fn to_x_only(pubkey: &PublicKey) -> XOnlyPublicKey {
	pubkey.x_only_public_key().0
}

/// Signs `message` (already hashed to 32 bytes) with a BIP340 Schnorr
/// signature under `secret_key`.
pub fn sign_schnorr(
	secp: &Secp256k1<secp256k1::All>,
	message: &[u8; 32],
	secret_key: &SecretKey,
) -> schnorr::Signature {
	let keypair = Keypair::from_secret_key(secp, secret_key);
	let msg = Message::from_digest(*message);
	secp.sign_schnorr(&msg, &keypair)
}

/// Verifies a BIP340 Schnorr signature over `message` against an x-only
/// public key.
pub fn verify_schnorr(
	secp: &Secp256k1<secp256k1::All>,
	signature: &schnorr::Signature,
	message: &[u8; 32],
	pubkey: &XOnlyPublicKey,
) -> bool {
	let msg = Message::from_digest(*message);
	secp.verify_schnorr(signature, &msg, pubkey).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hash_to_curve_is_deterministic() {
		let a = hash_to_curve(b"abc").unwrap();
		let b = hash_to_curve(b"abc").unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn hash_to_curve_varies_with_input() {
		let a = hash_to_curve(b"abc").unwrap();
		let b = hash_to_curve(b"abd").unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn blind_unblind_round_trip() {
		let secp = Secp256k1::new();
		let mint_sk = SecretKey::new(&mut rand::thread_rng());
		let mint_pk = PublicKey::from_secret_key(&secp, &mint_sk);

		let secret = b"test-secret-message";
		let blinded = blind_message(&secp, secret).unwrap();

		// mint signs the blinded point: C_ = kB_
		let scalar = Scalar::from(mint_sk);
		let c_blind = blinded.blinded_point.mul_tweak(&secp, &scalar).unwrap();

		let unblinded =
			unblind_signature(&secp, &c_blind, &blinded.blinding_factor, &mint_pk).unwrap();

		// C should equal kY
		let y = hash_to_curve(secret).unwrap();
		let expected = y.mul_tweak(&secp, &scalar).unwrap();
		assert_eq!(unblinded, expected);
	}

	#[test]
	fn schnorr_sign_and_verify_round_trip() {
		let secp = Secp256k1::new();
		let sk = SecretKey::new(&mut rand::thread_rng());
		let pk = PublicKey::from_secret_key(&secp, &sk);
		let xonly = to_x_only(&pk);

		let message = sha256(b"sig_all message body");
		let sig = sign_schnorr(&secp, &message, &sk);
		assert!(verify_schnorr(&secp, &sig, &message, &xonly));

		let other_message = sha256(b"a different message");
		assert!(!verify_schnorr(&secp, &sig, &other_message, &xonly));
	}
}
