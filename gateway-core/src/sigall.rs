//! SIG_ALL message construction and signing. When every input of a swap
//! carries `sigflag = SIG_ALL`, a single Schnorr signature covers the
//! concatenation of all input secrets and all output blinded points, and is
//! attached only to the first input's witness.

use hex::DisplayHex;
use secp256k1::{PublicKey, Secp256k1, SecretKey, XOnlyPublicKey, schnorr};

use crate::crypto::{sha256, sign_schnorr, verify_schnorr};
use crate::proof::BlindedMessage;
use crate::secret::Secret;

/// Builds the SIG_ALL digest: `SHA256(secret_0 || … || secret_n || B_0 || … || B_m)`,
/// where each secret contributes its canonical stringified bytes and each
/// output contributes its blinded point's lowercase compressed-hex encoding.
pub fn sig_all_message(secrets: &[Secret], outputs: &[BlindedMessage]) -> [u8; 32] {
	let mut buf = Vec::new();
	for secret in secrets {
		buf.extend_from_slice(&secret.canonical_bytes());
	}
	for output in outputs {
		buf.extend_from_slice(output.b.serialize().to_lower_hex_string().as_bytes());
	}
	sha256(&buf)
}

/// Signs the SIG_ALL digest with the spending key. The resulting signature
/// is attached to the first input's witness only; every other input is
/// submitted with an empty witness.
pub fn sign_sig_all(
	secp: &Secp256k1<secp256k1::All>,
	secrets: &[Secret],
	outputs: &[BlindedMessage],
	secret_key: &SecretKey,
) -> schnorr::Signature {
	let message = sig_all_message(secrets, outputs);
	sign_schnorr(secp, &message, secret_key)
}

/// Verifies a SIG_ALL signature as the mint would: recompute the digest
/// from the submitted inputs/outputs and check it against the locking
/// pubkey carried in each P2PK/HTLC secret.
pub fn verify_sig_all(
	secp: &Secp256k1<secp256k1::All>,
	secrets: &[Secret],
	outputs: &[BlindedMessage],
	signature: &schnorr::Signature,
	pubkey: &XOnlyPublicKey,
) -> bool {
	let message = sig_all_message(secrets, outputs);
	verify_schnorr(secp, signature, &message, pubkey)
}

/// Convenience wrapper accepting a full compressed pubkey, stripping its
/// parity byte before verification.
pub fn verify_sig_all_compressed(
	secp: &Secp256k1<secp256k1::All>,
	secrets: &[Secret],
	outputs: &[BlindedMessage],
	signature: &schnorr::Signature,
	pubkey: &PublicKey,
) -> bool {
	verify_sig_all(secp, secrets, outputs, signature, &pubkey.x_only_public_key().0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::secret::Secret;
	use rand::thread_rng;

	fn dummy_output(secp: &Secp256k1<secp256k1::All>) -> BlindedMessage {
		let sk = SecretKey::new(&mut thread_rng());
		BlindedMessage { id: "00deadbeef123456".to_string(), amount: 1, b: PublicKey::from_secret_key(secp, &sk) }
	}

	#[test]
	fn sign_then_verify_succeeds() {
		let secp = Secp256k1::new();
		let sk = SecretKey::new(&mut thread_rng());
		let pk = PublicKey::from_secret_key(&secp, &sk);

		let secrets = vec![Secret::new_p2pk(
			pk.to_string(),
			vec![vec!["sigflag".into(), "SIG_ALL".into()]],
		)];
		let outputs = vec![dummy_output(&secp), dummy_output(&secp)];

		let sig = sign_sig_all(&secp, &secrets, &outputs, &sk);
		assert!(verify_sig_all_compressed(&secp, &secrets, &outputs, &sig, &pk));
	}

	#[test]
	fn tampering_with_outputs_invalidates_signature() {
		let secp = Secp256k1::new();
		let sk = SecretKey::new(&mut thread_rng());
		let pk = PublicKey::from_secret_key(&secp, &sk);

		let secrets = vec![Secret::new_p2pk(pk.to_string(), vec![])];
		let outputs = vec![dummy_output(&secp)];
		let sig = sign_sig_all(&secp, &secrets, &outputs, &sk);

		let different_outputs = vec![dummy_output(&secp)];
		assert!(!verify_sig_all_compressed(&secp, &secrets, &different_outputs, &sig, &pk));
	}

	#[test]
	fn wrong_key_fails_verification() {
		let secp = Secp256k1::new();
		let sk = SecretKey::new(&mut thread_rng());
		let pk = PublicKey::from_secret_key(&secp, &sk);
		let other_sk = SecretKey::new(&mut thread_rng());
		let other_pk = PublicKey::from_secret_key(&secp, &other_sk);

		let secrets = vec![Secret::new_p2pk(pk.to_string(), vec![])];
		let outputs = vec![dummy_output(&secp)];
		let sig = sign_sig_all(&secp, &secrets, &outputs, &sk);

		assert!(!verify_sig_all_compressed(&secp, &secrets, &outputs, &sig, &other_pk));
	}
}
