//! `spec.md` §8 scenario 6: a SIG_ALL pre-authorization covers a specific
//! output list. Swapping in a freshly generated output of the same
//! denomination after signing must still be rejected by the mint, since the
//! signed digest binds the exact output points, not just their amounts.

mod common;

use common::{fund, Harness};
use gateway_core::crypto::sha256;
use gateway_core::{generate_outputs, to_blinded_messages, LockSpec, SigFlag};
use gateway_mint_client::{MintClient, MintError};
use hex::DisplayHex;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

#[tokio::test]
async fn swapping_a_substituted_output_invalidates_the_sig_all_signature() {
	let harness = Harness::new().await;
	let amount_sats = 64u64;
	fund(harness.gateway.ctx.wallet(), &harness.mint, amount_sats).await;

	let mut preimage_bytes = [0u8; 32];
	rand::thread_rng().fill_bytes(&mut preimage_bytes);
	let preimage_hex = preimage_bytes.to_lower_hex_string();
	let preimage_hash_hex = sha256(&preimage_bytes).to_lower_hex_string();

	let gateway_pubkey_hex = harness.gateway.ctx.wallet().pubkey_hex();
	let htlc_lock = LockSpec::Htlc {
		preimage_hash_hex,
		pubkeys: vec![gateway_pubkey_hex.clone()],
		sigflag: SigFlag::SigAll,
		n_sigs: Some(1),
		locktime: Some(u64::MAX),
		refund: vec![gateway_pubkey_hex],
		n_sigs_refund: Some(1),
	};

	let (inputs, change) = harness.gateway.ctx.wallet().select_and_sign_inputs(amount_sats).await.unwrap();
	assert_eq!(change, 0);
	let (_id, htlc_outputs) = harness.gateway.ctx.wallet().prepare_locked_outputs(amount_sats, &htlc_lock).await.unwrap();
	let mint_outputs = to_blinded_messages(&htlc_outputs);
	let signatures = harness.gateway.ctx.wallet().swap(inputs, mint_outputs).await.unwrap();
	let mut htlc_proofs = harness.gateway.ctx.wallet().unblind(&htlc_outputs, &signatures, false).await.unwrap();

	let secp = Secp256k1::new();
	let stranger_sk = SecretKey::new(&mut rand::thread_rng());
	let stranger_pk = PublicKey::from_secret_key(&secp, &stranger_sk);
	let downstream_lock = LockSpec::P2PK {
		pubkeys: vec![stranger_pk.to_string()],
		sigflag: SigFlag::SigInputs,
		n_sigs: None,
		locktime: None,
		refund: vec![],
	};
	let downstream_outputs =
		generate_outputs(&secp, harness.mint.keyset_id(), amount_sats, &downstream_lock).unwrap();
	let downstream_blinded = to_blinded_messages(&downstream_outputs);

	let secrets: Vec<_> = htlc_proofs.iter().map(|p| p.secret.clone()).collect();
	let witness = harness.gateway.ctx.wallet().sign_sig_all(&secrets, &downstream_blinded, Some(preimage_hex));
	htlc_proofs[0].witness = Some(witness);

	// Same total amount, freshly generated blinded points: amount balance
	// still holds, but the SIG_ALL digest no longer matches.
	let tampered_outputs =
		generate_outputs(&secp, harness.mint.keyset_id(), amount_sats, &downstream_lock).unwrap();
	let tampered_blinded = to_blinded_messages(&tampered_outputs);

	let err = harness.mint.swap(htlc_proofs.clone(), tampered_blinded).await.unwrap_err();
	assert!(matches!(err, MintError::SignatureInvalid));

	// The untampered swap the signature actually authorized still succeeds,
	// confirming the rejection above was specific to the substitution.
	harness.mint.swap(htlc_proofs, downstream_blinded).await.unwrap();
}
