//! `swap_htlc` (D, `spec.md` §4.5.1 step 7): verifies the revealed preimage
//! against the HTLC's own locked hash, runs the mint swap G pre-authorized,
//! keeps D's share, and forwards A's share via `blinded_signatures`.

use std::str::FromStr;

use gateway_core::Secret;
use gateway_models::{BlindedSignaturesParams, SwapHtlcParams, SwapHtlcResult, METHOD_BLINDED_SIGNATURES};
use gateway_models::token::TokenEnvelope;
use hex::{DisplayHex, FromHex};
use secp256k1::PublicKey;
use serde_json::Value;

use crate::error::{NodeError, Result};
use crate::service::PeerContext;

pub async fn handle(ctx: &PeerContext, _from: PublicKey, params: Value) -> Result<Value> {
	let params: SwapHtlcParams = serde_json::from_value(params)?;
	let token = TokenEnvelope::decode(&params.htlc_token)?;
	let mut proofs = token.proofs;
	let first = proofs.first().ok_or_else(|| NodeError::Hex("empty HTLC token".to_string()))?;

	let locked_hash = match &first.secret {
		Secret::Htlc(data) => data.data.clone(),
		Secret::P2PK(_) => return Err(NodeError::PaymentHashMismatch),
	};
	let preimage_bytes = Vec::<u8>::from_hex(&params.preimage).map_err(|e| NodeError::Hex(e.to_string()))?;
	let computed_hash = gateway_core::crypto::sha256(&preimage_bytes).to_lower_hex_string();
	if computed_hash != locked_hash {
		return Err(NodeError::PreimageMismatch);
	}

	if let Some(witness) = proofs[0].witness.as_mut() {
		if witness.preimage.is_none() {
			witness.preimage = Some(params.preimage.clone());
		}
	}

	let pending = ctx
		.pending_dealer_fees()
		.take(&params.request_preimage_hash)
		.await
		.ok_or_else(|| NodeError::UnknownPendingRequest(params.request_preimage_hash.clone()))?;

	let signatures = ctx.wallet().swap(proofs, params.blinded_messages.clone()).await?;
	let (dealer_sigs, alice_sigs) = signatures.split_at(pending.output_data.len());
	ctx.wallet().unblind(&pending.output_data, dealer_sigs, true).await?;

	let alice_pubkey =
		PublicKey::from_str(&params.alice_pubkey).map_err(|e| NodeError::Hex(e.to_string()))?;
	let forward = BlindedSignaturesParams {
		preimage_hash: params.request_preimage_hash,
		blinded_signatures: alice_sigs.to_vec(),
	};
	ctx.relay().call(alice_pubkey, METHOD_BLINDED_SIGNATURES, serde_json::to_value(&forward)?).await?;

	Ok(serde_json::to_value(SwapHtlcResult { success: true })?)
}
