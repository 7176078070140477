//! `blinded_signatures` (A, `spec.md` §4.5.1 step 8): A unblinds D's
//! forwarded share of the swap against its own retained `OutputData` and
//! stores the resulting proofs.

use gateway_models::{BlindedSignaturesParams, BlindedSignaturesResult};
use secp256k1::PublicKey;
use serde_json::Value;

use crate::error::{NodeError, Result};
use crate::service::PeerContext;

pub async fn handle(ctx: &PeerContext, _from: PublicKey, params: Value) -> Result<Value> {
	let params: BlindedSignaturesParams = serde_json::from_value(params)?;
	let pending = ctx
		.pending_htlc_requests()
		.take(&params.preimage_hash)
		.await
		.ok_or_else(|| NodeError::UnknownPendingRequest(params.preimage_hash.clone()))?;

	if pending.output_data.len() != params.blinded_signatures.len() {
		return Err(NodeError::AmountMismatch {
			expected: pending.output_data.len() as u64,
			actual: params.blinded_signatures.len() as u64,
		});
	}

	let proofs = ctx.wallet().unblind(&pending.output_data, &params.blinded_signatures, true).await?;
	let total_amount = proofs.iter().map(|p| p.amount).sum();
	pending.notify.notify_waiters();

	Ok(serde_json::to_value(BlindedSignaturesResult { success: true, total_amount })?)
}
