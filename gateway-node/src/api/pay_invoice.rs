//! `pay_invoice` (G, `spec.md` §4.5.2 step 3): the send-flow counterpart to
//! the receive flow's `swap_htlc` — G is both the payer of the Lightning
//! invoice and the party that settles the mint-side HTLC.

use gateway_core::to_blinded_messages;
use gateway_lightning_client::decode_invoice;
use gateway_models::token::TokenEnvelope;
use gateway_models::{PayInvoiceParams, PayInvoiceResult};
use secp256k1::PublicKey;
use serde_json::Value;

use crate::error::{NodeError, Result};
use crate::service::PeerContext;

pub async fn handle(ctx: &PeerContext, _from: PublicKey, params: Value) -> Result<Value> {
	let params: PayInvoiceParams = serde_json::from_value(params)?;
	let decoded = decode_invoice(&params.invoice)?;
	let token = TokenEnvelope::decode(&params.token)?;

	let first = token.proofs.first().ok_or_else(|| NodeError::Hex("empty HTLC token".to_string()))?;
	let locked_hash = match &first.secret {
		gateway_core::Secret::Htlc(data) => data.data.clone(),
		gateway_core::Secret::P2PK(_) => return Err(NodeError::PaymentHashMismatch),
	};
	if locked_hash != decoded.payment_hash {
		return Err(NodeError::PaymentHashMismatch);
	}

	let payment = ctx.lightning().pay_invoice(&params.invoice).await?;

	let mut proofs = token.proofs;
	ctx.wallet().sign_htlc_inputs(&mut proofs, &payment.preimage);
	let total: u64 = proofs.iter().map(|p| p.amount).sum();

	let change_lock = ctx.wallet().self_lock();
	let (_keyset_id, outputs) = ctx.wallet().prepare_locked_outputs(total, &change_lock).await?;
	let blinded = to_blinded_messages(&outputs);
	let signatures = ctx.wallet().swap(proofs, blinded).await?;
	ctx.wallet().unblind(&outputs, &signatures, true).await?;

	Ok(serde_json::to_value(PayInvoiceResult {
		preimage: payment.preimage,
		fees_paid: payment.fees_paid_msat / 1000,
	})?)
}
