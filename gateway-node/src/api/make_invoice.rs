//! `make_invoice` (G, `spec.md` §4.5.1 step 4): G requests a HODL invoice
//! bound to A's `preimage_hash` when the backend supports it, falling back
//! to a plain invoice (keyed by the backend's own `payment_hash` instead,
//! per the §9 ambiguity note) otherwise. No minting happens yet — only
//! `PendingReceiveRequest` bookkeeping, resolved later by
//! `PeerContext::handle_payment_received`.

use gateway_models::{MakeInvoiceParams, MakeInvoiceResult};
use secp256k1::PublicKey;
use serde_json::Value;

use crate::error::Result;
use crate::pending::PendingReceiveRequest;
use crate::service::PeerContext;
use crate::time::now_unix;

pub async fn handle(ctx: &PeerContext, from: PublicKey, params: Value) -> Result<Value> {
	let params: MakeInvoiceParams = serde_json::from_value(params)?;
	let amount_msat = params.amount.saturating_mul(1000);
	let description = format!("gateway receive {}", params.preimage_hash);

	let invoice = if ctx.lightning().supports_hodl_invoices() {
		ctx.lightning().make_hodl_invoice(amount_msat, &params.preimage_hash, &description).await?
	} else {
		ctx.lightning().make_invoice(amount_msat, &description).await?
	};

	ctx.pending_receive_requests()
		.insert(
			invoice.payment_hash.clone(),
			PendingReceiveRequest {
				alice_pubkey: from.to_string(),
				dealer_pubkey: params.dealer_pubkey,
				blinded_messages: params.blinded_messages,
				request_preimage_hash: params.preimage_hash,
				amount: params.amount,
				timestamp: now_unix(),
				expires_at: invoice.expiry_unix,
			},
		)
		.await;

	Ok(serde_json::to_value(MakeInvoiceResult { invoice: invoice.bolt11 })?)
}
