//! `request_dealer_fee` (D, `spec.md` §4.5.1 step 2): D quotes its flat fee
//! for a requested receive amount and allocates blinded outputs locked to
//! its own pubkey, retained until `swap_htlc` arrives.

use gateway_core::{to_blinded_messages, LockSpec, SigFlag};
use gateway_models::{RequestDealerFeeParams, RequestDealerFeeResult};
use secp256k1::PublicKey;
use serde_json::Value;

use crate::error::Result;
use crate::pending::PendingDealerFee;
use crate::service::PeerContext;
use crate::time::now_unix;

pub async fn handle(ctx: &PeerContext, from: PublicKey, params: Value) -> Result<Value> {
	let params: RequestDealerFeeParams = serde_json::from_value(params)?;
	let fee_amount = ctx.config().dealer_fee_sats.unwrap_or(0);

	let lock = LockSpec::P2PK {
		pubkeys: vec![ctx.wallet().pubkey_hex()],
		sigflag: SigFlag::SigInputs,
		n_sigs: None,
		locktime: None,
		refund: vec![],
	};
	let (_keyset_id, output_data) = ctx.wallet().prepare_locked_outputs(fee_amount, &lock).await?;
	let blinded_messages = to_blinded_messages(&output_data);

	let now = now_unix();
	ctx.pending_dealer_fees()
		.insert(
			params.preimage_hash,
			PendingDealerFee {
				output_data,
				amount: fee_amount,
				alice_pubkey: from.to_string(),
				timestamp: now,
				expires_at: now + ctx.config().default_locktime_secs,
			},
		)
		.await;

	Ok(serde_json::to_value(RequestDealerFeeResult { fee_amount, blinded_messages })?)
}
