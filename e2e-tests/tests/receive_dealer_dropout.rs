//! `spec.md` §8 scenario 4: D never answers `swap_htlc` after the HODL
//! invoice is settled. G's pre-minted HTLC sits in `pending_gateway_mints`
//! until its locktime passes, at which point `reclaim_expired_mints` pulls
//! the value back into G's own wallet via the refund branch.

mod common;

use std::time::Duration;

use common::{Harness, DEALER_FEE_SATS};

#[tokio::test(start_paused = true)]
async fn gateway_reclaims_after_dealer_goes_silent() {
	let harness = Harness::new().await;
	let amount_sats = 256u64;
	let funded = amount_sats + DEALER_FEE_SATS;
	harness.fund_gateway(funded).await;

	let handle = harness
		.alice
		.ctx
		.initiate_receive(amount_sats, harness.gateway.pubkey, harness.dealer.pubkey)
		.await
		.unwrap();

	// D answered the fee quote just fine; it only goes dark afterwards.
	harness.disconnect_dealer();

	harness.lightning_network.settle(&handle.preimage_hash, &handle.preimage_hex).await.unwrap();

	// Let the paused clock run past the relay's default 30s call timeout so
	// G's stalled `swap_htlc` call to D gives up.
	tokio::time::sleep(Duration::from_secs(31)).await;

	assert!(harness.gateway.ctx.pending_gateway_mints().contains(&handle.preimage_hash).await);
	assert_eq!(harness.gateway.ctx.wallet().balance().await, 0);

	// The HTLC's locktime is the invoice's real wall-clock expiry
	// (`now + 24h`); `start_paused` only advances Tokio's virtual timers, not
	// `SystemTime::now`, so the mock mint's own clock must be fast-forwarded
	// too or it rejects the refund swap as pre-locktime.
	let reclaim_now = gateway_node::now_unix() + 90_000;
	harness.mint.set_now(reclaim_now);
	harness.gateway.ctx.reclaim_expired_mints(reclaim_now).await.unwrap();

	assert!(!harness.gateway.ctx.pending_gateway_mints().contains(&handle.preimage_hash).await);
	assert_eq!(harness.gateway.ctx.wallet().balance().await, funded);
}
