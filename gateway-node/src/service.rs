//! `PeerContext`: the per-process state machine shared by all three roles
//! (`spec.md` §4.5). It answers inbound RPCs uniformly via `RequestHandler`
//! and separately drives G's two reactive paths that no inbound RPC
//! triggers: minting the HTLC once a Lightning payment lands
//! (`handle_payment_received`), and reclaiming it if D never shows up
//! before `locktime` (`reclaim_expired_mints`).

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_core::crypto::sha256;
use gateway_core::{to_blinded_messages, LockSpec, Secret, SigFlag};
use gateway_lightning_client::{decode_invoice, LightningClient, PaymentReceived};
use gateway_messaging::{RelayClient, RequestHandler};
use gateway_models::rpc::{ERROR_METHOD_NOT_FOUND, RpcRequest, RpcResponse};
use gateway_models::token::TokenEnvelope;
use gateway_models::{
	MakeInvoiceParams, MakeInvoiceResult, PayInvoiceParams, PayInvoiceResult, RequestDealerFeeParams,
	RequestDealerFeeResult, SwapHtlcParams, METHOD_BLINDED_SIGNATURES, METHOD_INFO, METHOD_MAKE_INVOICE,
	METHOD_PAY_INVOICE, METHOD_REQUEST_DEALER_FEE, METHOD_SWAP_HTLC,
};
use gateway_wallet::Wallet;
use hex::DisplayHex;
use rand::RngCore;
use secp256k1::PublicKey;
use tokio::sync::{Mutex, Notify};

use crate::api;
use crate::config::Config;
use crate::error::{NodeError, Result};
use crate::pending::{PendingDealerFee, PendingGatewayMint, PendingHtlcRequest, PendingMap, PendingReceiveRequest};
use crate::time::now_unix;
use crate::tracker::ProofStateTracker;

/// Outcome of `initiate_receive` (`spec.md` §4.5.1 steps 1-4): the invoice
/// A's caller still needs to get paid, the key its eventual completion is
/// filed under, and the preimage A generated for it. A is the only party
/// that ever learns this preimage from inside the protocol; surfacing it
/// here is what lets a caller settle a HODL invoice out-of-band when no
/// external payer automatically reveals it (`spec.md` §9).
pub struct ReceiveHandle {
	pub invoice: String,
	pub preimage_hash: String,
	pub preimage_hex: String,
}

pub struct PeerContext {
	config: Config,
	wallet: Arc<Wallet>,
	lightning: Arc<dyn LightningClient>,
	relay: Arc<RelayClient>,
	tracker: ProofStateTracker,
	pending_htlc_requests: PendingMap<PendingHtlcRequest>,
	pending_dealer_fees: PendingMap<PendingDealerFee>,
	pending_receive_requests: PendingMap<PendingReceiveRequest>,
	pending_gateway_mints: PendingMap<PendingGatewayMint>,
	seen_preimages: Mutex<HashSet<String>>,
}

impl PeerContext {
	pub fn new(
		config: Config,
		wallet: Arc<Wallet>,
		lightning: Arc<dyn LightningClient>,
		relay: Arc<RelayClient>,
	) -> Self {
		let tracker = ProofStateTracker::new(wallet.mint().clone());
		PeerContext {
			config,
			wallet,
			lightning,
			relay,
			tracker,
			pending_htlc_requests: PendingMap::new(),
			pending_dealer_fees: PendingMap::new(),
			pending_receive_requests: PendingMap::new(),
			pending_gateway_mints: PendingMap::new(),
			seen_preimages: Mutex::new(HashSet::new()),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn wallet(&self) -> &Arc<Wallet> {
		&self.wallet
	}

	pub fn lightning(&self) -> &Arc<dyn LightningClient> {
		&self.lightning
	}

	pub fn relay(&self) -> &Arc<RelayClient> {
		&self.relay
	}

	pub fn tracker(&self) -> &ProofStateTracker {
		&self.tracker
	}

	pub fn pending_htlc_requests(&self) -> &PendingMap<PendingHtlcRequest> {
		&self.pending_htlc_requests
	}

	pub fn pending_dealer_fees(&self) -> &PendingMap<PendingDealerFee> {
		&self.pending_dealer_fees
	}

	pub fn pending_receive_requests(&self) -> &PendingMap<PendingReceiveRequest> {
		&self.pending_receive_requests
	}

	pub fn pending_gateway_mints(&self) -> &PendingMap<PendingGatewayMint> {
		&self.pending_gateway_mints
	}

	/// G's reactive half of the receive flow (`spec.md` §4.5.1 steps 5-6):
	/// triggered once per unique preimage by the lightning notification
	/// loop in `main.rs`. Mints the HTLC-locked multi-proof token via a
	/// self-swap, attaches a SIG_ALL pre-authorization for D's subsequent
	/// `swap_htlc`, and forwards it.
	pub async fn handle_payment_received(&self, notification: PaymentReceived) -> Result<()> {
		{
			let mut seen = self.seen_preimages.lock().await;
			if !seen.insert(notification.preimage.clone()) {
				log::debug!("duplicate payment_received for preimage, ignoring");
				return Ok(());
			}
		}

		let pending = match self.pending_receive_requests.take(&notification.payment_hash).await {
			Some(p) => p,
			None => {
				log::warn!("payment_received for unknown payment_hash {}", notification.payment_hash);
				return Ok(());
			}
		};

		let dealer_pubkey =
			PublicKey::from_str(&pending.dealer_pubkey).map_err(|e| NodeError::Hex(e.to_string()))?;

		let htlc_lock = LockSpec::Htlc {
			preimage_hash_hex: notification.payment_hash.clone(),
			pubkeys: vec![self.wallet.pubkey_hex()],
			sigflag: SigFlag::SigAll,
			n_sigs: Some(1),
			locktime: Some(pending.expires_at),
			refund: vec![self.wallet.pubkey_hex()],
			n_sigs_refund: Some(1),
		};

		let (inputs, change) = self.wallet.select_and_sign_inputs(pending.amount).await?;
		let (_keyset_id, htlc_outputs) = self.wallet.prepare_locked_outputs(pending.amount, &htlc_lock).await?;
		let change_lock = self.wallet.self_lock();
		let (_keyset_id, change_outputs) = if change > 0 {
			self.wallet.prepare_locked_outputs(change, &change_lock).await?
		} else {
			(String::new(), Vec::new())
		};

		let mut mint_outputs = to_blinded_messages(&htlc_outputs);
		mint_outputs.extend(to_blinded_messages(&change_outputs));

		let signatures = self.wallet.swap(inputs, mint_outputs).await?;
		let (htlc_sigs, change_sigs) = signatures.split_at(htlc_outputs.len());

		let mut htlc_proofs = self.wallet.unblind(&htlc_outputs, htlc_sigs, false).await?;
		if !change_outputs.is_empty() {
			self.wallet.unblind(&change_outputs, change_sigs, true).await?;
		}

		let secrets: Vec<Secret> = htlc_proofs.iter().map(|p| p.secret.clone()).collect();
		let witness =
			self.wallet.sign_sig_all(&secrets, &pending.blinded_messages, Some(notification.preimage.clone()));
		htlc_proofs[0].witness = Some(witness);

		self.pending_gateway_mints
			.insert(
				notification.payment_hash.clone(),
				PendingGatewayMint {
					htlc_proofs: htlc_proofs.clone(),
					amount: pending.amount,
					timestamp: now_unix(),
					expires_at: pending.expires_at,
				},
			)
			.await;

		let token = self.wallet.encode_token(&self.config.mint_url, "sat", htlc_proofs);
		let swap_params = SwapHtlcParams {
			htlc_token: token.encode(),
			blinded_messages: pending.blinded_messages,
			request_preimage_hash: pending.request_preimage_hash,
			preimage: notification.preimage,
			alice_pubkey: pending.alice_pubkey,
		};
		self.relay.call(dealer_pubkey, METHOD_SWAP_HTLC, serde_json::to_value(&swap_params)?).await?;
		Ok(())
	}

	/// G's reclaim path (`spec.md` §4.5.1 edge cases, §8 scenario 4): once a
	/// minted-but-unswapped HTLC passes its `locktime`, G reclaims the value
	/// into fresh outputs of its own via the refund branch of the same
	/// SIG_ALL lock (no preimage attached).
	pub async fn reclaim_expired_mints(&self, now: u64) -> Result<()> {
		for (payment_hash, pending) in self.pending_gateway_mints.drain_expired(now).await {
			let secrets: Vec<Secret> = pending.htlc_proofs.iter().map(|p| p.secret.clone()).collect();
			let change_lock = self.wallet.self_lock();
			let (_keyset_id, outputs) = self.wallet.prepare_locked_outputs(pending.amount, &change_lock).await?;
			let blinded = to_blinded_messages(&outputs);

			let witness = self.wallet.sign_sig_all(&secrets, &blinded, None);
			let mut proofs = pending.htlc_proofs;
			proofs[0].witness = Some(witness);

			let signatures = self.wallet.swap(proofs, blinded.clone()).await?;
			self.wallet.unblind(&outputs, &signatures, true).await?;
			log::info!("reclaimed expired gateway mint for payment_hash={payment_hash}");
		}
		Ok(())
	}

	/// A's half of the receive flow (`spec.md` §4.5.1 steps 1-4): quotes D's
	/// fee, builds A's own `N`-sat P2PK outputs, and asks G for an invoice
	/// covering both. Returns once G has replied with the invoice; the
	/// caller pays it out-of-band and then calls `await_receive` to block
	/// until D's forwarded `blinded_signatures` lands.
	pub async fn initiate_receive(
		&self,
		amount: u64,
		gateway_pubkey: PublicKey,
		dealer_pubkey: PublicKey,
	) -> Result<ReceiveHandle> {
		let mut preimage_bytes = [0u8; 32];
		rand::thread_rng().fill_bytes(&mut preimage_bytes);
		let preimage_hex = preimage_bytes.to_lower_hex_string();
		let preimage_hash = sha256(&preimage_bytes).to_lower_hex_string();

		let fee_params = RequestDealerFeeParams { preimage_hash: preimage_hash.clone(), amount };
		let fee_value = self.relay.call(dealer_pubkey, METHOD_REQUEST_DEALER_FEE, serde_json::to_value(&fee_params)?).await?;
		let fee: RequestDealerFeeResult = serde_json::from_value(fee_value)?;

		let self_lock = self.wallet.self_lock();
		let (_keyset_id, output_data) = self.wallet.prepare_locked_outputs(amount, &self_lock).await?;
		let m_a = to_blinded_messages(&output_data);

		let now = now_unix();
		self.pending_htlc_requests
			.insert(
				preimage_hash.clone(),
				PendingHtlcRequest {
					output_data,
					amount,
					timestamp: now,
					expires_at: now + self.config.default_locktime_secs,
					notify: Arc::new(Notify::new()),
				},
			)
			.await;

		let mut blinded_messages = fee.blinded_messages;
		blinded_messages.extend(m_a);
		let make_invoice_params = MakeInvoiceParams {
			amount: amount + fee.fee_amount,
			preimage_hash: preimage_hash.clone(),
			blinded_messages,
			dealer_pubkey: dealer_pubkey.to_string(),
		};
		let invoice_value = self
			.relay
			.call(gateway_pubkey, METHOD_MAKE_INVOICE, serde_json::to_value(&make_invoice_params)?)
			.await?;
		let invoice: MakeInvoiceResult = serde_json::from_value(invoice_value)?;

		Ok(ReceiveHandle { invoice: invoice.invoice, preimage_hash, preimage_hex })
	}

	/// Blocks until D's `blinded_signatures` call resolves the
	/// `PendingHtlcRequest` `initiate_receive` filed, or `timeout` elapses.
	/// Safe to call even if the entry already resolved between
	/// `initiate_receive` returning and this call starting, since a missing
	/// entry is itself the success signal.
	pub async fn await_receive(&self, preimage_hash: &str, timeout: Duration) -> Result<u64> {
		let notify = match self.pending_htlc_requests.get(preimage_hash).await {
			Some(pending) => pending.notify,
			None => return Ok(self.wallet.balance().await),
		};

		if tokio::time::timeout(timeout, notify.notified()).await.is_err() {
			return Err(NodeError::UnknownPendingRequest(preimage_hash.to_string()));
		}
		Ok(self.wallet.balance().await)
	}

	/// A's half of the send flow (`spec.md` §4.5.2 steps 1-2): decodes the
	/// invoice, builds a single-party HTLC token for `amount_sat` locked to
	/// the invoice's own `payment_hash`, and asks `gateway_pubkey` to pay it.
	pub async fn initiate_send(
		&self,
		bolt11: &str,
		gateway_pubkey: PublicKey,
		amount_override: Option<u64>,
	) -> Result<PayInvoiceResult> {
		let decoded = decode_invoice(bolt11)?;
		let amount_sat = match (decoded.amount_msat, amount_override) {
			(Some(invoice_msat), Some(override_sat)) if invoice_msat / 1000 != override_sat => {
				return Err(NodeError::AmountMismatch { expected: invoice_msat / 1000, actual: override_sat });
			}
			(Some(invoice_msat), _) => invoice_msat / 1000,
			(None, Some(override_sat)) => override_sat,
			(None, None) => return Err(NodeError::InvalidInvoice("invoice carries no amount".to_string())),
		};

		let htlc_lock = LockSpec::Htlc {
			preimage_hash_hex: decoded.payment_hash.clone(),
			pubkeys: vec![],
			sigflag: SigFlag::SigInputs,
			n_sigs: None,
			locktime: Some(now_unix() + self.config.default_locktime_secs),
			refund: vec![self.wallet.pubkey_hex()],
			n_sigs_refund: None,
		};

		let (inputs, change) = self.wallet.select_and_sign_inputs(amount_sat).await?;
		let (_keyset_id, htlc_outputs) = self.wallet.prepare_locked_outputs(amount_sat, &htlc_lock).await?;
		let change_lock = self.wallet.self_lock();
		let (_keyset_id, change_outputs) = if change > 0 {
			self.wallet.prepare_locked_outputs(change, &change_lock).await?
		} else {
			(String::new(), Vec::new())
		};

		let mut mint_outputs = to_blinded_messages(&htlc_outputs);
		mint_outputs.extend(to_blinded_messages(&change_outputs));
		let signatures = self.wallet.swap(inputs, mint_outputs).await?;
		let (htlc_sigs, change_sigs) = signatures.split_at(htlc_outputs.len());

		let htlc_proofs = self.wallet.unblind(&htlc_outputs, htlc_sigs, false).await?;
		if !change_outputs.is_empty() {
			self.wallet.unblind(&change_outputs, change_sigs, true).await?;
		}

		let token = self.wallet.encode_token(&self.config.mint_url, "sat", htlc_proofs);
		let params = PayInvoiceParams { invoice: bolt11.to_string(), token: token.encode() };
		let result_value =
			self.relay.call(gateway_pubkey, METHOD_PAY_INVOICE, serde_json::to_value(&params)?).await?;
		Ok(serde_json::from_value(result_value)?)
	}
}

#[async_trait]
impl RequestHandler for PeerContext {
	async fn handle(&self, from: PublicKey, request: RpcRequest) -> RpcResponse {
		let id = request.id.clone();
		let outcome = match request.method.as_str() {
			METHOD_INFO => api::info::handle(self, from, request.params).await,
			METHOD_REQUEST_DEALER_FEE => api::request_dealer_fee::handle(self, from, request.params).await,
			METHOD_MAKE_INVOICE => api::make_invoice::handle(self, from, request.params).await,
			METHOD_SWAP_HTLC => api::swap_htlc::handle(self, from, request.params).await,
			METHOD_BLINDED_SIGNATURES => api::blinded_signatures::handle(self, from, request.params).await,
			METHOD_PAY_INVOICE => api::pay_invoice::handle(self, from, request.params).await,
			other => {
				return RpcResponse::err(id, ERROR_METHOD_NOT_FOUND, format!("unknown method: {other}"));
			}
		};

		match outcome {
			Ok(result) => RpcResponse::ok(id, result),
			Err(e) => RpcResponse::err(id, e.rpc_code(), e.to_string()),
		}
	}
}
