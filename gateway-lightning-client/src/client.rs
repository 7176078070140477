//! `LightningClient` trait: `make_invoice`, `pay_invoice`, and a
//! `payment_received` notification stream, modeling a wallet-connect-like
//! RPC. `make_hodl_invoice` is gated behind `supports_hodl_invoices` since
//! not every backend can hold settlement until the preimage is revealed;
//! when it can't, callers fall back to the gateway-generated-preimage path
//! documented in `spec.md` §9.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Invoice {
	pub bolt11: String,
	pub payment_hash: String,
	pub amount_msat: Option<u64>,
	pub expiry_unix: u64,
}

#[derive(Debug, Clone)]
pub struct PaymentResult {
	pub preimage: String,
	pub fees_paid_msat: u64,
}

/// Delivered at-least-once; the consumer MUST dedupe by `preimage` per
/// `spec.md` §5.
#[derive(Debug, Clone)]
pub struct PaymentReceived {
	pub bolt11: String,
	pub payment_hash: String,
	pub preimage: String,
}

#[async_trait]
pub trait LightningClient: Send + Sync {
	fn supports_hodl_invoices(&self) -> bool;

	async fn make_invoice(&self, amount_msat: u64, description: &str) -> Result<Invoice>;

	/// Requests an invoice whose payment is held until the preimage behind
	/// `payment_hash_hex` is revealed by the protocol layer, not generated
	/// by this backend. Errs with `HodlNotSupported` when the capability
	/// flag is false.
	async fn make_hodl_invoice(
		&self,
		amount_msat: u64,
		payment_hash_hex: &str,
		description: &str,
	) -> Result<Invoice>;

	async fn pay_invoice(&self, bolt11: &str) -> Result<PaymentResult>;

	/// Subscribes to payment notifications. Each call returns an
	/// independent receiver fed from the same underlying stream.
	async fn payment_notifications(&self) -> mpsc::Receiver<PaymentReceived>;
}

/// Decodes a BOLT11 string into its payment hash and amount, used by `A`
/// in the send flow to validate the invoice before constructing an HTLC.
pub fn decode_invoice(bolt11: &str) -> Result<DecodedInvoice> {
	use crate::error::LightningError;
	use lightning_invoice::Bolt11Invoice;
	use std::str::FromStr;

	let invoice = Bolt11Invoice::from_str(bolt11)
		.map_err(|e| LightningError::InvalidInvoice(e.to_string()))?;

	Ok(DecodedInvoice {
		payment_hash: hex_encode(invoice.payment_hash().as_ref()),
		amount_msat: invoice.amount_milli_satoshis(),
		expiry_unix: invoice
			.timestamp()
			.duration_since(std::time::UNIX_EPOCH)
			.map(|d| d.as_secs() + invoice.expiry_time().as_secs())
			.unwrap_or(0),
	})
}

#[derive(Debug, Clone)]
pub struct DecodedInvoice {
	pub payment_hash: String,
	pub amount_msat: Option<u64>,
	pub expiry_unix: u64,
}

fn hex_encode(bytes: &[u8]) -> String {
	use hex::DisplayHex;
	bytes.to_lower_hex_string()
}
