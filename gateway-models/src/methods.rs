//! Request/response payload shapes for each of the six peer methods,
//! carried as the `params`/`result` value of an `RpcRequest`/`RpcResponse`.

use gateway_core::{BlindedMessage, BlindedSignature};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PeerRole {
	A,
	G,
	D,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
	#[serde(rename = "type")]
	pub role: PeerRole,
	pub name: String,
	pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDealerFeeParams {
	pub preimage_hash: String,
	pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDealerFeeResult {
	pub fee_amount: u64,
	pub blinded_messages: Vec<BlindedMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeInvoiceParams {
	pub amount: u64,
	pub preimage_hash: String,
	pub blinded_messages: Vec<BlindedMessage>,
	pub dealer_pubkey: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeInvoiceResult {
	pub invoice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapHtlcParams {
	/// Encoded Cashu token carrying the HTLC-locked multi-proof input set.
	pub htlc_token: String,
	pub blinded_messages: Vec<BlindedMessage>,
	/// Correlation echo of `A`'s originally generated `preimage_hash`; never
	/// assumed equal to the invoice's `payment_hash`.
	pub request_preimage_hash: String,
	pub preimage: String,
	pub alice_pubkey: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapHtlcResult {
	pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlindedSignaturesParams {
	pub preimage_hash: String,
	pub blinded_signatures: Vec<BlindedSignature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlindedSignaturesResult {
	pub success: bool,
	pub total_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayInvoiceParams {
	pub invoice: String,
	/// Encoded Cashu token carrying the HTLC-locked single-party input.
	pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayInvoiceResult {
	pub preimage: String,
	pub fees_paid: u64,
}

pub const METHOD_INFO: &str = "info";
pub const METHOD_REQUEST_DEALER_FEE: &str = "request_dealer_fee";
pub const METHOD_MAKE_INVOICE: &str = "make_invoice";
pub const METHOD_SWAP_HTLC: &str = "swap_htlc";
pub const METHOD_BLINDED_SIGNATURES: &str = "blinded_signatures";
pub const METHOD_PAY_INVOICE: &str = "pay_invoice";

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn info_response_serializes_role_as_type_field() {
		let resp = InfoResponse { role: PeerRole::G, name: "gateway-1".to_string(), timestamp: 100 };
		let v = serde_json::to_value(&resp).unwrap();
		assert_eq!(v["type"], "G");
	}
}
