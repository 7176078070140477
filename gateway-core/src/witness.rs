//! The witness attached to a spent `Proof`: zero or more Schnorr signatures
//! plus, for HTLC-locked proofs, the revealed preimage. Like `Secret`, the
//! witness is embedded in the wire format as a stringified JSON object
//! rather than a nested object, per NUT-11/NUT-14.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub signatures: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub preimage: Option<String>,
}

impl Witness {
	pub fn signatures_only(signatures: Vec<String>) -> Self {
		Witness { signatures, preimage: None }
	}

	pub fn htlc(preimage_hex: impl Into<String>, signatures: Vec<String>) -> Self {
		Witness { signatures, preimage: Some(preimage_hex.into()) }
	}

	pub fn canonical_string(&self) -> String {
		serde_json::to_string(self).expect("Witness serialization is infallible")
	}

	pub fn from_canonical_str(s: &str) -> Result<Self> {
		Ok(serde_json::from_str(s)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn htlc_witness_round_trips() {
		let w = Witness::htlc("ab".repeat(32), vec!["sig1".to_string(), "sig2".to_string()]);
		let s = w.canonical_string();
		let parsed = Witness::from_canonical_str(&s).unwrap();
		assert_eq!(w, parsed);
	}

	#[test]
	fn signature_only_witness_omits_preimage() {
		let w = Witness::signatures_only(vec!["deadbeef".to_string()]);
		let s = w.canonical_string();
		assert!(!s.contains("preimage"));
	}
}
