//! Well-known secret kinds (`P2PK`, `HTLC`) as specified by NUT-10/NUT-11/
//! NUT-14: a secret is a two-element JSON array `[kind, payload]` that is
//! itself embedded as a *string* inside `Proof.secret`.

use hex::DisplayHex;
use rand::RngCore;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};

/// The payload half of a well-known secret: a random nonce, the locking
/// data (a pubkey or a hash depending on kind), and a list of string-array
/// tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretData {
	pub nonce: String,
	pub data: String,
	#[serde(default)]
	pub tags: Vec<Vec<String>>,
}

/// A Cashu well-known secret. Only the two kinds this protocol relies on are
/// modeled; unknown kinds are rejected rather than carried through opaquely
/// since every peer in this protocol must interpret the locking condition to
/// decide how to spend a proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Secret {
	P2PK(SecretData),
	Htlc(SecretData),
}

impl Secret {
	fn kind_str(&self) -> &'static str {
		match self {
			Secret::P2PK(_) => "P2PK",
			Secret::Htlc(_) => "HTLC",
		}
	}

	fn data(&self) -> &SecretData {
		match self {
			Secret::P2PK(d) => d,
			Secret::Htlc(d) => d,
		}
	}

	pub fn tags(&self) -> Tags {
		Tags::from_raw(&self.data().tags)
	}

	fn fresh_nonce() -> String {
		let mut bytes = [0u8; 32];
		rand::thread_rng().fill_bytes(&mut bytes);
		bytes.to_lower_hex_string()
	}

	/// Builds a new P2PK secret locking `amount`-independent spend rights to
	/// `pubkey_hex` (33-byte compressed, hex encoded).
	pub fn new_p2pk(pubkey_hex: impl Into<String>, tags: Vec<Vec<String>>) -> Self {
		Secret::P2PK(SecretData { nonce: Self::fresh_nonce(), data: pubkey_hex.into(), tags })
	}

	/// Builds a new HTLC secret locking spend rights to the preimage of
	/// `preimage_hash_hex` (32-byte sha256 digest, hex encoded).
	pub fn new_htlc(preimage_hash_hex: impl Into<String>, tags: Vec<Vec<String>>) -> Self {
		Secret::Htlc(SecretData { nonce: Self::fresh_nonce(), data: preimage_hash_hex.into(), tags })
	}

	/// Canonical UTF-8 bytes of this secret, exactly as they appear inside
	/// `Proof.secret` and as fed into the SIG_ALL hash. This is the
	/// stringified JSON array form, not the Rust enum's own serde shape.
	pub fn canonical_bytes(&self) -> Vec<u8> {
		serde_json::to_vec(self).expect("Secret serialization is infallible")
	}

	pub fn canonical_string(&self) -> String {
		serde_json::to_string(self).expect("Secret serialization is infallible")
	}

	/// Parses a `Proof.secret` string back into a typed `Secret`.
	pub fn from_canonical_str(s: &str) -> Result<Self> {
		serde_json::from_str(s).map_err(|e| Error::MalformedSecret(e.to_string()))
	}
}

impl Serialize for Secret {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut seq = serializer.serialize_seq(Some(2))?;
		seq.serialize_element(self.kind_str())?;
		seq.serialize_element(self.data())?;
		seq.end()
	}
}

impl<'de> Deserialize<'de> for Secret {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		struct SecretVisitor;

		impl<'de> Visitor<'de> for SecretVisitor {
			type Value = Secret;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str("a two-element [kind, data] secret array")
			}

			fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Secret, A::Error> {
				let kind: String = seq
					.next_element()?
					.ok_or_else(|| de::Error::invalid_length(0, &self))?;
				let data: SecretData = seq
					.next_element()?
					.ok_or_else(|| de::Error::invalid_length(1, &self))?;
				match kind.as_str() {
					"P2PK" => Ok(Secret::P2PK(data)),
					"HTLC" => Ok(Secret::Htlc(data)),
					other => Err(de::Error::unknown_variant(other, &["P2PK", "HTLC"])),
				}
			}
		}

		deserializer.deserialize_seq(SecretVisitor)
	}
}

/// Typed accessors over a secret's raw `tags` list (each tag is itself a
/// `[key, values...]` string array).
pub struct Tags<'a> {
	raw: &'a [Vec<String>],
}

impl<'a> Tags<'a> {
	fn from_raw(raw: &'a [Vec<String>]) -> Self {
		Tags { raw }
	}

	fn first_value(&self, key: &str) -> Option<&str> {
		self.raw
			.iter()
			.find(|tag| tag.first().map(String::as_str) == Some(key))
			.and_then(|tag| tag.get(1))
			.map(String::as_str)
	}

	fn values(&self, key: &str) -> Vec<&str> {
		self.raw
			.iter()
			.find(|tag| tag.first().map(String::as_str) == Some(key))
			.map(|tag| tag[1..].iter().map(String::as_str).collect())
			.unwrap_or_default()
	}

	/// `sigflag` tag: `"SIG_ALL"` or `"SIG_INPUTS"` (the default when absent).
	pub fn sigflag(&self) -> SigFlag {
		match self.first_value("sigflag") {
			Some("SIG_ALL") => SigFlag::SigAll,
			_ => SigFlag::SigInputs,
		}
	}

	pub fn pubkeys(&self) -> Vec<&str> {
		self.values("pubkeys")
	}

	pub fn n_sigs(&self) -> Result<Option<u64>> {
		self.parse_numeric("n_sigs")
	}

	pub fn n_sigs_refund(&self) -> Result<Option<u64>> {
		self.parse_numeric("n_sigs_refund")
	}

	pub fn locktime(&self) -> Result<Option<u64>> {
		self.parse_numeric("locktime")
	}

	pub fn refund_pubkeys(&self) -> Vec<&str> {
		self.values("refund")
	}

	fn parse_numeric(&self, key: &'static str) -> Result<Option<u64>> {
		match self.first_value(key) {
			None => Ok(None),
			Some(v) => v
				.parse::<u64>()
				.map(Some)
				.map_err(|_| Error::InvalidNumericTag { tag: key, value: v.to_string() }),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigFlag {
	SigInputs,
	SigAll,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn p2pk_round_trips_through_canonical_string() {
		let secret = Secret::new_p2pk(
			"02".to_string() + &"ab".repeat(32),
			vec![vec!["sigflag".into(), "SIG_ALL".into()]],
		);
		let s = secret.canonical_string();
		assert!(s.starts_with("[\"P2PK\","));
		let parsed = Secret::from_canonical_str(&s).unwrap();
		assert_eq!(secret, parsed);
		assert_eq!(parsed.tags().sigflag(), SigFlag::SigAll);
	}

	#[test]
	fn htlc_tags_parse_numeric_fields() {
		let secret = Secret::new_htlc(
			"cc".repeat(32),
			vec![
				vec!["locktime".into(), "1000".into()],
				vec!["refund".into(), "02".to_string() + &"11".repeat(32)],
			],
		);
		let tags = secret.tags();
		assert_eq!(tags.locktime().unwrap(), Some(1000));
		assert_eq!(tags.refund_pubkeys().len(), 1);
	}

	#[test]
	fn rejects_unknown_kind() {
		let err = Secret::from_canonical_str(r#"["WEIRD",{"nonce":"a","data":"b","tags":[]}]"#);
		assert!(err.is_err());
	}
}
