//! Wire-shaped proof and blinded-message/-signature types. `Proof.secret`
//! and `Proof.witness` are carried as JSON *strings* on the wire (the
//! stringified form of `Secret`/`Witness`) even though internally we keep
//! them typed; the `secret_as_string`/`witness_as_string` adapters below
//! bridge the two representations at the serde boundary.

use secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::hash_to_curve;
use crate::error::Result;
use crate::secret::Secret;
use crate::witness::Witness;

mod secret_as_string {
	use super::*;

	pub fn serialize<S: Serializer>(secret: &Secret, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_str(&secret.canonical_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Secret, D::Error> {
		let s = String::deserialize(deserializer)?;
		Secret::from_canonical_str(&s).map_err(serde::de::Error::custom)
	}
}

mod witness_as_string {
	use super::*;

	pub fn serialize<S: Serializer>(
		witness: &Option<Witness>,
		serializer: S,
	) -> std::result::Result<S::Ok, S::Error> {
		match witness {
			None => serializer.serialize_none(),
			Some(w) => serializer.serialize_str(&w.canonical_string()),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> std::result::Result<Option<Witness>, D::Error> {
		let opt: Option<String> = Option::deserialize(deserializer)?;
		match opt {
			None => Ok(None),
			Some(s) => Witness::from_canonical_str(&s).map(Some).map_err(serde::de::Error::custom),
		}
	}
}

/// A spendable ecash proof: a mint's blind signature over a locked secret,
/// plus whatever witness is required to satisfy that secret's spending
/// condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
	/// Hex-encoded keyset id this proof was signed under.
	pub id: String,
	pub amount: u64,
	#[serde(with = "secret_as_string")]
	pub secret: Secret,
	/// Unblinded mint signature `C`.
	pub c: PublicKey,
	#[serde(default, skip_serializing_if = "Option::is_none", with = "witness_as_string")]
	pub witness: Option<Witness>,
}

impl Proof {
	/// `Y = hash_to_curve(secret)`, the key every peer and the mint use to
	/// identify this proof uniquely regardless of witness contents.
	pub fn y(&self) -> Result<PublicKey> {
		Ok(hash_to_curve(&self.secret.canonical_bytes())?)
	}

	pub fn y_hex(&self) -> Result<String> {
		Ok(self.y()?.to_string())
	}
}

/// An output a wallet sends to the mint to request a blind signature: the
/// blinded point `B_` for a not-yet-revealed secret/amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedMessage {
	pub id: String,
	pub amount: u64,
	#[serde(rename = "B_")]
	pub b: PublicKey,
}

/// The mint's response to a `BlindedMessage`: its signature `C_` over `B_`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedSignature {
	pub id: String,
	pub amount: u64,
	#[serde(rename = "C_")]
	pub c: PublicKey,
}
