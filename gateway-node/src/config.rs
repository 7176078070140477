//! Per-peer configuration: role, keypair, and the three external
//! collaborators named in `spec.md` §1/§6 (mint, relay, Lightning backend).
//! Loading, parsing, and seed-phrase derivation are "process glue" the spec
//! calls trivial plumbing; kept as a flat TOML file parsed with `toml`,
//! the same crate the teacher's `Config` used.

use std::path::Path;

use gateway_models::PeerRole;
use secp256k1::SecretKey;
use serde::Deserialize;

use crate::error::{NodeError, Result};

/// 24h, the default `locktime` the send flow (`spec.md` §4.5.2) uses when
/// the caller doesn't override it.
pub const DEFAULT_LOCKTIME_SECS: u64 = 86_400;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub role: PeerRole,
	pub name: String,
	/// Hex-encoded secp256k1 secret key. Derivation from a seed phrase is
	/// process glue out of scope for this design (`spec.md` §1).
	pub secret_key_hex: String,
	pub mint_url: String,
	pub relay_url: String,
	pub lightning_rpc_uri: String,
	#[serde(default)]
	pub lightning_supports_hodl: bool,
	#[serde(default = "default_locktime")]
	pub default_locktime_secs: u64,
	/// D's flat fee-per-quote, in sats. Unused by A and G.
	pub dealer_fee_sats: Option<u64>,
}

fn default_locktime() -> u64 {
	DEFAULT_LOCKTIME_SECS
}

impl Config {
	pub fn from_toml_str(s: &str) -> Result<Self> {
		toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
	}

	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let contents = std::fs::read_to_string(path.as_ref())
			.map_err(|e| NodeError::Config(format!("{}: {e}", path.as_ref().display())))?;
		Self::from_toml_str(&contents)
	}

	pub fn secret_key(&self) -> Result<SecretKey> {
		use hex::FromHex;
		let bytes = <[u8; 32]>::from_hex(&self.secret_key_hex).map_err(|e| NodeError::Hex(e.to_string()))?;
		SecretKey::from_slice(&bytes).map_err(|e| NodeError::Core(gateway_core::Error::Secp256k1(e)))
	}

	pub fn role(&self) -> PeerRole {
		self.role
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_a_minimal_role_a_config() {
		let toml = format!(
			r#"
			role = "A"
			name = "alice"
			secret_key_hex = "{}"
			mint_url = "https://mint.example"
			relay_url = "https://relay.example"
			lightning_rpc_uri = "https://ln.example"
		"#,
			"11".repeat(32)
		);
		let cfg = Config::from_toml_str(&toml).unwrap();
		assert_eq!(cfg.role(), PeerRole::A);
		assert_eq!(cfg.default_locktime_secs, DEFAULT_LOCKTIME_SECS);
		assert!(cfg.secret_key().is_ok());
	}

	#[test]
	fn rejects_malformed_secret_key_hex() {
		let toml = r#"
			role = "D"
			name = "dealer"
			secret_key_hex = "zz"
			mint_url = "https://mint.example"
			relay_url = "https://relay.example"
			lightning_rpc_uri = "https://ln.example"
			dealer_fee_sats = 2
		"#;
		let cfg = Config::from_toml_str(toml).unwrap();
		assert!(cfg.secret_key().is_err());
	}
}
