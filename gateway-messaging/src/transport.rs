//! `RelayTransport` models the one thing the real encrypted DM relay is used
//! for: "send an encrypted message to a recipient pubkey" / "receive the
//! next message addressed to me". Encryption itself is out of scope (the
//! relay is an external collaborator); only the send/receive shape is
//! implemented.

use async_trait::async_trait;
use secp256k1::PublicKey;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// A single message addressed to `to`, carrying a JSON-RPC request or
/// response body.
#[derive(Debug, Clone)]
pub struct Envelope {
	pub from: PublicKey,
	pub to: PublicKey,
	pub body: Value,
}

#[async_trait]
pub trait RelayTransport: Send + Sync {
	/// Registers `recipient` with the relay, returning the channel its
	/// inbound messages arrive on. Re-registering replaces any prior
	/// receiver for that pubkey.
	async fn register(&self, recipient: PublicKey) -> mpsc::Receiver<Envelope>;

	async fn send(&self, envelope: Envelope) -> Result<()>;
}
