//! In-memory relay: every registered pubkey gets its own inbox channel;
//! `send` looks the recipient up and forwards the envelope, dropping it
//! silently if nobody is registered (matching the real relay's best-effort
//! delivery, `spec.md` §6). Used by integration tests to run the full
//! three-party protocol without any network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use secp256k1::PublicKey;
use tokio::sync::{mpsc, Mutex};

use crate::error::Result;
use crate::transport::{Envelope, RelayTransport};

#[derive(Default)]
pub struct LoopbackRelay {
	inboxes: Mutex<HashMap<PublicKey, mpsc::Sender<Envelope>>>,
}

impl LoopbackRelay {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}
}

#[async_trait]
impl RelayTransport for LoopbackRelay {
	async fn register(&self, recipient: PublicKey) -> mpsc::Receiver<Envelope> {
		let (tx, rx) = mpsc::channel(256);
		self.inboxes.lock().await.insert(recipient, tx);
		rx
	}

	async fn send(&self, envelope: Envelope) -> Result<()> {
		if let Some(tx) = self.inboxes.lock().await.get(&envelope.to) {
			let _ = tx.send(envelope).await;
		}
		Ok(())
	}
}
