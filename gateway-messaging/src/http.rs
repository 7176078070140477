//! Real relay adapter: envelopes are exchanged over plain HTTP, shaped the
//! same way `gateway-mint-client`/`gateway-lightning-client`'s `http.rs`
//! adapters are — a `reqwest` client, POST to hand off a message, GET-poll
//! an inbox. The relay's own encryption/authentication is the external
//! collaborator's job (`spec.md` §1); this only carries the envelope.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};

use crate::error::{MessagingError, Result};
use crate::transport::{Envelope, RelayTransport};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
	from: PublicKey,
	to: PublicKey,
	body: serde_json::Value,
}

impl From<Envelope> for WireEnvelope {
	fn from(e: Envelope) -> Self {
		WireEnvelope { from: e.from, to: e.to, body: e.body }
	}
}

impl From<WireEnvelope> for Envelope {
	fn from(w: WireEnvelope) -> Self {
		Envelope { from: w.from, to: w.to, body: w.body }
	}
}

#[derive(Debug, Deserialize)]
struct InboxResponse {
	messages: Vec<WireEnvelope>,
}

/// Polling HTTP client for the encrypted relay. One `register` call per
/// process is expected (a peer registers its own pubkey once and keeps the
/// returned receiver for the lifetime of the process).
pub struct HttpRelayTransport {
	base_url: String,
	http: reqwest::Client,
	seen: Arc<Mutex<HashSet<String>>>,
}

impl HttpRelayTransport {
	pub fn new(base_url: impl Into<String>) -> Self {
		HttpRelayTransport { base_url: base_url.into(), http: reqwest::Client::new(), seen: Arc::new(Mutex::new(HashSet::new())) }
	}
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
	async fn register(&self, recipient: PublicKey) -> mpsc::Receiver<Envelope> {
		let (tx, rx) = mpsc::channel(256);
		let url = format!("{}/inbox/{recipient}", self.base_url);
		let http = self.http.clone();
		let seen = self.seen.clone();

		tokio::spawn(async move {
			loop {
				match http.get(&url).send().await {
					Ok(response) => {
						if let Ok(parsed) = response.json::<InboxResponse>().await {
							for wire in parsed.messages {
								// best-effort de-dup of a best-effort pub/sub channel; the
								// relay may redeliver, callers above us handle true
								// correlation by request id.
								let key = serde_json::to_string(&wire).unwrap_or_default();
								if seen.lock().await.insert(key) {
									if tx.send(wire.into()).await.is_err() {
										return;
									}
								}
							}
						}
					}
					Err(e) => log::warn!("relay poll failed: {e}"),
				}
				tokio::time::sleep(POLL_INTERVAL).await;
			}
		});

		rx
	}

	async fn send(&self, envelope: Envelope) -> Result<()> {
		let url = format!("{}/send", self.base_url);
		let wire: WireEnvelope = envelope.into();
		self
			.http
			.post(url)
			.json(&wire)
			.send()
			.await
			.map_err(|e| MessagingError::Transport(e.to_string()))?;
		Ok(())
	}
}
