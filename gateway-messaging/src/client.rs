//! `RelayClient`: the single-threaded cooperative request/response client
//! described in `spec.md` §4.4. One client instance is shared by a peer's
//! outgoing calls (`call`) and its inbound dispatch loop (`run`); both sides
//! multiplex the same registered receiver.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gateway_models::rpc::{RpcRequest, RpcResponse};
use secp256k1::PublicKey;
use tokio::sync::{Mutex, oneshot};

use crate::error::{MessagingError, Result};
use crate::transport::{Envelope, RelayTransport};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Implemented by a peer to answer inbound requests addressed to it.
#[async_trait]
pub trait RequestHandler: Send + Sync {
	async fn handle(&self, from: PublicKey, request: RpcRequest) -> RpcResponse;
}

struct Pending {
	waiters: Mutex<HashMap<String, oneshot::Sender<RpcResponse>>>,
}

/// Correlates replies by the originating request's `id`; ordering across
/// independent requests is not guaranteed (`spec.md` §4.4).
pub struct RelayClient {
	pubkey: PublicKey,
	transport: Arc<dyn RelayTransport>,
	pending: Arc<Pending>,
	next_id: AtomicU64,
}

impl RelayClient {
	pub fn new(pubkey: PublicKey, transport: Arc<dyn RelayTransport>) -> Self {
		RelayClient {
			pubkey,
			transport,
			pending: Arc::new(Pending { waiters: Mutex::new(HashMap::new()) }),
			next_id: AtomicU64::new(0),
		}
	}

	pub fn pubkey(&self) -> PublicKey {
		self.pubkey
	}

	fn fresh_request_id(&self) -> String {
		let n = self.next_id.fetch_add(1, Ordering::Relaxed);
		format!("{}-{n}", self.pubkey)
	}

	/// Sends `method`/`params` to `to` and returns the request id a later
	/// `await_response` call correlates against.
	pub async fn send_request(
		&self,
		to: PublicKey,
		method: impl Into<String>,
		params: serde_json::Value,
	) -> Result<String> {
		let id = self.fresh_request_id();
		let request = RpcRequest { method: method.into(), params, id: id.clone() };
		let envelope = Envelope { from: self.pubkey, to, body: serde_json::to_value(&request)? };
		self.transport.send(envelope).await.map_err(|e| MessagingError::Transport(e.to_string()))?;
		Ok(id)
	}

	/// Blocks until the response correlated with `request_id` arrives or
	/// `timeout` elapses. A timeout aborts the await without cancelling any
	/// remote side effect (`spec.md` §5): the registered waiter is dropped
	/// and a late reply is simply discarded by `run`'s dispatch loop.
	pub async fn await_response(&self, request_id: &str, timeout: Duration) -> Result<RpcResponse> {
		let (tx, rx) = oneshot::channel();
		self.pending.waiters.lock().await.insert(request_id.to_string(), tx);

		let result = tokio::time::timeout(timeout, rx).await;
		self.pending.waiters.lock().await.remove(request_id);

		match result {
			Ok(Ok(response)) => Ok(response),
			Ok(Err(_)) => Err(MessagingError::Timeout),
			Err(_) => Err(MessagingError::Timeout),
		}
	}

	/// Convenience wrapper: send then await with the default 30s timeout,
	/// translating an `RpcResponse::Error` into `MessagingError::Rpc`.
	pub async fn call(
		&self,
		to: PublicKey,
		method: impl Into<String>,
		params: serde_json::Value,
	) -> Result<serde_json::Value> {
		self.call_with_timeout(to, method, params, DEFAULT_TIMEOUT).await
	}

	pub async fn call_with_timeout(
		&self,
		to: PublicKey,
		method: impl Into<String>,
		params: serde_json::Value,
		timeout: Duration,
	) -> Result<serde_json::Value> {
		let id = self.send_request(to, method, params).await?;
		match self.await_response(&id, timeout).await? {
			RpcResponse::Result { result, .. } => Ok(result),
			RpcResponse::Error { error, .. } => Err(MessagingError::Rpc { code: error.code, message: error.message }),
		}
	}

	/// Registers this client's pubkey with the transport and drives the
	/// inbound dispatch loop until the transport closes its receiver.
	/// Inbound requests are answered via `handler`; inbound responses are
	/// routed to whichever `await_response` call is still waiting on that
	/// id (a late or unmatched response is dropped silently).
	pub async fn run(self: Arc<Self>, handler: Arc<dyn RequestHandler>) {
		let mut inbox = self.transport.register(self.pubkey).await;
		while let Some(envelope) = inbox.recv().await {
			let pending = Arc::clone(&self.pending);
			let transport = Arc::clone(&self.transport);
			let handler = Arc::clone(&handler);
			let from = envelope.from;
			let to = envelope.to;

			if let Ok(response) = serde_json::from_value::<RpcResponse>(envelope.body.clone()) {
				let mut waiters = pending.waiters.lock().await;
				if let Some(tx) = waiters.remove(response.id()) {
					let _ = tx.send(response);
				}
				continue;
			}

			match serde_json::from_value::<RpcRequest>(envelope.body) {
				Ok(request) => {
					tokio::spawn(async move {
						let response = handler.handle(from, request).await;
						let reply = Envelope {
							from: to,
							to: from,
							body: serde_json::to_value(&response).expect("RpcResponse is always serializable"),
						};
						let _ = transport.send(reply).await;
					});
				}
				Err(_) => continue,
			}
		}
	}
}
