//! The three in-memory pending maps that are the coordination substrate for
//! the protocol (`spec.md` §3, §9): each keyed by `preimage_hash` or
//! `payment_hash`, never persisted across restarts (`spec.md` §1
//! non-goals), and garbage-collected once their entries live past the
//! `locktime` they were created against.

use std::collections::HashMap;
use std::sync::Arc;

use gateway_core::{BlindedMessage, OutputData, Proof};
use tokio::sync::{Mutex, Notify};

/// Anything with a locktime-derived expiry can be garbage-collected from a
/// `PendingMap` once that deadline passes (`spec.md` §7: "Local side effects
/// ... are retained for the duration of the locktime ... after that they
/// may be garbage-collected").
pub trait Expiring {
	fn expires_at(&self) -> u64;
}

/// A single-writer (the peer's cooperative task) map of in-flight protocol
/// state, keyed by the correlating `preimage_hash`/`payment_hash`.
pub struct PendingMap<T> {
	entries: Mutex<HashMap<String, T>>,
}

impl<T: Clone + Expiring> Default for PendingMap<T> {
	fn default() -> Self {
		PendingMap { entries: Mutex::new(HashMap::new()) }
	}
}

impl<T: Clone + Expiring> PendingMap<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert(&self, key: impl Into<String>, value: T) {
		self.entries.lock().await.insert(key.into(), value);
	}

	pub async fn take(&self, key: &str) -> Option<T> {
		self.entries.lock().await.remove(key)
	}

	pub async fn get(&self, key: &str) -> Option<T> {
		self.entries.lock().await.get(key).cloned()
	}

	pub async fn contains(&self, key: &str) -> bool {
		self.entries.lock().await.contains_key(key)
	}

	/// Drops every entry whose `locktime`-derived deadline has passed.
	pub async fn gc(&self, now: u64) {
		self.entries.lock().await.retain(|_, v| v.expires_at() > now);
	}

	/// Like `gc`, but returns the expired entries instead of discarding them —
	/// used by G's reclaim-on-locktime path (`spec.md` §8 scenario 4), which
	/// needs the minted proofs back to build a refund swap.
	pub async fn drain_expired(&self, now: u64) -> Vec<(String, T)> {
		let mut guard = self.entries.lock().await;
		let expired: Vec<String> =
			guard.iter().filter(|(_, v)| v.expires_at() <= now).map(|(k, _)| k.clone()).collect();
		expired.into_iter().filter_map(|k| guard.remove(&k).map(|v| (k, v))).collect()
	}

	pub async fn len(&self) -> usize {
		self.entries.lock().await.len()
	}
}

/// A's bookkeeping for an in-flight receive: the outputs it generated for
/// itself, retained so it can unblind once D/G complete the swap.
#[derive(Debug, Clone)]
pub struct PendingHtlcRequest {
	pub output_data: Vec<OutputData>,
	pub amount: u64,
	pub timestamp: u64,
	pub expires_at: u64,
	/// Signalled once `blinded_signatures` resolves this entry, so a CLI
	/// invocation that created it can await its own completion in-process
	/// without a separate daemon.
	pub notify: Arc<Notify>,
}

impl Expiring for PendingHtlcRequest {
	fn expires_at(&self) -> u64 {
		self.expires_at
	}
}

/// D's bookkeeping for a dealer-fee quote it issued to A: the outputs it
/// locked to itself, still unsigned until `swap_htlc` completes.
#[derive(Debug, Clone)]
pub struct PendingDealerFee {
	pub output_data: Vec<OutputData>,
	pub amount: u64,
	pub alice_pubkey: String,
	pub timestamp: u64,
	pub expires_at: u64,
}

impl Expiring for PendingDealerFee {
	fn expires_at(&self) -> u64 {
		self.expires_at
	}
}

/// G's bookkeeping for an invoice it issued: everything needed to mint the
/// HTLC once the Lightning payment lands, keyed by the invoice's
/// `payment_hash` (the authoritative key, per `spec.md` §9 — not A's
/// `request_preimage_hash`, which is carried only for correlation).
#[derive(Debug, Clone)]
pub struct PendingReceiveRequest {
	pub alice_pubkey: String,
	pub dealer_pubkey: String,
	pub blinded_messages: Vec<BlindedMessage>,
	pub request_preimage_hash: String,
	pub amount: u64,
	pub timestamp: u64,
	pub expires_at: u64,
}

impl Expiring for PendingReceiveRequest {
	fn expires_at(&self) -> u64 {
		self.expires_at
	}
}

/// G's bookkeeping for an HTLC multi-proof it minted to pre-authorize D's
/// `swap_htlc` (`spec.md` §4.5.1 step 6): retained so that if D never calls
/// back before `locktime`, G can reclaim the minted proofs into fresh
/// P2PK-to-self outputs via the refund path (`spec.md` §8 scenario 4).
#[derive(Debug, Clone)]
pub struct PendingGatewayMint {
	pub htlc_proofs: Vec<Proof>,
	pub amount: u64,
	pub timestamp: u64,
	pub expires_at: u64,
}

impl Expiring for PendingGatewayMint {
	fn expires_at(&self) -> u64 {
		self.expires_at
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Clone)]
	struct Dummy {
		expires_at: u64,
	}
	impl Expiring for Dummy {
		fn expires_at(&self) -> u64 {
			self.expires_at
		}
	}

	#[tokio::test]
	async fn gc_drops_only_expired_entries() {
		let map: PendingMap<Dummy> = PendingMap::new();
		map.insert("fresh", Dummy { expires_at: 200 }).await;
		map.insert("stale", Dummy { expires_at: 50 }).await;

		map.gc(100).await;

		assert!(map.contains("fresh").await);
		assert!(!map.contains("stale").await);
	}

	#[tokio::test]
	async fn take_removes_the_entry() {
		let map: PendingMap<Dummy> = PendingMap::new();
		map.insert("k", Dummy { expires_at: 1 }).await;
		assert!(map.take("k").await.is_some());
		assert!(map.take("k").await.is_none());
	}

	#[tokio::test]
	async fn drain_expired_returns_and_removes_only_expired_entries() {
		let map: PendingMap<Dummy> = PendingMap::new();
		map.insert("fresh", Dummy { expires_at: 200 }).await;
		map.insert("stale", Dummy { expires_at: 50 }).await;

		let mut drained = map.drain_expired(100).await;
		assert_eq!(drained.len(), 1);
		let (key, _) = drained.remove(0);
		assert_eq!(key, "stale");

		assert!(map.contains("fresh").await);
		assert!(!map.contains("stale").await);
	}
}
