//! Single-writer in-memory keyset cache. Populated on first `load_keysets`
//! call and reused until the process restarts — per-restart persistence of
//! the cache is explicitly out of scope (`spec.md` §1, "process glue").

use tokio::sync::RwLock;

use crate::client::Keyset;

#[derive(Default)]
pub struct KeysetCache {
	keysets: RwLock<Option<Vec<Keyset>>>,
}

impl KeysetCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached keysets, or `None` on a cold cache.
	pub async fn get(&self) -> Option<Vec<Keyset>> {
		self.keysets.read().await.clone()
	}

	pub async fn set(&self, keysets: Vec<Keyset>) {
		*self.keysets.write().await = Some(keysets);
	}
}
