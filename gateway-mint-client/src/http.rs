//! Real HTTP mint adapter, shaped after `cdk`'s `SwapRequest`/`SwapResponse`
//! wire types (`other_examples` nut00/nut03 grounding) and the teacher's
//! `reqwest` + `rustls-tls` client dependency choice.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use gateway_core::{BlindedMessage, BlindedSignature, Proof};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::client::{Keyset, MintClient, ProofState, ProofStateEvent};
use crate::error::{MintError, Result};
use crate::keyset_cache::KeysetCache;

const DEFAULT_SWAP_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct SwapRequestBody {
	inputs: Vec<Proof>,
	outputs: Vec<BlindedMessage>,
}

#[derive(Debug, Deserialize)]
struct SwapResponseBody {
	signatures: Vec<BlindedSignature>,
}

#[derive(Debug, Deserialize)]
struct KeysetsResponseBody {
	keysets: Vec<KeysetBody>,
}

#[derive(Debug, Deserialize)]
struct KeysetBody {
	id: String,
	unit: String,
	keys: BTreeMap<String, PublicKey>,
}

#[derive(Debug, Serialize)]
struct CheckStateRequestBody {
	#[serde(rename = "Ys")]
	ys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CheckStateResponseBody {
	states: Vec<ProofStateBody>,
}

#[derive(Debug, Deserialize)]
struct ProofStateBody {
	#[serde(rename = "Y")]
	y: String,
	state: String,
	witness: Option<String>,
}

pub struct HttpMintClient {
	base_url: String,
	http: reqwest::Client,
	cache: KeysetCache,
}

impl HttpMintClient {
	pub fn new(base_url: impl Into<String>) -> Self {
		HttpMintClient {
			base_url: base_url.into(),
			http: reqwest::Client::new(),
			cache: KeysetCache::new(),
		}
	}
}

#[async_trait]
impl MintClient for HttpMintClient {
	async fn load_keysets(&self) -> Result<Vec<Keyset>> {
		if let Some(cached) = self.cache.get().await {
			return Ok(cached);
		}

		let url = format!("{}/v1/keys", self.base_url);
		let response: KeysetsResponseBody = self
			.http
			.get(url)
			.send()
			.await
			.map_err(|e| MintError::Transport(e.to_string()))?
			.json()
			.await
			.map_err(|e| MintError::Transport(e.to_string()))?;

		let keysets = response
			.keysets
			.into_iter()
			.map(|k| Keyset {
				id: k.id,
				unit: k.unit,
				keys: k
					.keys
					.into_iter()
					.filter_map(|(amount, pk)| amount.parse::<u64>().ok().map(|a| (a, pk)))
					.collect(),
			})
			.collect::<Vec<_>>();

		self.cache.set(keysets.clone()).await;
		Ok(keysets)
	}

	async fn swap(
		&self,
		inputs: Vec<Proof>,
		outputs: Vec<BlindedMessage>,
	) -> Result<Vec<BlindedSignature>> {
		let url = format!("{}/v1/swap", self.base_url);
		let body = SwapRequestBody { inputs, outputs };

		let response = self
			.http
			.post(url)
			.json(&body)
			.timeout(DEFAULT_SWAP_TIMEOUT)
			.send()
			.await
			.map_err(|e| MintError::Transport(e.to_string()))?;

		if !response.status().is_success() {
			let status = response.status();
			let text = response.text().await.unwrap_or_default();
			return Err(MintError::Mint(format!("{status}: {text}")));
		}

		let parsed: SwapResponseBody =
			response.json().await.map_err(|e| MintError::Transport(e.to_string()))?;
		Ok(parsed.signatures)
	}

	async fn subscribe_proof_state(&self, ys: Vec<String>) -> Result<mpsc::Receiver<ProofStateEvent>> {
		let (tx, rx) = mpsc::channel(64);
		let url = format!("{}/v1/checkstate", self.base_url);
		let http = self.http.clone();

		tokio::spawn(async move {
			let mut last_seen: BTreeMap<String, String> = BTreeMap::new();
			loop {
				let body = CheckStateRequestBody { ys: ys.clone() };
				let response = match http.post(&url).json(&body).send().await {
					Ok(r) => r,
					Err(_) => {
						tokio::time::sleep(POLL_INTERVAL).await;
						continue;
					}
				};
				if let Ok(parsed) = response.json::<CheckStateResponseBody>().await {
					for state in parsed.states {
						if last_seen.get(&state.y) == Some(&state.state) {
							continue;
						}
						last_seen.insert(state.y.clone(), state.state.clone());
						let state_enum = match state.state.as_str() {
							"UNSPENT" => ProofState::Unspent,
							"PENDING" => ProofState::Pending,
							_ => ProofState::Spent,
						};
						let event =
							ProofStateEvent { y_hex: state.y, state: state_enum, preimage: state.witness };
						if tx.send(event).await.is_err() {
							return;
						}
					}
				}
				tokio::time::sleep(POLL_INTERVAL).await;
			}
		});

		Ok(rx)
	}
}
