//! In-memory Lightning network: builds real, decodable BOLT11 invoices and
//! routes payments between `MockLightningBackend` handles without any real
//! network. Supports re-delivering a stored notification verbatim so tests
//! can exercise a peer's duplicate-payment dedup logic (`spec.md` §8,
//! scenario 5).

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hex::{DisplayHex, FromHex};
use lightning_invoice::{Bolt11Invoice, Currency, InvoiceBuilder};
use secp256k1::{Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, Mutex};

use crate::client::{Invoice, LightningClient, PaymentReceived, PaymentResult};
use crate::error::{LightningError, Result};

struct InvoiceRecord {
	bolt11: String,
	preimage: Option<[u8; 32]>,
	settled: bool,
	notifier: mpsc::Sender<PaymentReceived>,
}

#[derive(Default)]
pub struct MockLightningNetwork {
	invoices: Mutex<HashMap<String, InvoiceRecord>>,
}

impl MockLightningNetwork {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	async fn register(
		&self,
		payment_hash_hex: String,
		bolt11: String,
		preimage: Option<[u8; 32]>,
		notifier: mpsc::Sender<PaymentReceived>,
	) {
		self.invoices.lock().await.insert(
			payment_hash_hex,
			InvoiceRecord { bolt11, preimage, settled: false, notifier },
		);
	}

	/// Stands in for "the external payer pays the HODL invoice": the
	/// protocol layer (or a test) supplies the preimage it independently
	/// knows. No-ops if already settled.
	pub async fn settle(&self, payment_hash_hex: &str, preimage_hex: &str) -> Result<()> {
		let preimage_bytes = <[u8; 32]>::from_hex(preimage_hex)
			.map_err(|e| LightningError::InvalidInvoice(e.to_string()))?;
		let digest: [u8; 32] = Sha256::digest(preimage_bytes).into();
		if digest.to_lower_hex_string() != payment_hash_hex {
			return Err(LightningError::InvalidInvoice("preimage does not match payment hash".to_string()));
		}

		let mut invoices = self.invoices.lock().await;
		let record = invoices
			.get_mut(payment_hash_hex)
			.ok_or_else(|| LightningError::Backend("unknown invoice".to_string()))?;
		if record.settled {
			return Ok(());
		}
		record.settled = true;
		record.preimage = Some(preimage_bytes);
		let notification = PaymentReceived {
			bolt11: record.bolt11.clone(),
			payment_hash: payment_hash_hex.to_string(),
			preimage: preimage_bytes.to_lower_hex_string(),
		};
		let _ = record.notifier.send(notification).await;
		Ok(())
	}

	/// Re-delivers the already-stored notification for `payment_hash_hex`
	/// without changing settlement state, simulating an at-least-once
	/// redelivery from the backend.
	pub async fn redeliver(&self, payment_hash_hex: &str) -> Result<()> {
		let invoices = self.invoices.lock().await;
		let record = invoices
			.get(payment_hash_hex)
			.ok_or_else(|| LightningError::Backend("unknown invoice".to_string()))?;
		let preimage = record
			.preimage
			.ok_or_else(|| LightningError::Backend("invoice not yet settled".to_string()))?;
		let notification = PaymentReceived {
			bolt11: record.bolt11.clone(),
			payment_hash: payment_hash_hex.to_string(),
			preimage: preimage.to_lower_hex_string(),
		};
		let _ = record.notifier.send(notification).await;
		Ok(())
	}

	async fn pay(&self, bolt11: &str) -> Result<PaymentResult> {
		let decoded = crate::client::decode_invoice(bolt11)?;
		let mut invoices = self.invoices.lock().await;
		let record = invoices
			.get_mut(&decoded.payment_hash)
			.ok_or_else(|| LightningError::Backend("unknown invoice".to_string()))?;

		let preimage = record
			.preimage
			.ok_or_else(|| LightningError::Backend("invoice is HODL and not yet externally settled".to_string()))?;

		if !record.settled {
			record.settled = true;
			let notification = PaymentReceived {
				bolt11: record.bolt11.clone(),
				payment_hash: decoded.payment_hash.clone(),
				preimage: preimage.to_lower_hex_string(),
			};
			let _ = record.notifier.send(notification).await;
		}

		Ok(PaymentResult { preimage: preimage.to_lower_hex_string(), fees_paid_msat: 1000 })
	}
}

/// A single peer's connection to the simulated Lightning network.
pub struct MockLightningBackend {
	network: Arc<MockLightningNetwork>,
	node_secret_key: SecretKey,
	supports_hodl: bool,
	notifier_tx: mpsc::Sender<PaymentReceived>,
	notifier_rx: Mutex<Option<mpsc::Receiver<PaymentReceived>>>,
}

impl MockLightningBackend {
	pub fn new(network: Arc<MockLightningNetwork>, supports_hodl: bool) -> Self {
		let (tx, rx) = mpsc::channel(64);
		MockLightningBackend {
			network,
			node_secret_key: SecretKey::new(&mut rand::thread_rng()),
			supports_hodl,
			notifier_tx: tx,
			notifier_rx: Mutex::new(Some(rx)),
		}
	}

	pub fn network(&self) -> Arc<MockLightningNetwork> {
		self.network.clone()
	}

	fn build_invoice(&self, amount_msat: u64, payment_hash: [u8; 32], description: &str) -> Result<Bolt11Invoice> {
		let secp = Secp256k1::new();
		let hash = bitcoin_hashes::sha256::Hash::from_slice(&payment_hash)
			.map_err(|e| LightningError::InvalidInvoice(e.to_string()))?;

		let mut payment_secret_bytes = [0u8; 32];
		rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut payment_secret_bytes);

		InvoiceBuilder::new(Currency::Regtest)
			.description(description.to_string())
			.payment_hash(hash)
			.payment_secret(lightning_invoice::PaymentSecret(payment_secret_bytes))
			.current_timestamp()
			.min_final_cltv_expiry_delta(144)
			.amount_milli_satoshis(amount_msat)
			.expiry_time(Duration::from_secs(86400))
			.build_signed(|digest| secp.sign_ecdsa_recoverable(digest, &self.node_secret_key))
			.map_err(|e| LightningError::InvalidInvoice(e.to_string()))
	}
}

#[async_trait]
impl LightningClient for MockLightningBackend {
	fn supports_hodl_invoices(&self) -> bool {
		self.supports_hodl
	}

	async fn make_invoice(&self, amount_msat: u64, description: &str) -> Result<Invoice> {
		let mut preimage = [0u8; 32];
		rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut preimage);
		let payment_hash: [u8; 32] = Sha256::digest(preimage).into();
		let payment_hash_hex = payment_hash.to_lower_hex_string();

		let invoice = self.build_invoice(amount_msat, payment_hash, description)?;
		let bolt11 = invoice.to_string();

		self
			.network
			.register(payment_hash_hex.clone(), bolt11.clone(), Some(preimage), self.notifier_tx.clone())
			.await;

		Ok(Invoice {
			bolt11,
			payment_hash: payment_hash_hex,
			amount_msat: Some(amount_msat),
			expiry_unix: invoice
				.timestamp()
				.duration_since(std::time::UNIX_EPOCH)
				.map(|d| d.as_secs() + invoice.expiry_time().as_secs())
				.unwrap_or(0),
		})
	}

	async fn make_hodl_invoice(
		&self,
		amount_msat: u64,
		payment_hash_hex: &str,
		description: &str,
	) -> Result<Invoice> {
		if !self.supports_hodl {
			return Err(LightningError::HodlNotSupported);
		}
		let payment_hash = <[u8; 32]>::from_hex(payment_hash_hex)
			.map_err(|e| LightningError::InvalidInvoice(e.to_string()))?;

		let invoice = self.build_invoice(amount_msat, payment_hash, description)?;
		let bolt11 = invoice.to_string();

		self
			.network
			.register(payment_hash_hex.to_string(), bolt11.clone(), None, self.notifier_tx.clone())
			.await;

		Ok(Invoice {
			bolt11,
			payment_hash: payment_hash_hex.to_string(),
			amount_msat: Some(amount_msat),
			expiry_unix: invoice
				.timestamp()
				.duration_since(std::time::UNIX_EPOCH)
				.map(|d| d.as_secs() + invoice.expiry_time().as_secs())
				.unwrap_or(0),
		})
	}

	async fn pay_invoice(&self, bolt11: &str) -> Result<PaymentResult> {
		self.network.pay(bolt11).await
	}

	async fn payment_notifications(&self) -> mpsc::Receiver<PaymentReceived> {
		self
			.notifier_rx
			.lock()
			.await
			.take()
			.expect("payment_notifications called more than once per backend")
	}
}
