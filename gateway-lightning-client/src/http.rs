//! Real wallet-connect-like adapter: request/response over `reqwest`,
//! notifications via a polling loop. No websocket dependency is introduced
//! since nothing in the example pack shows a teacher using one for this
//! purpose.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::client::{decode_invoice, Invoice, LightningClient, PaymentReceived, PaymentResult};
use crate::error::{LightningError, Result};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct MakeInvoiceRequest {
	amount_msat: u64,
	description: String,
}

#[derive(Debug, Serialize)]
struct MakeHodlInvoiceRequest {
	amount_msat: u64,
	payment_hash: String,
	description: String,
}

#[derive(Debug, Deserialize)]
struct MakeInvoiceResponse {
	bolt11: String,
}

#[derive(Debug, Serialize)]
struct PayInvoiceRequest {
	bolt11: String,
}

#[derive(Debug, Deserialize)]
struct PayInvoiceResponse {
	preimage: String,
	fees_paid_msat: u64,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
	payments: Vec<PollPayment>,
}

#[derive(Debug, Deserialize)]
struct PollPayment {
	bolt11: String,
	payment_hash: String,
	preimage: String,
}

pub struct HttpLightningClient {
	rpc_uri: String,
	http: reqwest::Client,
	supports_hodl: bool,
}

impl HttpLightningClient {
	pub fn new(rpc_uri: impl Into<String>, supports_hodl: bool) -> Self {
		HttpLightningClient { rpc_uri: rpc_uri.into(), http: reqwest::Client::new(), supports_hodl }
	}
}

#[async_trait]
impl LightningClient for HttpLightningClient {
	fn supports_hodl_invoices(&self) -> bool {
		self.supports_hodl
	}

	async fn make_invoice(&self, amount_msat: u64, description: &str) -> Result<Invoice> {
		let url = format!("{}/makeInvoice", self.rpc_uri);
		let body = MakeInvoiceRequest { amount_msat, description: description.to_string() };
		let response: MakeInvoiceResponse = self
			.http
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(|e| LightningError::Transport(e.to_string()))?
			.json()
			.await
			.map_err(|e| LightningError::Transport(e.to_string()))?;

		let decoded = decode_invoice(&response.bolt11)?;
		Ok(Invoice {
			bolt11: response.bolt11,
			payment_hash: decoded.payment_hash,
			amount_msat: decoded.amount_msat,
			expiry_unix: decoded.expiry_unix,
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
		let url = format!("{}/makeHodlInvoice", self.rpc_uri);
		let body = MakeHodlInvoiceRequest {
			amount_msat,
			payment_hash: payment_hash_hex.to_string(),
			description: description.to_string(),
		};
		let response: MakeInvoiceResponse = self
			.http
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(|e| LightningError::Transport(e.to_string()))?
			.json()
			.await
			.map_err(|e| LightningError::Transport(e.to_string()))?;

		let decoded = decode_invoice(&response.bolt11)?;
		Ok(Invoice {
			bolt11: response.bolt11,
			payment_hash: decoded.payment_hash,
			amount_msat: decoded.amount_msat,
			expiry_unix: decoded.expiry_unix,
		})
	}

	async fn pay_invoice(&self, bolt11: &str) -> Result<PaymentResult> {
		let url = format!("{}/payInvoice", self.rpc_uri);
		let body = PayInvoiceRequest { bolt11: bolt11.to_string() };
		let response: PayInvoiceResponse = self
			.http
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(|e| LightningError::Transport(e.to_string()))?
			.json()
			.await
			.map_err(|e| LightningError::Transport(e.to_string()))?;

		Ok(PaymentResult { preimage: response.preimage, fees_paid_msat: response.fees_paid_msat })
	}

	async fn payment_notifications(&self) -> mpsc::Receiver<PaymentReceived> {
		let (tx, rx) = mpsc::channel(64);
		let url = format!("{}/pollPayments", self.rpc_uri);
		let http = self.http.clone();

		tokio::spawn(async move {
			let mut seen = std::collections::HashSet::new();
			loop {
				if let Ok(response) = http.get(&url).send().await {
					if let Ok(parsed) = response.json::<PollResponse>().await {
						for payment in parsed.payments {
							if seen.insert(payment.preimage.clone()) {
								let notification = PaymentReceived {
									bolt11: payment.bolt11,
									payment_hash: payment.payment_hash,
									preimage: payment.preimage,
								};
								if tx.send(notification).await.is_err() {
									return;
								}
							}
						}
					}
				}
				tokio::time::sleep(POLL_INTERVAL).await;
			}
		});

		rx
	}
}
