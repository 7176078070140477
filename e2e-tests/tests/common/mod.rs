//! Shared harness for the receive/send scenario tests: three peers
//! (`alice`, `gateway`, `dealer`) sharing one in-memory mint, one in-memory
//! Lightning network, and one in-memory relay bus, wired up exactly the
//! way `gateway-node`'s own `main.rs` wires a real peer process.

use std::sync::Arc;

use gateway_lightning_client::{LightningClient, MockLightningBackend, MockLightningNetwork};
use gateway_messaging::{LoopbackRelay, RelayClient, RequestHandler};
use gateway_mint_client::MockMint;
use gateway_models::PeerRole;
use gateway_node::{Config, PeerContext};
use gateway_wallet::Wallet;
use hex::DisplayHex;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

pub const DEALER_FEE_SATS: u64 = 2;
pub const DEFAULT_LOCKTIME_SECS: u64 = 3_600;

pub fn denominations() -> Vec<u64> {
	(0..20).map(|i| 1u64 << i).collect()
}

pub struct Peer {
	pub ctx: Arc<PeerContext>,
	pub pubkey: PublicKey,
	pub dispatch_handle: tokio::task::JoinHandle<()>,
}

pub struct Harness {
	pub mint: Arc<MockMint>,
	pub lightning_network: Arc<MockLightningNetwork>,
	pub relay_bus: Arc<LoopbackRelay>,
	pub alice: Peer,
	pub gateway: Peer,
	pub dealer: Peer,
}

fn spawn_peer(
	role: PeerRole,
	name: &str,
	mint: Arc<MockMint>,
	lightning: Arc<dyn LightningClient>,
	relay_bus: Arc<LoopbackRelay>,
	dealer_fee_sats: Option<u64>,
) -> Peer {
	let secp = Secp256k1::new();
	let secret_key = SecretKey::new(&mut rand::thread_rng());
	let pubkey = PublicKey::from_secret_key(&secp, &secret_key);

	let config = Config {
		role,
		name: name.to_string(),
		secret_key_hex: secret_key.secret_bytes().to_lower_hex_string(),
		mint_url: "https://mint.example".to_string(),
		relay_url: "https://relay.example".to_string(),
		lightning_rpc_uri: "https://ln.example".to_string(),
		lightning_supports_hodl: lightning.supports_hodl_invoices(),
		default_locktime_secs: DEFAULT_LOCKTIME_SECS,
		dealer_fee_sats,
	};

	let wallet = Arc::new(Wallet::new(secret_key, mint));
	let relay = Arc::new(RelayClient::new(pubkey, relay_bus));
	let ctx = Arc::new(PeerContext::new(config, wallet, lightning, relay.clone()));
	let dispatch_handle = tokio::spawn(Arc::clone(&relay).run(Arc::clone(&ctx) as Arc<dyn RequestHandler>));

	Peer { ctx, pubkey, dispatch_handle }
}

impl Harness {
	/// Builds `alice`/`gateway`/`dealer` sharing one mint, one Lightning
	/// network, and one relay bus. `gateway`'s payment-notification stream
	/// is pumped into `handle_payment_received` the same way `main.rs`'s
	/// `select!` loop does, so settling an invoice through
	/// `lightning_network` drives the rest of the protocol automatically.
	pub async fn new() -> Self {
		let mint = Arc::new(MockMint::new("00deadbeef123456", "sat", &denominations()));
		let lightning_network = MockLightningNetwork::new();
		let relay_bus = LoopbackRelay::new();

		let alice = spawn_peer(
			PeerRole::A,
			"alice",
			mint.clone(),
			Arc::new(MockLightningBackend::new(lightning_network.clone(), true)),
			relay_bus.clone(),
			None,
		);

		let gateway_lightning = Arc::new(MockLightningBackend::new(lightning_network.clone(), true));
		let gateway = spawn_peer(
			PeerRole::G,
			"gateway",
			mint.clone(),
			gateway_lightning.clone(),
			relay_bus.clone(),
			None,
		);

		let dealer = spawn_peer(
			PeerRole::D,
			"dealer",
			mint.clone(),
			Arc::new(MockLightningBackend::new(lightning_network.clone(), true)),
			relay_bus.clone(),
			Some(DEALER_FEE_SATS),
		);

		let mut payment_notifications = gateway_lightning.payment_notifications().await;
		let gateway_ctx = gateway.ctx.clone();
		tokio::spawn(async move {
			while let Some(notification) = payment_notifications.recv().await {
				if let Err(e) = gateway_ctx.handle_payment_received(notification).await {
					log::debug!("handle_payment_received returned an error in test harness: {e}");
				}
			}
		});

		// let every dispatch loop register its inbox before a test sends anything.
		tokio::task::yield_now().await;

		Harness { mint, lightning_network, relay_bus, alice, gateway, dealer }
	}

	pub async fn fund_gateway(&self, amount: u64) {
		fund(self.gateway.ctx.wallet(), &self.mint, amount).await;
	}

	/// Simulates the dealer going offline: its relay dispatch loop stops
	/// consuming its inbox, so any subsequent call addressed to it times out
	/// instead of getting answered.
	pub fn disconnect_dealer(&self) {
		self.dealer.dispatch_handle.abort();
	}
}

/// Mints `amount` sats of fresh, self-locked proofs directly into `wallet`,
/// standing in for the out-of-scope mint-against-lightning-quote flow
/// (`spec.md` §1) so tests can start a peer with a starting balance.
pub async fn fund(wallet: &Wallet, mint: &MockMint, amount: u64) {
	let lock = wallet.self_lock();
	let (_id, outputs) = wallet.prepare_locked_outputs(amount, &lock).await.unwrap();
	let blinded = gateway_core::to_blinded_messages(&outputs);
	let signatures = mint.issue(&blinded).unwrap();
	wallet.unblind(&outputs, &signatures, true).await.unwrap();
}
