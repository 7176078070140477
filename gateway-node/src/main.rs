use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gateway_lightning_client::HttpLightningClient;
use gateway_messaging::{HttpRelayTransport, RelayClient};
use gateway_mint_client::HttpMintClient;
use gateway_node::{Config, PeerContext};
use gateway_wallet::Wallet;
use tokio::signal::unix::SignalKind;

const USAGE_GUIDE: &str = "Usage: gateway-node <config_path>";

fn main() {
	env_logger::init();

	let args: Vec<String> = std::env::args().collect();
	if args.len() < 2 {
		eprintln!("{USAGE_GUIDE}");
		std::process::exit(-1);
	}

	let arg = args[1].as_str();
	if arg == "-h" || arg == "--help" {
		println!("{}", USAGE_GUIDE);
		std::process::exit(0);
	}

	let config = match Config::from_file(Path::new(arg)) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Invalid configuration file: {e}");
			std::process::exit(-1);
		}
	};

	let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
		Ok(runtime) => Arc::new(runtime),
		Err(e) => {
			eprintln!("Failed to setup tokio runtime: {e}");
			std::process::exit(-1);
		}
	};

	let secret_key = match config.secret_key() {
		Ok(key) => key,
		Err(e) => {
			eprintln!("Invalid secret_key_hex: {e}");
			std::process::exit(-1);
		}
	};

	let secp = secp256k1::Secp256k1::new();
	let pubkey = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
	println!("PEER_PUBKEY: {pubkey}");

	let mint = Arc::new(HttpMintClient::new(config.mint_url.clone()));
	let wallet = Arc::new(Wallet::new(secret_key, mint));
	let lightning = Arc::new(HttpLightningClient::new(
		config.lightning_rpc_uri.clone(),
		config.lightning_supports_hodl,
	));
	let relay_transport = Arc::new(HttpRelayTransport::new(config.relay_url.clone()));
	let relay = Arc::new(RelayClient::new(pubkey, relay_transport));

	let ctx = Arc::new(PeerContext::new(config, wallet, lightning, relay.clone()));

	runtime.block_on(async {
		let mut sigterm_stream = match tokio::signal::unix::signal(SignalKind::terminate()) {
			Ok(stream) => stream,
			Err(e) => {
				eprintln!("Failed to register for SIGTERM stream: {e}");
				std::process::exit(-1);
			}
		};

		tokio::spawn(Arc::clone(&relay).run(Arc::clone(&ctx) as Arc<dyn gateway_messaging::RequestHandler>));

		let is_gateway = matches!(ctx.config().role(), gateway_models::PeerRole::G);
		let mut payment_notifications = if is_gateway {
			Some(ctx.lightning().payment_notifications().await)
		} else {
			None
		};
		let mut reclaim_tick = tokio::time::interval(Duration::from_secs(60));

		println!("gateway-node started as {:?} ({})", ctx.config().role(), ctx.config().name);

		loop {
			tokio::select! {
				notification = recv_payment(&mut payment_notifications) => {
					if let Some(notification) = notification {
						if let Err(e) = ctx.handle_payment_received(notification).await {
							log::error!("failed to handle payment_received: {e}");
						}
					}
				}
				_ = reclaim_tick.tick(), if is_gateway => {
					if let Err(e) = ctx.reclaim_expired_mints(gateway_node::now_unix()).await {
						log::error!("failed to reclaim expired mints: {e}");
					}
				}
				_ = sigterm_stream.recv() => {
					println!("Received SIGTERM, shutting down..");
					break;
				}
				_ = tokio::signal::ctrl_c() => {
					println!("Received CTRL-C, shutting down..");
					break;
				}
			}
		}
	});
}

/// Awaits the next notification when this peer is G and has a receiver;
/// never resolves otherwise, so the `select!` arm simply never fires for
/// A/D.
async fn recv_payment(
	receiver: &mut Option<tokio::sync::mpsc::Receiver<gateway_lightning_client::PaymentReceived>>,
) -> Option<gateway_lightning_client::PaymentReceived> {
	match receiver {
		Some(rx) => rx.recv().await,
		None => std::future::pending::<Option<gateway_lightning_client::PaymentReceived>>().await,
	}
}
