//! Thin CLI surface (`spec.md` §6): `balance`, `receive <token>`,
//! `receive <amount> <gateway_pubkey> <dealer_pubkey>`,
//! `pay <invoice> <gateway_pubkey> [amount]`, `info <pubkey>`, `pk`.
//!
//! There is no separate network server to talk to in this design (the
//! `Peer` *is* the wallet) — `gateway-cli` wires up the same `Config` a
//! `gateway-node` process would, drives one command to completion against
//! an in-process `PeerContext`, and exits. The relay dispatch loop still
//! has to run for the duration of the command so that `blinded_signatures`
//! or a reply to an outgoing `call` can be delivered (`spec.md` §9: A must
//! actually receive D's forwarded signatures to finish a receive flow).

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gateway_lightning_client::HttpLightningClient;
use gateway_messaging::{HttpRelayTransport, RelayClient, RequestHandler};
use gateway_mint_client::HttpMintClient;
use gateway_models::token::TokenEnvelope;
use gateway_models::{InfoResponse, METHOD_INFO};
use gateway_node::{Config, PeerContext};
use gateway_wallet::Wallet;
use secp256k1::PublicKey;

/// How long a CLI invocation waits for a pending receive to resolve before
/// giving up and reporting it as still-in-flight.
const RECEIVE_AWAIT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Parser)]
#[command(name = "gateway-cli", about = "Operate one peer's wallet in the Cashu/Lightning gateway protocol")]
struct Cli {
	/// Path to the peer's TOML configuration file.
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Prints this wallet's current balance in sats.
	Balance,
	/// Either `receive <token>` (redeem an encoded Cashu token) or
	/// `receive <amount> <gateway_pubkey> <dealer_pubkey>` (request a fresh
	/// Lightning-in invoice).
	Receive {
		#[arg(num_args = 1..=3)]
		args: Vec<String>,
	},
	/// Pays a BOLT11 invoice through the named gateway, spending a freshly
	/// built HTLC token.
	Pay {
		invoice: String,
		gateway_pubkey: String,
		amount: Option<u64>,
	},
	/// Queries a peer's `info` method.
	Info { pubkey: String },
	/// Prints this wallet's own public key.
	Pk,
}

fn main() {
	env_logger::init();
	let cli = Cli::parse();

	let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
		Ok(rt) => rt,
		Err(e) => fail(&format!("failed to start runtime: {e}")),
	};

	let code = runtime.block_on(run(cli));
	std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
	let config = match Config::from_file(&cli.config) {
		Ok(c) => c,
		Err(e) => return report_err(&format!("invalid configuration file: {e}")),
	};

	let secret_key = match config.secret_key() {
		Ok(k) => k,
		Err(e) => return report_err(&format!("invalid secret_key_hex: {e}")),
	};

	let secp = secp256k1::Secp256k1::new();
	let pubkey = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);

	let mint = Arc::new(HttpMintClient::new(config.mint_url.clone()));
	let wallet = Arc::new(Wallet::new(secret_key, mint));
	let lightning =
		Arc::new(HttpLightningClient::new(config.lightning_rpc_uri.clone(), config.lightning_supports_hodl));
	let relay_transport = Arc::new(HttpRelayTransport::new(config.relay_url.clone()));
	let relay = Arc::new(RelayClient::new(pubkey, relay_transport));
	let ctx = Arc::new(PeerContext::new(config, wallet, lightning, relay.clone()));

	let dispatch = tokio::spawn(Arc::clone(&relay).run(Arc::clone(&ctx) as Arc<dyn RequestHandler>));

	let result = match cli.command {
		Command::Balance => balance(&ctx).await,
		Command::Receive { args } => receive(&ctx, args).await,
		Command::Pay { invoice, gateway_pubkey, amount } => pay(&ctx, &invoice, &gateway_pubkey, amount).await,
		Command::Info { pubkey } => info(&relay, &pubkey).await,
		Command::Pk => {
			println!("{}", ctx.wallet().pubkey_hex());
			Ok(())
		}
	};

	dispatch.abort();

	match result {
		Ok(()) => 0,
		Err(message) => report_err(&message),
	}
}

async fn balance(ctx: &PeerContext) -> Result<(), String> {
	println!("{}", ctx.wallet().balance().await);
	Ok(())
}

async fn receive(ctx: &PeerContext, args: Vec<String>) -> Result<(), String> {
	match args.as_slice() {
		[token] => {
			let envelope = TokenEnvelope::decode(token).map_err(|e| format!("invalid token: {e}"))?;
			let total = ctx.wallet().receive_token(&envelope).await.map_err(|e| e.to_string())?;
			println!("received {total} sats");
			Ok(())
		}
		[amount, gateway_pubkey, dealer_pubkey] => {
			let amount: u64 = amount.parse().map_err(|_| format!("invalid amount: {amount}"))?;
			let gateway_pubkey = parse_pubkey(gateway_pubkey)?;
			let dealer_pubkey = parse_pubkey(dealer_pubkey)?;

			let handle = ctx
				.initiate_receive(amount, gateway_pubkey, dealer_pubkey)
				.await
				.map_err(|e| e.to_string())?;
			println!("invoice: {}", handle.invoice);
			println!("awaiting settlement...");

			let balance = ctx
				.await_receive(&handle.preimage_hash, RECEIVE_AWAIT_TIMEOUT)
				.await
				.map_err(|e| e.to_string())?;
			println!("receive complete, balance: {balance}");
			Ok(())
		}
		_ => Err("usage: receive <token> | receive <amount> <gateway_pubkey> <dealer_pubkey>".to_string()),
	}
}

async fn pay(ctx: &PeerContext, invoice: &str, gateway_pubkey: &str, amount: Option<u64>) -> Result<(), String> {
	let gateway_pubkey = parse_pubkey(gateway_pubkey)?;
	let result = ctx.initiate_send(invoice, gateway_pubkey, amount).await.map_err(|e| e.to_string())?;
	println!("preimage: {}", result.preimage);
	println!("fees paid: {} sats", result.fees_paid);
	Ok(())
}

async fn info(relay: &RelayClient, pubkey: &str) -> Result<(), String> {
	let target = parse_pubkey(pubkey)?;
	let value = relay.call(target, METHOD_INFO, serde_json::json!({})).await.map_err(|e| e.to_string())?;
	let response: InfoResponse = serde_json::from_value(value).map_err(|e| e.to_string())?;
	println!("{}", serde_json::to_string_pretty(&response).expect("InfoResponse serializes"));
	Ok(())
}

fn parse_pubkey(s: &str) -> Result<PublicKey, String> {
	PublicKey::from_str(s).map_err(|e| format!("invalid pubkey {s}: {e}"))
}

fn report_err(message: &str) -> i32 {
	eprintln!("error: {message}");
	1
}

fn fail(message: &str) -> ! {
	eprintln!("error: {message}");
	std::process::exit(1);
}
