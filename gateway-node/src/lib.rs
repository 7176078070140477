//! Library surface for a single peer process implementing the A/G/D roles
//! of `spec.md`'s three-party swap protocol. `gateway-node`'s own `main.rs`
//! wires this into a long-running daemon; `gateway-cli` depends on it
//! directly to reuse `Config`, `PeerContext`, and the pending-request maps
//! for the flow-initiating commands a CLI invocation drives synchronously.

pub mod api;
pub mod config;
pub mod error;
pub mod pending;
pub mod service;
pub mod time;
pub mod tracker;

pub use config::Config;
pub use error::{NodeError, Result};
pub use pending::{
	Expiring, PendingDealerFee, PendingGatewayMint, PendingHtlcRequest, PendingMap, PendingReceiveRequest,
};
pub use service::{PeerContext, ReceiveHandle};
pub use time::now_unix;
pub use tracker::ProofStateTracker;
