//! Encrypted-relay messaging layer: correlates request/response pairs sent
//! over an authenticated, best-effort pub/sub channel (`spec.md` §4.4).
//! Encryption and routing are the relay's job, modeled here only as
//! `RelayTransport::send`/`register`; this crate adds the request id,
//! timeout, and dispatch plumbing on top.

pub mod client;
pub mod error;
pub mod http;
pub mod mock;
pub mod transport;

pub use client::{RelayClient, RequestHandler};
pub use error::{MessagingError, Result};
pub use http::HttpRelayTransport;
pub use mock::LoopbackRelay;
pub use transport::{Envelope, RelayTransport};
