//! Mint adapter: a `MintClient` trait decoupling peer protocol logic from
//! transport, a `reqwest`-based real implementation, and an in-memory mock
//! mint performing genuine BDHKE signing for tests.

pub mod client;
pub mod error;
pub mod http;
pub mod keyset_cache;
pub mod mock;
pub mod verify;

pub use client::{Keyset, MintClient, ProofState, ProofStateEvent};
pub use error::{MintError, Result};
pub use http::HttpMintClient;
pub use keyset_cache::KeysetCache;
pub use mock::MockMint;
