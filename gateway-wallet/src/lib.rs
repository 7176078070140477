//! Wallet-level operations that produce and consume receive/send contracts
//! (`spec.md` §1): preparing locked blinded outputs, unblinding a mint's
//! signatures back into spendable proofs, and selecting+signing a peer's
//! own existing proofs as swap inputs. Deliberately ignorant of messaging
//! and of *which* role (A, G, D) is calling it — the peer state machines in
//! `gateway-node` compose these primitives into the actual receive/send
//! flows.

pub mod error;
pub mod wallet;

pub use error::{Result, WalletError};
pub use wallet::Wallet;
