//! Cryptographic primitives, well-known secret/witness encoding, blinded
//! output construction, SIG_ALL signing, and local proof bookkeeping shared
//! by every peer role (payer, gateway, dealer) in the protocol.

pub mod blinded_output;
pub mod crypto;
pub mod error;
pub mod proof;
pub mod secret;
pub mod sigall;
pub mod store;
pub mod witness;

pub use blinded_output::{LockSpec, OutputData, generate_outputs, split_amount, to_blinded_messages};
pub use error::{Error, Result};
pub use proof::{BlindedMessage, BlindedSignature, Proof};
pub use secret::{Secret, SecretData, SigFlag, Tags};
pub use store::LocalProofStore;
pub use witness::Witness;
