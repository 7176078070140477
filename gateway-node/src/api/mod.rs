//! The six peer RPC method handlers (`spec.md` §4.5). Every role answers
//! every method uniformly — `PeerContext::handle` dispatches by name rather
//! than gating registration by role, mirroring how a single service layer
//! answers every route regardless of which are meaningful for a given
//! deployment.

pub mod blinded_signatures;
pub mod info;
pub mod make_invoice;
pub mod pay_invoice;
pub mod request_dealer_fee;
pub mod swap_htlc;
