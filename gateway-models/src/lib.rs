//! Wire DTOs for the gateway JSON-RPC protocol, kept separate from
//! `gateway_core`'s internal types so the wire contract is free to diverge
//! from the in-process representation.

pub mod methods;
pub mod rpc;
pub mod token;

pub use methods::*;
pub use rpc::{ERROR_INTERNAL, ERROR_INVALID_PARAMS, ERROR_METHOD_NOT_FOUND, RpcError, RpcRequest, RpcResponse};
pub use token::{TokenEnvelope, TokenError};
