//! The JSON-RPC-shaped envelope carried over the encrypted relay: a request
//! is `{method, params}`, a response is either `{result}` or
//! `{error: {code, message, data?}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unknown method name was dispatched.
pub const ERROR_METHOD_NOT_FOUND: i64 = -32601;
/// Params failed to deserialize into the expected request type, or failed
/// their own validation (bad hex, amount mismatch, ...).
pub const ERROR_INVALID_PARAMS: i64 = -32602;
/// The handler itself failed after params were accepted (protocol-state or
/// mint-side failure).
pub const ERROR_INTERNAL: i64 = -32603;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
	pub method: String,
	pub params: Value,
	/// Correlates a response back to this request; generated by the caller.
	pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcResponse {
	Result { id: String, result: Value },
	Error { id: String, error: RpcError },
}

impl RpcResponse {
	pub fn ok(id: impl Into<String>, result: Value) -> Self {
		RpcResponse::Result { id: id.into(), result }
	}

	pub fn err(id: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
		RpcResponse::Error {
			id: id.into(),
			error: RpcError { code, message: message.into(), data: None },
		}
	}

	pub fn id(&self) -> &str {
		match self {
			RpcResponse::Result { id, .. } => id,
			RpcResponse::Error { id, .. } => id,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_round_trips() {
		let req = RpcRequest {
			method: "info".to_string(),
			params: serde_json::json!({}),
			id: "req-1".to_string(),
		};
		let s = serde_json::to_string(&req).unwrap();
		let parsed: RpcRequest = serde_json::from_str(&s).unwrap();
		assert_eq!(parsed.method, "info");
	}

	#[test]
	fn error_response_carries_standard_code() {
		let resp = RpcResponse::err("req-1", ERROR_METHOD_NOT_FOUND, "unknown method");
		let s = serde_json::to_string(&resp).unwrap();
		assert!(s.contains("-32601"));
	}
}
