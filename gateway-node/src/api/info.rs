//! `info` (`spec.md` §4.5): the one method every role answers identically.

use gateway_models::InfoResponse;
use secp256k1::PublicKey;
use serde_json::Value;

use crate::error::Result;
use crate::service::PeerContext;
use crate::time::now_unix;

pub async fn handle(ctx: &PeerContext, _from: PublicKey, _params: Value) -> Result<Value> {
	let response = InfoResponse { role: ctx.config().role(), name: ctx.config().name.clone(), timestamp: now_unix() };
	Ok(serde_json::to_value(response)?)
}
