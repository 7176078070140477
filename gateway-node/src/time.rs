//! Wall-clock plumbing used to stamp and expire pending protocol state.
//! Process glue (`spec.md` §1); kept as a single function so the rest of
//! the crate never reaches for `SystemTime` directly.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_unix() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock is before the Unix epoch").as_secs()
}
