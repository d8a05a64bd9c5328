//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use noncekit_core::{
    ActionContext, FixedTimeSource, NonceConfig, NonceEngine, StaticSecretKey,
    DEFAULT_WINDOW_SECONDS,
};

/// Fixed 32-byte secret key used by tests.
pub const TEST_KEY: [u8; 32] = [0x5a; 32];

/// Unix time at the start of window `tick` for the default window length.
pub const fn start_of_tick(tick: u64) -> u64 {
    tick * DEFAULT_WINDOW_SECONDS
}

/// Builds an engine over a controllable clock positioned at `tick`.
pub fn engine_at_tick(tick: u64) -> (NonceEngine, Arc<FixedTimeSource>) {
    engine_with_key(tick, TEST_KEY.to_vec())
}

/// Builds an engine with the given key over a controllable clock positioned at `tick`.
pub fn engine_with_key(tick: u64, key: Vec<u8>) -> (NonceEngine, Arc<FixedTimeSource>) {
    let clock = Arc::new(FixedTimeSource::new(start_of_tick(tick)));
    let engine = NonceEngine::new(
        NonceConfig::default(),
        clock.clone(),
        &StaticSecretKey::new(key),
    )
    .expect("engine");
    (engine, clock)
}

/// Builds an action context for `action` and `identity`.
pub fn context(action: &str, identity: &str) -> ActionContext {
    ActionContext::new(action, Some("_wpnonce"), identity).expect("context")
}
