//! `NonceKit` issues and checks short-lived, action-scoped nonces for CSRF
//! protection.
//!
//! A token is a truncated HMAC over the current time window, the protected
//! action and the caller identity. It stays valid for the window it was
//! issued in and, by default, the following one, without anything being
//! stored server-side.
//!
//! ```rust
//! use std::sync::Arc;
//! use noncekit_core::{
//!     ActionContext, NonceConfig, NonceEngine, StaticSecretKey, SystemTimeSource,
//! };
//!
//! let engine = NonceEngine::new(
//!     NonceConfig::default(),
//!     Arc::new(SystemTimeSource),
//!     &StaticSecretKey::new(b"a long and random deployment secret".to_vec()),
//! )
//! .unwrap();
//!
//! let ctx = ActionContext::new("delete-post-42", Some("_wpnonce"), "user:7").unwrap();
//! let link = engine.append_to_url("https://example.com/post.php?post=42", &ctx).unwrap();
//! assert!(engine.verify_url(&link, &ctx).unwrap().is_valid());
//! ```
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod clock;
pub use clock::*;

mod codec;
pub use codec::*;

mod config;
pub use config::*;

mod context;
pub use context::*;

mod engine;
pub use engine::*;

mod error;
pub use error::*;

mod secret;
pub use secret::*;

/// Bridge from the `log` facade to a host-supplied logger.
pub mod logger;

// private modules
mod embed;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("noncekit_core");
