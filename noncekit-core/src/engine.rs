//! Nonce creation and verification.

use std::sync::Arc;

use crate::{
    clock::{Tick, TickClock, TimeSource},
    codec::{Token, TokenCodec},
    config::NonceConfig,
    context::ActionContext,
    error::{NonceError, NonceResult},
    secret::{SecretKey, SecretKeyProvider},
};

/// Outcome of verifying a presented token.
///
/// `Invalid` is an expected answer, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum VerifyResult {
    /// The token was issued in the current window.
    ValidRecent,
    /// The token was issued in an earlier window that is still accepted.
    ValidAging,
    /// The token matches no accepted window.
    Invalid,
}

impl VerifyResult {
    /// Whether the token should be accepted.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::ValidRecent | Self::ValidAging)
    }
}

/// Creates and verifies action-scoped nonces.
///
/// The engine holds only read-only state, so one instance can be shared
/// across threads behind an `Arc`.
///
/// ```rust
/// use std::sync::Arc;
/// use noncekit_core::{
///     ActionContext, FixedTimeSource, NonceConfig, NonceEngine, StaticSecretKey, VerifyResult,
/// };
///
/// let clock = Arc::new(FixedTimeSource::new(1_700_000_000));
/// let engine = NonceEngine::new(
///     NonceConfig::default(),
///     clock.clone(),
///     &StaticSecretKey::new(vec![0x42; 32]),
/// )
/// .unwrap();
///
/// let ctx = ActionContext::new("delete-post-42", Some("_wpnonce"), "user:7").unwrap();
/// let token = engine.create(&ctx).unwrap();
/// assert_eq!(engine.verify(token.as_str(), &ctx).unwrap(), VerifyResult::ValidRecent);
///
/// clock.advance(2 * 43_200);
/// assert_eq!(engine.verify(token.as_str(), &ctx).unwrap(), VerifyResult::Invalid);
/// ```
pub struct NonceEngine {
    config: NonceConfig,
    clock: TickClock,
    codec: TokenCodec,
    key: SecretKey,
}

impl NonceEngine {
    /// Validates `config`, loads the secret key and builds an engine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an out-of-range configuration, and
    /// `MissingSecretKey` or `InvalidSecretKey` if the provider cannot supply a key.
    pub fn new(
        config: NonceConfig,
        time_source: Arc<dyn TimeSource>,
        key_provider: &dyn SecretKeyProvider,
    ) -> NonceResult<Self> {
        config.validate()?;
        let clock = TickClock::new(time_source, config.window_seconds)?;
        let key = key_provider.load_secret_key()?;
        Self::from_parts(config, clock, key)
    }

    /// Builds an engine from an already constructed clock and key.
    ///
    /// The clock's window length overrides `config.window_seconds`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an out-of-range configuration.
    pub fn from_parts(
        mut config: NonceConfig,
        clock: TickClock,
        key: SecretKey,
    ) -> NonceResult<Self> {
        config.window_seconds = clock.window_seconds();
        config.validate()?;
        let codec = TokenCodec::new(config.encoding, config.token_length)?;

        log::info!(
            "nonce engine ready: window={}s lifetime_windows={} encoding={} token_length={}",
            config.window_seconds,
            config.lifetime_windows,
            config.encoding,
            config.token_length
        );

        Ok(Self {
            config,
            clock,
            codec,
            key,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &NonceConfig {
        &self.config
    }

    /// The clock ticks are read from.
    #[must_use]
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Creates a token for `ctx` in the current window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` if the configuration requires an identity and `ctx` has none.
    pub fn create(&self, ctx: &ActionContext) -> NonceResult<Token> {
        self.create_at(ctx, self.clock.current_tick())
    }

    /// Creates the token `ctx` would receive in window `tick`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` if the configuration requires an identity and `ctx` has none.
    pub fn create_at(&self, ctx: &ActionContext, tick: Tick) -> NonceResult<Token> {
        self.check_identity(ctx)?;
        Ok(self.derive(ctx, tick))
    }

    /// Verifies `token` against `ctx`.
    ///
    /// The current window is checked first, then each earlier accepted window
    /// in turn. Comparisons are constant-time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` if the configuration requires an identity and `ctx` has none.
    /// A token that does not match is reported as [`VerifyResult::Invalid`], never as an error.
    pub fn verify(&self, token: &str, ctx: &ActionContext) -> NonceResult<VerifyResult> {
        self.check_identity(ctx)?;

        let result = self.verify_at(token, ctx, self.clock.current_tick());
        log::debug!(
            "nonce verification for action={} name={}: {result:?}",
            ctx.action(),
            ctx.name()
        );
        Ok(result)
    }

    fn verify_at(&self, token: &str, ctx: &ActionContext, current: Tick) -> VerifyResult {
        if token.len() != self.codec.token_length() {
            return VerifyResult::Invalid;
        }

        for age in 0..u64::from(self.config.lifetime_windows) {
            let Some(tick) = current.checked_back(age) else {
                break;
            };
            if TokenCodec::matches(token, &self.derive(ctx, tick)) {
                return if age == 0 {
                    VerifyResult::ValidRecent
                } else {
                    VerifyResult::ValidAging
                };
            }
        }
        VerifyResult::Invalid
    }

    fn derive(&self, ctx: &ActionContext, tick: Tick) -> Token {
        self.codec
            .derive(tick, ctx.action(), ctx.identity(), &self.key)
    }

    fn check_identity(&self, ctx: &ActionContext) -> NonceResult<()> {
        if self.config.require_identity && ctx.identity().is_empty() {
            return Err(NonceError::InvalidIdentity);
        }
        Ok(())
    }
}

impl std::fmt::Debug for NonceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceEngine")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{clock::FixedTimeSource, secret::StaticSecretKey, Action};

    use super::*;

    const WINDOW: u64 = 43_200;

    fn engine_with(config: NonceConfig) -> (NonceEngine, Arc<FixedTimeSource>) {
        let source = Arc::new(FixedTimeSource::new(1_000 * WINDOW));
        let engine = NonceEngine::new(config, source.clone(), &StaticSecretKey::new(vec![1; 32]))
            .expect("engine");
        (engine, source)
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let result = NonceEngine::new(
            NonceConfig::default(),
            Arc::new(FixedTimeSource::new(0)),
            &StaticSecretKey::new(Vec::new()),
        );
        match result {
            Err(NonceError::MissingSecretKey(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = NonceConfig {
            lifetime_windows: 0,
            ..NonceConfig::default()
        };
        let result = NonceEngine::new(
            config,
            Arc::new(FixedTimeSource::new(0)),
            &StaticSecretKey::new(vec![1; 32]),
        );
        assert!(matches!(result, Err(NonceError::InvalidConfig { .. })));
    }

    #[test]
    fn test_identity_policy() {
        let (engine, _) = engine_with(NonceConfig {
            require_identity: true,
            ..NonceConfig::default()
        });
        let anonymous = ActionContext::new("edit", None, "").expect("ctx");
        assert_eq!(engine.create(&anonymous), Err(NonceError::InvalidIdentity));
        assert_eq!(
            engine.verify("0123456789", &anonymous),
            Err(NonceError::InvalidIdentity)
        );

        let (lenient, _) = engine_with(NonceConfig::default());
        let token = lenient.create(&anonymous).expect("token");
        assert_eq!(
            lenient.verify(token.as_str(), &anonymous),
            Ok(VerifyResult::ValidRecent)
        );
    }

    #[test]
    fn test_wrong_length_is_invalid() {
        let (engine, _) = engine_with(NonceConfig::default());
        let ctx = ActionContext::new("edit", None, "user:1").expect("ctx");
        let token = engine.create(&ctx).expect("token");
        let longer = format!("{token}0");

        assert_eq!(engine.verify("", &ctx), Ok(VerifyResult::Invalid));
        assert_eq!(engine.verify(&longer, &ctx), Ok(VerifyResult::Invalid));
    }

    #[test]
    fn test_lifetime_windows_extend_aging() {
        let (engine, source) = engine_with(NonceConfig {
            lifetime_windows: 3,
            ..NonceConfig::default()
        });
        let ctx = ActionContext::new(Action::Tag(9), None, "user:1").expect("ctx");
        let token = engine.create(&ctx).expect("token");

        source.advance(WINDOW);
        assert_eq!(engine.verify(token.as_str(), &ctx), Ok(VerifyResult::ValidAging));
        source.advance(WINDOW);
        assert_eq!(engine.verify(token.as_str(), &ctx), Ok(VerifyResult::ValidAging));
        source.advance(WINDOW);
        assert_eq!(engine.verify(token.as_str(), &ctx), Ok(VerifyResult::Invalid));
    }

    #[test]
    fn test_single_window_never_ages() {
        let (engine, source) = engine_with(NonceConfig {
            lifetime_windows: 1,
            ..NonceConfig::default()
        });
        let ctx = ActionContext::new("edit", None, "user:1").expect("ctx");
        let token = engine.create(&ctx).expect("token");

        source.advance(WINDOW);
        assert_eq!(engine.verify(token.as_str(), &ctx), Ok(VerifyResult::Invalid));
    }

    #[test]
    fn test_tokens_from_the_future_are_invalid() {
        let (engine, _) = engine_with(NonceConfig::default());
        let ctx = ActionContext::new("edit", None, "user:1").expect("ctx");
        let future = engine.create_at(&ctx, Tick(1_001)).expect("token");
        assert_eq!(engine.verify(future.as_str(), &ctx), Ok(VerifyResult::Invalid));
    }

    #[test]
    fn test_tick_zero_only_checks_current_window() {
        let source = Arc::new(FixedTimeSource::new(0));
        let engine = NonceEngine::new(
            NonceConfig::default(),
            source,
            &StaticSecretKey::new(vec![1; 32]),
        )
        .expect("engine");
        let ctx = ActionContext::new("edit", None, "user:1").expect("ctx");
        let token = engine.create(&ctx).expect("token");
        assert_eq!(engine.verify(token.as_str(), &ctx), Ok(VerifyResult::ValidRecent));
    }

    #[test]
    fn test_from_parts_uses_clock_window() {
        let clock = TickClock::new(Arc::new(FixedTimeSource::new(600)), 60).expect("clock");
        let key = SecretKey::from_bytes(vec![3; 32]).expect("key");
        let engine = NonceEngine::from_parts(NonceConfig::default(), clock, key).expect("engine");
        assert_eq!(engine.config().window_seconds, 60);
        assert_eq!(engine.clock().current_tick(), Tick(10));
    }

    #[test]
    fn test_debug_redacts_key() {
        let (engine, _) = engine_with(NonceConfig::default());
        assert!(format!("{engine:?}").contains("[REDACTED]"));
    }

    #[test]
    fn test_verify_result_is_valid() {
        assert!(VerifyResult::ValidRecent.is_valid());
        assert!(VerifyResult::ValidAging.is_valid());
        assert!(!VerifyResult::Invalid.is_valid());
    }
}
