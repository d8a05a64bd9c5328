//! Engine configuration and defaults.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{NonceError, NonceResult};

/// Length of one tick window in seconds (12 hours).
pub const DEFAULT_WINDOW_SECONDS: u64 = 43_200;

/// Number of consecutive windows a token is accepted for.
pub const DEFAULT_LIFETIME_WINDOWS: u32 = 2;

/// Number of characters kept from the encoded digest.
pub const DEFAULT_TOKEN_LENGTH: usize = 10;

/// Shortest token length accepted by [`NonceConfig::validate`].
pub const MIN_TOKEN_LENGTH: usize = 8;

/// Field name used when an [`ActionContext`](crate::ActionContext) is built without one.
pub const DEFAULT_FIELD_NAME: &str = "_nonce";

/// Field carrying the referer URL next to the nonce field.
pub const DEFAULT_REFERER_FIELD_NAME: &str = "_http_referer";

/// Text alphabet used to encode the token digest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TokenEncoding {
    /// Lowercase hexadecimal.
    #[default]
    Hex,
    /// URL-safe base64 without padding.
    Base64Url,
}

impl TokenEncoding {
    /// Longest token the encoding can produce from a SHA-256 digest.
    #[must_use]
    pub const fn max_length(self) -> usize {
        match self {
            Self::Hex => 64,
            Self::Base64Url => 43,
        }
    }
}

/// Configuration for a [`NonceEngine`](crate::NonceEngine).
///
/// Missing fields take their defaults when deserialized, so a host can
/// override only what it needs:
///
/// ```rust
/// use noncekit_core::{NonceConfig, TokenEncoding};
///
/// let config = NonceConfig::from_json(r#"{ "encoding": "base64url" }"#).unwrap();
/// assert_eq!(config.encoding, TokenEncoding::Base64Url);
/// assert_eq!(config.window_seconds, 43_200);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NonceConfig {
    /// Length of one tick window in seconds.
    pub window_seconds: u64,
    /// Number of windows (current included) a token stays valid for.
    pub lifetime_windows: u32,
    /// Number of encoded characters in a token.
    pub token_length: usize,
    /// Digest encoding.
    pub encoding: TokenEncoding,
    /// Reject contexts whose identity is empty.
    pub require_identity: bool,
    /// Field name used for the referer in rendered fields.
    pub referer_field_name: String,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            lifetime_windows: DEFAULT_LIFETIME_WINDOWS,
            token_length: DEFAULT_TOKEN_LENGTH,
            encoding: TokenEncoding::default(),
            require_identity: false,
            referer_field_name: DEFAULT_REFERER_FIELD_NAME.to_string(),
        }
    }
}

impl NonceConfig {
    /// Builds a default configuration whose windows together span `lifetime_seconds`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the lifetime does not split evenly into
    /// [`DEFAULT_LIFETIME_WINDOWS`] non-empty windows.
    pub fn with_lifetime(lifetime_seconds: u64) -> NonceResult<Self> {
        let windows = u64::from(DEFAULT_LIFETIME_WINDOWS);
        if lifetime_seconds % windows != 0 {
            return Err(NonceError::config(
                "lifetime_seconds",
                format!("must be a multiple of {windows}, got {lifetime_seconds}"),
            ));
        }
        let config = Self {
            window_seconds: lifetime_seconds / windows,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the document is malformed or a value is out of range.
    pub fn from_json(json: &str) -> NonceResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| NonceError::config("json", err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Total number of seconds a freshly created token can remain valid.
    #[must_use]
    pub const fn lifetime_seconds(&self) -> u64 {
        self.window_seconds.saturating_mul(self.lifetime_windows as u64)
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending attribute.
    pub fn validate(&self) -> NonceResult<()> {
        if self.window_seconds == 0 {
            return Err(NonceError::config("window_seconds", "must be greater than 0"));
        }
        if self.lifetime_windows == 0 {
            return Err(NonceError::config("lifetime_windows", "must be at least 1"));
        }
        let max = self.encoding.max_length();
        if !(MIN_TOKEN_LENGTH..=max).contains(&self.token_length) {
            return Err(NonceError::config(
                "token_length",
                format!(
                    "must be between {MIN_TOKEN_LENGTH} and {max} for {} encoding, got {}",
                    self.encoding, self.token_length
                ),
            ));
        }
        crate::context::validate_field_name(&self.referer_field_name)
            .map_err(|_| NonceError::config("referer_field_name", "not a usable field name"))?;
        Ok(())
    }
}
