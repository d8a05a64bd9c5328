//! Secret key material and the providers that load it.

use std::fmt;

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretBox};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{NonceError, NonceResult};

/// Shortest accepted key, in bytes.
pub const MIN_SECRET_KEY_LENGTH: usize = 16;

/// Environment variable read by [`EnvSecretKey::default`].
pub const DEFAULT_SECRET_KEY_ENV: &str = "NONCEKIT_SECRET_KEY";

/// HMAC key used to derive tokens.
///
/// The bytes are zeroized on drop and never printed.
pub struct SecretKey(SecretBox<Vec<u8>>);

impl SecretKey {
    /// Wraps raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSecretKey` if the key is shorter than [`MIN_SECRET_KEY_LENGTH`].
    /// Rejected bytes are zeroized before returning.
    pub fn from_bytes(mut bytes: Vec<u8>) -> NonceResult<Self> {
        if bytes.len() < MIN_SECRET_KEY_LENGTH {
            let len = bytes.len();
            bytes.zeroize();
            return Err(NonceError::InvalidSecretKey(format!(
                "expected at least {MIN_SECRET_KEY_LENGTH} bytes, got {len}"
            )));
        }
        Ok(Self(SecretBox::new(Box::new(bytes))))
    }

    /// Decodes a hex or base64 (URL-safe or standard) encoded key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSecretKey` if the text is in neither encoding or decodes too short.
    pub fn from_encoded(encoded: &str) -> NonceResult<Self> {
        let encoded = encoded.trim();
        let bytes = hex::decode(encoded)
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
            .or_else(|_| STANDARD.decode(encoded))
            .map_err(|_| {
                NonceError::InvalidSecretKey("expected hex or base64 encoding".to_string())
            })?;
        Self::from_bytes(bytes)
    }

    /// Generates a random 32-byte key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(SecretBox::new(Box::new(bytes)))
    }

    /// Returns the key bytes. Treat this as sensitive material.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Supplies the secret key once, when an engine is built.
pub trait SecretKeyProvider: Send + Sync {
    /// Loads the key.
    ///
    /// # Errors
    ///
    /// Returns `MissingSecretKey` if no key is configured, or `InvalidSecretKey`
    /// if the configured key is unusable.
    fn load_secret_key(&self) -> NonceResult<SecretKey>;
}

/// A key handed over directly by the host.
pub struct StaticSecretKey {
    bytes: SecretBox<Vec<u8>>,
}

impl StaticSecretKey {
    /// Holds `bytes` until an engine loads them.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: SecretBox::new(Box::new(bytes)),
        }
    }
}

impl SecretKeyProvider for StaticSecretKey {
    fn load_secret_key(&self) -> NonceResult<SecretKey> {
        let bytes = self.bytes.expose_secret();
        if bytes.is_empty() {
            return Err(NonceError::MissingSecretKey(
                "static key is empty".to_string(),
            ));
        }
        SecretKey::from_bytes(bytes.clone())
    }
}

impl fmt::Debug for StaticSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Reads an encoded key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSecretKey {
    variable: String,
}

impl EnvSecretKey {
    /// Reads the key from `variable`.
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    /// Name of the environment variable.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl Default for EnvSecretKey {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_KEY_ENV)
    }
}

impl SecretKeyProvider for EnvSecretKey {
    fn load_secret_key(&self) -> NonceResult<SecretKey> {
        let value = Zeroizing::new(std::env::var(&self.variable).map_err(|err| {
            NonceError::MissingSecretKey(format!("{}: {err}", self.variable))
        })?);
        if value.trim().is_empty() {
            return Err(NonceError::MissingSecretKey(format!(
                "{} is empty",
                self.variable
            )));
        }
        SecretKey::from_encoded(&value)
    }
}
