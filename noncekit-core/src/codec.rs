//! Token derivation and comparison.
//!
//! A token is a truncated HMAC-SHA256 tag:
//!
//! ```text
//! token = encode(HMAC-SHA256(
//!     key,
//!     "noncekit:token:v1" || tick (8 bytes BE)
//!         || len(action) (8 bytes BE) || action
//!         || len(identity) (8 bytes BE) || identity
//! ))[..token_length]
//! ```
//!
//! Length prefixes keep `("ab", "c")` and `("a", "bc")` apart.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    clock::Tick,
    config::{TokenEncoding, MIN_TOKEN_LENGTH},
    context::Action,
    error::{NonceError, NonceResult},
    secret::SecretKey,
};

/// Domain separation label for token derivation.
const LABEL_TOKEN: &[u8] = b"noncekit:token:v1";

type HmacSha256 = Hmac<Sha256>;

/// An encoded nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// The encoded token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives tokens with a fixed encoding and display length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCodec {
    encoding: TokenEncoding,
    token_length: usize,
}

impl TokenCodec {
    /// Creates a codec.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `token_length` is outside the range the encoding supports.
    pub fn new(encoding: TokenEncoding, token_length: usize) -> NonceResult<Self> {
        let max = encoding.max_length();
        if !(MIN_TOKEN_LENGTH..=max).contains(&token_length) {
            return Err(NonceError::config(
                "token_length",
                format!("must be between {MIN_TOKEN_LENGTH} and {max}, got {token_length}"),
            ));
        }
        Ok(Self {
            encoding,
            token_length,
        })
    }

    /// Number of characters in every derived token.
    #[must_use]
    pub const fn token_length(&self) -> usize {
        self.token_length
    }

    /// Digest encoding.
    #[must_use]
    pub const fn encoding(&self) -> TokenEncoding {
        self.encoding
    }

    /// Derives the token for `action` and `identity` in window `tick`.
    #[must_use]
    pub fn derive(&self, tick: Tick, action: &Action, identity: &str, key: &SecretKey) -> Token {
        let tag = hmac_sha256(key.expose(), &token_message(tick, action, identity));
        let mut encoded = match self.encoding {
            TokenEncoding::Hex => hex::encode(tag),
            TokenEncoding::Base64Url => URL_SAFE_NO_PAD.encode(tag),
        };
        encoded.truncate(self.token_length);
        Token(encoded)
    }

    /// Compares a presented token against an expected one in constant time.
    ///
    /// Tokens of different lengths never match.
    #[must_use]
    pub fn matches(candidate: &str, expected: &Token) -> bool {
        let candidate = candidate.as_bytes();
        let expected = expected.as_str().as_bytes();
        if candidate.len() != expected.len() {
            return false;
        }
        candidate.ct_eq(expected).into()
    }
}

fn token_message(tick: Tick, action: &Action, identity: &str) -> Vec<u8> {
    let action = action.canonical();
    let mut message =
        Vec::with_capacity(LABEL_TOKEN.len() + 8 + 8 + action.len() + 8 + identity.len());
    message.extend_from_slice(LABEL_TOKEN);
    message.extend_from_slice(&tick.to_be_bytes());
    push_length_prefixed(&mut message, action.as_bytes());
    push_length_prefixed(&mut message, identity.as_bytes());
    message
}

fn push_length_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    tag
}
