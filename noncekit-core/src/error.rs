use thiserror::Error;

/// Result type for nonce operations.
pub type NonceResult<T> = Result<T, NonceError>;

/// Error outputs from `NonceKit`.
///
/// A token that fails verification is not an error; see
/// [`VerifyResult::Invalid`](crate::VerifyResult::Invalid).
#[derive(Debug, Error, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum NonceError {
    /// The action is empty or otherwise unusable.
    #[error("invalid_action: {0}")]
    InvalidAction(String),
    /// The field name cannot be embedded in a form or query string.
    #[error("invalid_field_name: {0}")]
    InvalidFieldName(String),
    /// The identity is empty while the configuration requires one.
    #[error("invalid_identity")]
    InvalidIdentity,
    /// The provided URL could not be parsed.
    #[error("malformed_url: {url}: {reason}")]
    MalformedUrl {
        /// The URL as given by the caller.
        url: String,
        /// Parser error description.
        reason: String,
    },
    /// No secret key is configured.
    #[error("missing_secret_key: {0}")]
    MissingSecretKey(String),
    /// The secret key could not be decoded or is too short.
    #[error("invalid_secret_key: {0}")]
    InvalidSecretKey(String),
    /// A configuration value is out of range.
    #[error("invalid_config: {attribute}: {reason}")]
    InvalidConfig {
        /// Name of the offending attribute.
        attribute: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl NonceError {
    pub(crate) fn config(attribute: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}
