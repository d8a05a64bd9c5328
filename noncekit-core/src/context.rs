//! The (action, name, identity) triple a token is scoped to.

use std::fmt;

use crate::{
    config::DEFAULT_FIELD_NAME,
    error::{NonceError, NonceResult},
};

/// The operation a token protects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// A named action such as `"delete-post-42"`.
    Named(String),
    /// An integer tag. [`Action::UNSET`] is `Tag(-1)`.
    Tag(i64),
}

impl Action {
    /// Action used by callers that do not scope their tokens.
    pub const UNSET: Self = Self::Tag(-1);

    /// The exact text hashed into a token.
    ///
    /// Tags are rendered in decimal, so `UNSET` hashes as `"-1"`.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Tag(tag) => tag.to_string(),
        }
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        Self::Named(value.to_string())
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        Self::Named(value)
    }
}

impl From<i64> for Action {
    fn from(value: i64) -> Self {
        Self::Tag(value)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

/// Validated, immutable scope of a nonce.
///
/// ```rust
/// use noncekit_core::{Action, ActionContext};
///
/// let ctx = ActionContext::new("delete-post-42", Some("_wpnonce"), "user:7").unwrap();
/// assert_eq!(ctx.action(), &Action::Named("delete-post-42".to_string()));
/// assert_eq!(ctx.name(), "_wpnonce");
///
/// assert!(ActionContext::new("  ", None, "user:7").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionContext {
    action: Action,
    name: String,
    identity: String,
}

impl ActionContext {
    /// Validates and builds a context. `name` defaults to [`DEFAULT_FIELD_NAME`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidAction` for a blank named action and `InvalidFieldName`
    /// for a name that is empty or contains whitespace or control characters.
    pub fn new(
        action: impl Into<Action>,
        name: Option<&str>,
        identity: impl Into<String>,
    ) -> NonceResult<Self> {
        let action = action.into();
        if let Action::Named(named) = &action {
            if named.trim().is_empty() {
                return Err(NonceError::InvalidAction(
                    "action must not be empty".to_string(),
                ));
            }
        }

        let name = name.unwrap_or(DEFAULT_FIELD_NAME);
        validate_field_name(name)?;

        Ok(Self {
            action,
            name: name.to_string(),
            identity: identity.into(),
        })
    }

    /// The protected action.
    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }

    /// The field or parameter name the token travels under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The caller identity the token is bound to.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

pub(crate) fn validate_field_name(name: &str) -> NonceResult<()> {
    if name.is_empty() {
        return Err(NonceError::InvalidFieldName(
            "field name must not be empty".to_string(),
        ));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(NonceError::InvalidFieldName(format!(
            "field name {name:?} contains whitespace or control characters"
        )));
    }
    Ok(())
}
