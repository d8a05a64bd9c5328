//! Carrying nonces in form fields and URLs.
//!
//! These helpers only build and read `application/x-www-form-urlencoded`
//! text; emitting HTML or redirects is left to the presentation layer.

use url::{form_urlencoded, Url};

use crate::{
    context::ActionContext,
    engine::{NonceEngine, VerifyResult},
    error::{NonceError, NonceResult},
};

impl NonceEngine {
    /// Serializes the nonce for `ctx` as a form field, e.g. `_wpnonce=3f2a9c01d7`.
    ///
    /// When `referer` is given, a second field named
    /// [`referer_field_name`](crate::NonceConfig::referer_field_name) carries it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` if the configuration requires an identity and `ctx` has none.
    pub fn render_field(&self, ctx: &ActionContext, referer: Option<&str>) -> NonceResult<String> {
        let token = self.create(ctx)?;
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair(ctx.name(), token.as_str());
        if let Some(referer) = referer {
            serializer.append_pair(&self.config().referer_field_name, referer);
        }
        Ok(serializer.finish())
    }

    /// Adds `ctx.name=<token>` to the query of `base_url`.
    ///
    /// Any parameter already named `ctx.name` is dropped. Every other query
    /// segment is kept byte for byte, as is the fragment.
    ///
    /// `base_url` must be absolute: relative links such as
    /// `/wp-admin/post.php?post=1` have no base to resolve against and are
    /// rejected. The scheme is not restricted, so `mailto:` and other
    /// non-hierarchical URLs are accepted.
    ///
    /// # Errors
    ///
    /// Returns `MalformedUrl` if `base_url` is not an absolute URL, and
    /// `InvalidIdentity` if the configuration requires an identity and `ctx` has none.
    pub fn append_to_url(&self, base_url: &str, ctx: &ActionContext) -> NonceResult<String> {
        let mut url = parse_url(base_url)?;
        let token = self.create(ctx)?;

        let mut query = url
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|segment| !segment.is_empty() && !segment_has_name(segment, ctx.name()))
            .collect::<Vec<_>>()
            .join("&");
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(
            &form_urlencoded::Serializer::new(String::new())
                .append_pair(ctx.name(), token.as_str())
                .finish(),
        );
        url.set_query(Some(&query));

        Ok(url.into())
    }

    /// Verifies the nonce carried in the query of `url` under `ctx.name`.
    ///
    /// A missing parameter is [`VerifyResult::Invalid`].
    ///
    /// # Errors
    ///
    /// Returns `MalformedUrl` if `url` cannot be parsed, and `InvalidIdentity`
    /// if the configuration requires an identity and `ctx` has none.
    pub fn verify_url(&self, url: &str, ctx: &ActionContext) -> NonceResult<VerifyResult> {
        let url = parse_url(url)?;
        let token = url
            .query_pairs()
            .find(|(key, _)| key == ctx.name())
            .map(|(_, value)| value.into_owned());
        self.verify_optional(token.as_deref(), ctx)
    }

    /// Verifies the nonce carried in a form-urlencoded `body` under `ctx.name`.
    ///
    /// A missing field is [`VerifyResult::Invalid`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` if the configuration requires an identity and `ctx` has none.
    pub fn verify_form(&self, body: &str, ctx: &ActionContext) -> NonceResult<VerifyResult> {
        let token = form_value(body, ctx.name());
        self.verify_optional(token.as_deref(), ctx)
    }

    /// Returns the referer field of a form-urlencoded `body`, if present.
    #[must_use]
    pub fn referer_from_form(&self, body: &str) -> Option<String> {
        form_value(body, &self.config().referer_field_name)
    }

    fn verify_optional(
        &self,
        token: Option<&str>,
        ctx: &ActionContext,
    ) -> NonceResult<VerifyResult> {
        match token {
            Some(token) => self.verify(token, ctx),
            None => {
                log::debug!(
                    "no nonce under {} for action={}",
                    ctx.name(),
                    ctx.action()
                );
                // still enforce the identity policy for absent tokens
                self.verify("", ctx)
            }
        }
    }
}

fn parse_url(url: &str) -> NonceResult<Url> {
    Url::parse(url).map_err(|err| NonceError::MalformedUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

fn segment_has_name(segment: &str, name: &str) -> bool {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(key, _)| key == name)
}

fn form_value(body: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
