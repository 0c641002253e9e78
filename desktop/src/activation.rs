//! Activation URIs.
//!
//! The OS hands the application `<scheme>://...` URIs either on the command
//! line (Windows, Linux) or forwarded from a second launch. An activation
//! carrying a `token` query parameter wins over everything else; a
//! `logout-callback` URI signals a completed logout; any other URI of our
//! scheme just brings the window forward.

use crate::error::{DesktopError, Result};
use handoff_auth::SessionToken;
use reqwest::Url;
use tracing::warn;

const LOGOUT_CALLBACK: &str = "logout-callback";

/// What an activation asks the shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Login finished; hand the token to the renderer.
    Token(SessionToken),
    /// Logout finished elsewhere; tell the renderer.
    LogoutComplete,
    /// Nothing to deliver; show and focus the window.
    Focus,
}

/// Parse a single URI.
///
/// Returns `Ok(None)` when the URI is not of `scheme`.
///
/// # Errors
///
/// Returns `DesktopError::InvalidActivation` if the URI is of `scheme` but
/// cannot be parsed.
pub fn parse_activation(uri: &str, scheme: &str) -> Result<Option<Activation>> {
    if !is_scheme_uri(uri, scheme) {
        return Ok(None);
    }

    let url = Url::parse(uri).map_err(|e| DesktopError::InvalidActivation(format!("{uri}: {e}")))?;

    // query_pairs percent-decodes
    let token = url
        .query_pairs()
        .find(|(key, value)| key == "token" && !value.is_empty())
        .map(|(_, value)| SessionToken::new(value.into_owned()));

    if let Some(token) = token {
        return Ok(Some(Activation::Token(token)));
    }

    let is_logout = url.host_str() == Some(LOGOUT_CALLBACK)
        || url.path().trim_matches('/') == LOGOUT_CALLBACK;

    Ok(Some(if is_logout {
        Activation::LogoutComplete
    } else {
        Activation::Focus
    }))
}

/// Find the first argument of `scheme` in `argv` and parse it.
///
/// A malformed URI of our scheme degrades to [`Activation::Focus`] so a bad
/// link still brings the window forward.
#[must_use]
pub fn find_activation<S: AsRef<str>>(argv: &[S], scheme: &str) -> Option<Activation> {
    let uri = argv
        .iter()
        .map(AsRef::as_ref)
        .find(|arg| is_scheme_uri(arg, scheme))?;

    match parse_activation(uri, scheme) {
        Ok(activation) => activation,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed activation URI");
            Some(Activation::Focus)
        }
    }
}

fn is_scheme_uri(uri: &str, scheme: &str) -> bool {
    uri.len() > scheme.len() + 3
        && uri
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        && uri.get(scheme.len()..scheme.len() + 3) == Some("://")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_extracted_and_decoded() {
        let activation = parse_activation("app://oauth-callback?token=ab%2Fc%3D", "app").unwrap();
        assert_eq!(
            activation,
            Some(Activation::Token(SessionToken::new("ab/c=")))
        );
    }

    #[test]
    fn test_token_wins_over_logout() {
        let activation = parse_activation("app://logout-callback?token=t1", "app").unwrap();
        assert_eq!(activation, Some(Activation::Token(SessionToken::new("t1"))));
    }

    #[test]
    fn test_logout_callback() {
        assert_eq!(
            parse_activation("app://logout-callback", "app").unwrap(),
            Some(Activation::LogoutComplete)
        );
    }

    #[test]
    fn test_other_uri_focuses() {
        assert_eq!(
            parse_activation("app://oauth-callback?token=", "app").unwrap(),
            Some(Activation::Focus)
        );
        assert_eq!(
            parse_activation("app://somewhere", "app").unwrap(),
            Some(Activation::Focus)
        );
    }

    #[test]
    fn test_foreign_scheme_ignored() {
        assert_eq!(parse_activation("https://x?token=t", "app").unwrap(), None);
        assert_eq!(parse_activation("application://x", "app").unwrap(), None);
        assert_eq!(parse_activation("app://", "app").unwrap(), None);
    }

    #[test]
    fn test_find_activation_skips_other_args() {
        let argv = [
            "/usr/bin/handoff-desktop",
            "--flag",
            "app://oauth-callback?token=tok1",
        ];
        assert_eq!(
            find_activation(&argv, "app"),
            Some(Activation::Token(SessionToken::new("tok1")))
        );
    }

    #[test]
    fn test_find_activation_none_without_scheme_arg() {
        let argv = ["/usr/bin/handoff-desktop", "--flag"];
        assert_eq!(find_activation(&argv, "app"), None);
    }

    #[test]
    fn test_malformed_uri_focuses() {
        let argv = ["app://[bad"];
        assert_eq!(find_activation(&argv, "app"), Some(Activation::Focus));
    }
}
