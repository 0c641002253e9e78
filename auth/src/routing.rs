//! Where to send the client after login or logout.
//!
//! Pure functions, no I/O. The HTTP handlers and the desktop shell both
//! depend on these.

use crate::state::SessionToken;
use serde::{Deserialize, Serialize};

/// Query flag value that marks a desktop-initiated logout.
pub const DESKTOP_ORIGIN_FLAG: &str = "desktop";

/// Redirect destination carrying `token` back to the initiating client.
///
/// - `redirect_target` present: the token is appended as a `token` query
///   parameter, with `?` or `&` depending on whether the target already has
///   a query string. A `#fragment` stays at the end.
/// - Otherwise: `{web_origin}/?token=<t>`.
///
/// The target is echoed as-is; no allow-list is applied.
///
/// # Examples
///
/// ```
/// use handoff_auth::routing::login_redirect;
/// use handoff_auth::SessionToken;
///
/// let token = SessionToken::new("tok1");
/// assert_eq!(login_redirect(Some("app://cb"), "http://web", &token), "app://cb?token=tok1");
/// assert_eq!(login_redirect(None, "http://web", &token), "http://web/?token=tok1");
/// ```
#[must_use]
pub fn login_redirect(
    redirect_target: Option<&str>,
    web_origin: &str,
    token: &SessionToken,
) -> String {
    let encoded = urlencoding::encode(token.expose());

    match redirect_target.filter(|target| !target.is_empty()) {
        Some(target) => {
            let (base, fragment) = target
                .split_once('#')
                .map_or((target, None), |(base, fragment)| (base, Some(fragment)));
            let separator = if base.contains('?') { '&' } else { '?' };
            match fragment {
                Some(fragment) => format!("{base}{separator}token={encoded}#{fragment}"),
                None => format!("{base}{separator}token={encoded}"),
            }
        }
        None => format!("{}/?token={encoded}", web_origin.trim_end_matches('/')),
    }
}

/// Which client asked for the logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoutOrigin {
    /// A browser tab on the web origin.
    Web,
    /// The desktop shell.
    Desktop,
}

impl LogoutOrigin {
    /// Decode the `from` query flag. Anything but `desktop` means web.
    #[must_use]
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(value) if value.eq_ignore_ascii_case(DESKTOP_ORIGIN_FLAG) => Self::Desktop,
            _ => Self::Web,
        }
    }
}

/// URL that tells the web origin to drop its copy of the token.
///
/// `issued_at_millis` is a freshness marker so the page can ignore stale
/// replays.
#[must_use]
pub fn sync_logout_url(web_origin: &str, issued_at_millis: i64) -> String {
    format!(
        "{}/?sync-logout=true&t={issued_at_millis}",
        web_origin.trim_end_matches('/')
    )
}

/// Sync-logout URL for a completed logout, if the origin needs one.
#[must_use]
pub fn logout_sync_target(origin: LogoutOrigin, web_origin: &str) -> Option<String> {
    match origin {
        LogoutOrigin::Desktop => Some(sync_logout_url(
            web_origin,
            chrono::Utc::now().timestamp_millis(),
        )),
        LogoutOrigin::Web => None,
    }
}
