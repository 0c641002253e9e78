//! Domain types for identities, profiles and session tokens.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable user identifier issued by the identity provider.
///
/// GitHub's numeric `id` is carried as its decimal string so that the store
/// never depends on the provider's integer width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque bearer credential handed to clients after login.
///
/// Today this is the provider's access token. `Debug` and `Display` only show
/// a short prefix so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token. Only call this when the token must leave the
    /// process (redirect URL, HTTP header).
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form for logs: first four characters followed by `***`.
    #[must_use]
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}***")
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&self.masked()).finish()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// User-visible profile data, replaced in full on every login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Provider login or display name.
    pub display_name: String,

    /// Avatar image URL.
    pub avatar_url: String,

    /// Primary verified email, if the provider disclosed one.
    pub email: Option<String>,
}

/// Everything the store keeps for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Latest profile.
    pub profile: Profile,

    /// Live session tokens. May be empty after logout.
    #[serde(default)]
    pub tokens: BTreeSet<SessionToken>,
}

/// Result of a successful token lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    /// Owner of the token.
    pub identity: Identity,

    /// Owner's current profile.
    pub profile: Profile,
}

/// Outcome of a completed login callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    /// Token to hand back to the initiating client.
    pub token: SessionToken,

    /// Caller-supplied return target echoed from `state`.
    ///
    /// `None` means the web origin default applies.
    pub redirect_target: Option<String>,
}

/// Progress of a single login callback.
///
/// ```text
/// Started → CodeReceived → TokenExchanged → ProfileFetched
///         → (EmailFetched | EmailOmitted) → Stored → Completed
/// ```
///
/// Any non-email step can move to `Failed`, which is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStage {
    /// Callback received, nothing checked yet.
    Started,
    /// A non-blank authorization code is present.
    CodeReceived,
    /// The provider issued an access token.
    TokenExchanged,
    /// The provider returned the user's profile.
    ProfileFetched,
    /// The email was filled in from the multi-email endpoint.
    EmailFetched,
    /// No email could be determined; continuing without one.
    EmailOmitted,
    /// Profile and token are persisted.
    Stored,
    /// The session result is ready for the router.
    Completed,
    /// The login was aborted.
    Failed(String),
}

impl LoginStage {
    /// Short label used in log fields.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::CodeReceived => "code_received",
            Self::TokenExchanged => "token_exchanged",
            Self::ProfileFetched => "profile_fetched",
            Self::EmailFetched => "email_fetched",
            Self::EmailOmitted => "email_omitted",
            Self::Stored => "stored",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
        }
    }

    /// `true` for `Completed` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_masked() {
        let token = SessionToken::new("gho_supersecretvalue");
        let rendered = format!("{token:?}");
        assert!(rendered.contains("gho_***"));
        assert!(!rendered.contains("supersecret"));
        assert_eq!(token.to_string(), "gho_***");
    }

    #[test]
    fn test_short_token_mask() {
        assert_eq!(SessionToken::new("ab").masked(), "ab***");
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = Profile {
            display_name: "alice".to_string(),
            avatar_url: "https://avatars.example/u/42".to_string(),
            email: None,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["displayName"], "alice");
        assert_eq!(json["avatarUrl"], "https://avatars.example/u/42");
        assert!(json["email"].is_null());
    }

    #[test]
    fn test_identity_and_token_are_transparent() {
        let json = serde_json::to_string(&Identity::new("42")).unwrap();
        assert_eq!(json, "\"42\"");
        let token: SessionToken = serde_json::from_str("\"tok1\"").unwrap();
        assert_eq!(token.expose(), "tok1");
    }

    #[test]
    fn test_login_stage_terminal() {
        assert!(LoginStage::Completed.is_terminal());
        assert!(LoginStage::Failed("exchange".into()).is_terminal());
        assert!(!LoginStage::EmailOmitted.is_terminal());
        assert_eq!(LoginStage::TokenExchanged.label(), "token_exchanged");
    }
}
