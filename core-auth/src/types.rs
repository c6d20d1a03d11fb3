use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A currently valid bearer token.
///
/// Returned by [`CredentialProvider::get_or_refresh`](crate::provider::CredentialProvider::get_or_refresh)
/// and consumed by provider clients when building `Authorization` headers.
///
/// # Security
///
/// The secret is never logged. The `Debug` implementation redacts it.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
///
/// let token = AccessToken::new("ya29.a0example");
/// assert_eq!(token.secret(), "ya29.a0example");
/// assert!(!format!("{:?}", token).contains("ya29"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a bearer secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Get the raw secret for header construction
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The on-disk authorized-user credential.
///
/// Matches the JSON file that standard OAuth tooling writes after an
/// interactive consent flow (`token`, `refresh_token`, `token_uri`,
/// `client_id`, `client_secret`, `scopes`, `expiry`). Provisioning that
/// file is outside this tool; this type only reads, refreshes, and
/// rewrites it.
///
/// # Security
///
/// The `Debug` implementation redacts the token, refresh token, and
/// client secret.
///
/// # Examples
///
/// ```
/// use core_auth::StoredCredential;
/// use chrono::{Duration, Utc};
///
/// let credential = StoredCredential {
///     token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     token_uri: "https://oauth2.googleapis.com/token".to_string(),
///     client_id: "id".to_string(),
///     client_secret: "secret".to_string(),
///     scopes: vec![],
///     expiry: Some(Utc::now() + Duration::hours(1)),
/// };
///
/// assert!(!credential.is_stale(Utc::now(), 60));
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// The current access token
    pub token: String,
    /// Token used to obtain new access tokens; absent means refresh is
    /// impossible and an expired credential is fatal
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token endpoint for the refresh exchange
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// OAuth client identifier
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Granted scopes, informational only
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry (UTC); absent is treated as already stale
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Check whether the access token is expired or expiring soon
    ///
    /// Returns `true` when the expiry is unknown or falls within
    /// `buffer_seconds` of `now`. A stale credential must be refreshed
    /// before use.
    pub fn is_stale(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        match self.expiry {
            Some(expiry) => now >= expiry - Duration::seconds(buffer_seconds),
            None => true,
        }
    }

    /// Apply a successful refresh response
    ///
    /// Replaces the access token and recomputes the expiry from the
    /// endpoint's `expires_in` window.
    pub fn apply_refresh(&mut self, access_token: String, expires_in: i64, now: DateTime<Utc>) {
        self.token = access_token;
        self.expiry = Some(now + Duration::seconds(expires_in));
    }
}

// Custom Debug implementation to avoid logging secrets
impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}
