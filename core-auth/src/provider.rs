//! Credential Provider
//!
//! The `get_or_refresh` seam the pipeline depends on, plus the file-backed
//! implementation used in production.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use core_remote::time::Clock;

use crate::error::{AuthError, Result};
use crate::types::{AccessToken, StoredCredential};

/// Refresh this many seconds before the recorded expiry.
const TOKEN_REFRESH_BUFFER_SECS: i64 = 60;

/// HTTP timeout for the refresh exchange.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Credential provider trait
///
/// The single operation the pipeline needs from authentication: produce a
/// bearer token that is valid right now. Implementations refresh
/// transparently; callers never see expiry bookkeeping.
///
/// # Errors
///
/// Any failure here is a setup failure. Callers are expected to abort the
/// run rather than continue without credentials.
///
/// # Example
///
/// ```ignore
/// use core_auth::CredentialProvider;
///
/// async fn auth_header(provider: &dyn CredentialProvider) -> String {
///     let token = provider.get_or_refresh().await.unwrap();
///     format!("Bearer {}", token.secret())
/// }
/// ```
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Get a currently valid access token, refreshing if necessary
    async fn get_or_refresh(&self) -> Result<AccessToken>;
}

/// Successful response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// File-backed credential provider.
///
/// Loads an authorized-user credential file once, serves its token while
/// fresh, and performs a `grant_type=refresh_token` exchange against the
/// stored token endpoint when it goes stale. Every successful refresh is
/// written back to the file so interrupted runs keep the newest token.
pub struct FileCredentialStore {
    path: PathBuf,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    // Also serializes refreshes: only one exchange runs at a time.
    cached: Mutex<Option<StoredCredential>>,
}

impl FileCredentialStore {
    /// Create a store bound to a credential file path
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the authorized-user JSON file
    /// * `clock` - Time source for expiry checks
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed. The
    /// credential file itself is read lazily on first use.
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REFRESH_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("driveport/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            path: path.into(),
            http,
            clock,
            cached: Mutex::new(None),
        })
    }

    async fn load_from_disk(path: &Path) -> Result<StoredCredential> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::MissingCredential(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|e| {
            AuthError::MalformedCredential(format!("{}: {}", path.display(), e))
        })
    }

    async fn persist(&self, credential: &StoredCredential) -> Result<()> {
        let json = serde_json::to_string_pretty(credential)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), "Credential file updated");
        Ok(())
    }

    async fn refresh(&self, credential: &mut StoredCredential) -> Result<()> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;

        info!("Access token expired or expiring soon, refreshing");

        let params = [
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&credential.token_uri)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| String::new());
            warn!(status = status.as_u16(), "Token refresh rejected");
            return Err(AuthError::RefreshRejected {
                status: status.as_u16(),
                message,
            });
        }

        let refreshed: TokenRefreshResponse = response.json().await?;
        credential.apply_refresh(refreshed.access_token, refreshed.expires_in, self.clock.now());

        info!("Access token refreshed");
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialStore {
    #[instrument(skip(self))]
    async fn get_or_refresh(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;

        if cached.is_none() {
            *cached = Some(Self::load_from_disk(&self.path).await?);
            debug!(path = %self.path.display(), "Credential file loaded");
        }

        let credential = cached
            .as_mut()
            .ok_or_else(|| AuthError::MissingCredential(self.path.clone()))?;

        if !credential.is_stale(self.clock.now(), TOKEN_REFRESH_BUFFER_SECS) {
            debug!("Access token is valid, no refresh needed");
            return Ok(AccessToken::new(credential.token.clone()));
        }

        self.refresh(credential).await?;
        self.persist(credential).await?;

        Ok(AccessToken::new(credential.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn write_credential(dir: &tempfile::TempDir, expiry: Option<DateTime<Utc>>) -> PathBuf {
        write_credential_with_uri(dir, expiry, "https://oauth2.googleapis.com/token")
    }

    fn write_credential_with_uri(
        dir: &tempfile::TempDir,
        expiry: Option<DateTime<Utc>>,
        token_uri: &str,
    ) -> PathBuf {
        let path = dir.path().join("token.json");
        let credential = StoredCredential {
            token: "cached-token".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_uri: token_uri.to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![],
            expiry,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&credential).unwrap()).unwrap();
        path
    }

    /// Serve one canned HTTP response on a loopback port and capture the
    /// request, standing in for the real token endpoint.
    async fn token_endpoint(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers =
                        String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                    let body_len: usize = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).into_owned()
        });

        (uri, handle)
    }

    #[tokio::test]
    async fn test_fresh_credential_served_without_refresh() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = write_credential(&dir, Some(now + ChronoDuration::hours(1)));

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(now))).unwrap();
        let token = store.get_or_refresh().await.unwrap();

        assert_eq!(token.secret(), "cached-token");
    }

    #[tokio::test]
    async fn test_repeated_calls_reuse_cached_credential() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = write_credential(&dir, Some(now + ChronoDuration::hours(1)));

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(now))).unwrap();
        let first = store.get_or_refresh().await.unwrap();

        // The file can disappear after the first load; the cache serves.
        std::fs::remove_file(&path).unwrap();
        let second = store.get_or_refresh().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(Utc::now()))).unwrap();
        let result = store.get_or_refresh().await;

        assert!(matches!(result, Err(AuthError::MissingCredential(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(Utc::now()))).unwrap();
        let result = store.get_or_refresh().await;

        assert!(matches!(result, Err(AuthError::MalformedCredential(_))));
    }

    #[tokio::test]
    async fn test_stale_without_refresh_token_is_fatal() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let credential = StoredCredential {
            token: "cached-token".to_string(),
            refresh_token: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![],
            expiry: Some(now - ChronoDuration::hours(1)),
        };
        std::fs::write(&path, serde_json::to_string(&credential).unwrap()).unwrap();

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(now))).unwrap();
        let result = store.get_or_refresh().await;

        assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    }

    #[tokio::test]
    async fn test_stale_credential_refreshes_and_rewrites_file() {
        let now = Utc::now();
        let (uri, endpoint) = token_endpoint(
            "200 OK",
            r#"{"access_token":"fresh-token","expires_in":3600}"#,
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_credential_with_uri(&dir, Some(now - ChronoDuration::hours(1)), &uri);

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(now))).unwrap();
        let token = store.get_or_refresh().await.unwrap();

        assert_eq!(token.secret(), "fresh-token");

        // The exchange posted the refresh-token grant with our client.
        let request = endpoint.await.unwrap();
        assert!(request.starts_with("POST "));
        assert!(request.contains("grant_type=refresh_token"));
        assert!(request.contains("refresh_token=refresh"));
        assert!(request.contains("client_id=client"));

        // The file now carries the new token, ready for the next run.
        let raw = std::fs::read_to_string(&path).unwrap();
        let rewritten: StoredCredential = serde_json::from_str(&raw).unwrap();
        assert_eq!(rewritten.token, "fresh-token");
        assert_eq!(rewritten.expiry, Some(now + ChronoDuration::seconds(3600)));
        assert!(!rewritten.is_stale(now, 60));
    }

    #[tokio::test]
    async fn test_refreshed_token_is_served_from_cache_afterwards() {
        let now = Utc::now();
        let (uri, _endpoint) = token_endpoint(
            "200 OK",
            r#"{"access_token":"fresh-token","expires_in":3600}"#,
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_credential_with_uri(&dir, Some(now - ChronoDuration::hours(1)), &uri);

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(now))).unwrap();
        let first = store.get_or_refresh().await.unwrap();
        // One canned response only; a second exchange would hang and fail.
        let second = store.get_or_refresh().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.secret(), "fresh-token");
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_fatal_and_leaves_file_untouched() {
        let now = Utc::now();
        let (uri, _endpoint) =
            token_endpoint("400 Bad Request", r#"{"error":"invalid_grant"}"#).await;

        let dir = tempfile::tempdir().unwrap();
        let path = write_credential_with_uri(&dir, Some(now - ChronoDuration::hours(1)), &uri);
        let before = std::fs::read_to_string(&path).unwrap();

        let store = FileCredentialStore::new(&path, Arc::new(FixedClock(now))).unwrap();
        let result = store.get_or_refresh().await;

        match result {
            Err(AuthError::RefreshRejected { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("expected RefreshRejected, got {:?}", other),
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}
