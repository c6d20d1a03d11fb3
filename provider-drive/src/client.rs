//! Google Drive API client implementation
//!
//! Implements the `RemoteSource` trait for Google Drive API v3.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use core_auth::{AccessToken, CredentialProvider};
use core_remote::error::Result;
use core_remote::source::{ChildPage, RemoteChild, RemoteSource};

use crate::error::DriveError;
use crate::types::{DriveItem, ItemListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Fields to request for folder listings
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, md5Checksum)";

/// MIME type marking a traversable folder
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Export format for Workspace-native documents
const EXPORT_MIME_TYPE: &str = "application/pdf";

/// Timeout for listing requests; downloads run unbounded and report
/// liveness through chunk progress instead
const LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Drive API client
///
/// Implements `RemoteSource` for Google Drive API v3.
///
/// # Features
///
/// - Folder listing scoped to one parent with `trashed = false` filtering
/// - Shared-drive content included on every call
/// - Streaming downloads written to disk chunk-by-chunk with progress
/// - PDF export for Workspace-native documents
/// - Bearer token fetched per request through `CredentialProvider`, so
///   refreshes happen transparently mid-run
///
/// Every call is a single attempt. Callers own retry decisions.
///
/// # Example
///
/// ```ignore
/// use provider_drive::DriveClient;
/// use core_remote::source::RemoteSource;
///
/// let client = DriveClient::new(credentials)?;
/// let page = client.list_children("root-folder-id", None).await?;
/// ```
pub struct DriveClient {
    /// HTTP client for API requests
    http: reqwest::Client,

    /// Produces a valid bearer token for each request
    credentials: Arc<dyn CredentialProvider>,
}

impl DriveClient {
    /// Create a new Google Drive client
    ///
    /// # Arguments
    ///
    /// * `credentials` - Credential provider with `drive.readonly` scope
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("driveport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DriveError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, credentials })
    }

    /// Build the files.list URL for one page of a folder's children
    fn list_url(folder_id: &str, page_token: Option<String>) -> String {
        let query = format!("'{}' in parents and trashed = false", folder_id);
        let mut url = format!(
            "{}/files?q={}&pageSize={}&fields={}&supportsAllDrives=true&includeItemsFromAllDrives=true",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            MAX_PAGE_SIZE,
            urlencoding::encode(LIST_FIELDS),
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(&token)));
        }

        url
    }

    /// Build the alt=media download URL
    fn media_url(file_id: &str) -> String {
        format!(
            "{}/files/{}?alt=media&supportsAllDrives=true",
            DRIVE_API_BASE, file_id
        )
    }

    /// Build the PDF export URL
    fn export_url(file_id: &str) -> String {
        format!(
            "{}/files/{}/export?mimeType={}",
            DRIVE_API_BASE,
            file_id,
            urlencoding::encode(EXPORT_MIME_TYPE)
        )
    }

    /// Convert a wire item to the seam record
    fn convert_item(item: DriveItem) -> RemoteChild {
        let is_folder = item.mime_type == FOLDER_MIME_TYPE;

        RemoteChild {
            id: item.id,
            name: item.name,
            mime_type: item.mime_type,
            md5_checksum: item.md5_checksum,
            is_folder,
        }
    }

    async fn bearer_token(&self) -> Result<AccessToken> {
        self.credentials
            .get_or_refresh()
            .await
            .map_err(|e| DriveError::AuthenticationFailed(e.to_string()).into())
    }

    /// Map a non-success response to a provider error
    fn status_error(status: u16, body: &[u8], file_id: &str) -> DriveError {
        let message = String::from_utf8_lossy(body).trim().to_string();

        match status {
            404 => DriveError::FileNotFound {
                file_id: file_id.to_string(),
            },
            401 | 403 => DriveError::AuthenticationFailed(message),
            _ => DriveError::ApiError {
                status_code: status,
                message,
            },
        }
    }

    /// Stream a response body to a local file, logging chunk progress
    async fn stream_to_file(&self, url: &str, file_id: &str, dest: &Path) -> Result<u64> {
        let token = self.bearer_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| DriveError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(Self::status_error(status.as_u16(), &body, file_id).into());
        }

        let total_bytes = response.content_length().filter(|t| *t > 0);
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DriveError::NetworkError(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            match total_bytes {
                Some(total) => {
                    debug!(percent = written * 100 / total, written, total, "Download progress")
                }
                None => debug!(written, "Download progress"),
            }
        }

        file.flush().await?;
        info!(bytes = written, "Wrote file content");

        Ok(written)
    }
}

#[async_trait]
impl RemoteSource for DriveClient {
    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<ChildPage> {
        let url = Self::list_url(folder_id, page_token);
        let token = self.bearer_token().await?;

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.secret())
            .timeout(LIST_TIMEOUT)
            .send()
            .await
            .map_err(|e| DriveError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DriveError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::status_error(status.as_u16(), &body, folder_id).into());
        }

        let list: ItemListResponse = serde_json::from_slice(&body).map_err(|e| {
            DriveError::ParseError(format!("Failed to parse files list response: {}", e))
        })?;

        let children: Vec<RemoteChild> = list.files.into_iter().map(Self::convert_item).collect();

        debug!(
            count = children.len(),
            has_next = list.next_page_token.is_some(),
            "Listed folder page"
        );

        Ok(ChildPage {
            children,
            next_page_token: list.next_page_token,
        })
    }

    #[instrument(skip(self), fields(file_id = %file_id, dest = %dest.display()))]
    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<u64> {
        info!("Downloading file content");
        self.stream_to_file(&Self::media_url(file_id), file_id, dest)
            .await
    }

    #[instrument(skip(self), fields(file_id = %file_id, dest = %dest.display()))]
    async fn export_to(&self, file_id: &str, dest: &Path) -> Result<u64> {
        info!("Exporting document as PDF");
        self.stream_to_file(&Self::export_url(file_id), file_id, dest)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_url_encodes_parent_query() {
        let url = DriveClient::list_url("folder1", None);

        assert!(url.starts_with("https://www.googleapis.com/drive/v3/files?q="));
        assert!(url.contains("%27folder1%27%20in%20parents%20and%20trashed%20%3D%20false"));
        assert!(url.contains("pageSize=1000"));
        assert!(url.contains("supportsAllDrives=true"));
        assert!(url.contains("includeItemsFromAllDrives=true"));
        assert!(!url.contains("pageToken"));
    }

    #[test]
    fn test_list_url_appends_page_token() {
        let url = DriveClient::list_url("folder1", Some("tok en".to_string()));

        assert!(url.ends_with("&pageToken=tok%20en"));
    }

    #[test]
    fn test_media_url() {
        assert_eq!(
            DriveClient::media_url("abc123"),
            "https://www.googleapis.com/drive/v3/files/abc123?alt=media&supportsAllDrives=true"
        );
    }

    #[test]
    fn test_export_url_requests_pdf() {
        let url = DriveClient::export_url("abc123");

        assert!(url.contains("/files/abc123/export"));
        assert!(url.contains("mimeType=application%2Fpdf"));
    }

    #[test]
    fn test_convert_item_marks_folders() {
        let item = DriveItem {
            id: "folder1".to_string(),
            name: "Contratos".to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            md5_checksum: None,
        };

        let child = DriveClient::convert_item(item);
        assert!(child.is_folder);
    }

    #[test]
    fn test_convert_item_keeps_file_fields() {
        let item = DriveItem {
            id: "file1".to_string(),
            name: "scan.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            md5_checksum: Some("d41d8cd98f00b204e9800998ecf8427e".to_string()),
        };

        let child = DriveClient::convert_item(item);
        assert!(!child.is_folder);
        assert_eq!(child.id, "file1");
        assert_eq!(
            child.md5_checksum,
            Some("d41d8cd98f00b204e9800998ecf8427e".to_string())
        );
    }

    #[test]
    fn test_status_error_maps_not_found() {
        let error = DriveClient::status_error(404, b"missing", "abc");

        assert!(matches!(error, DriveError::FileNotFound { .. }));
    }

    #[test]
    fn test_status_error_maps_auth_failures() {
        let error = DriveClient::status_error(403, b"forbidden", "abc");

        assert!(matches!(error, DriveError::AuthenticationFailed(_)));
    }
}
