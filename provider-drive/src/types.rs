//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use serde::Deserialize;

/// Google Drive API file resource, projected to the fields we request
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type
    pub mime_type: String,

    /// MD5 checksum (absent for folders and Workspace-native documents)
    #[serde(default)]
    pub md5_checksum: Option<String>,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListResponse {
    /// Files in this page
    #[serde(default)]
    pub files: Vec<DriveItem>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}
