//! Remote Storage Abstraction
//!
//! Provides the provider-agnostic trait for enumerating and fetching the
//! contents of a remote folder tree.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// One directory entry as reported by the provider.
///
/// Names arrive exactly as the provider stores them; sanitization is the
/// caller's concern. `is_folder` is computed by the provider from its own
/// folder marker so callers never compare mime strings to decide traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteChild {
    /// Provider-assigned stable identifier
    pub id: String,
    /// Display name, unsanitized
    pub name: String,
    /// Provider mime type
    pub mime_type: String,
    /// Content checksum when the provider reports one (absent for folders
    /// and provider-native documents)
    pub md5_checksum: Option<String>,
    /// Whether this entry is a traversable folder
    pub is_folder: bool,
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default)]
pub struct ChildPage {
    /// Entries in this page, in provider order
    pub children: Vec<RemoteChild>,
    /// Continuation token; `None` means this was the last page
    pub next_page_token: Option<String>,
}

/// Remote source trait
///
/// Abstracts the storage provider behind the extraction pipeline. One
/// implementation exists per provider API; tests supply mocks.
///
/// Implementations perform a single attempt per call. Retry policy belongs
/// to the callers: the tree walker decides what a failed listing means, and
/// the transfer engine owns the bounded retry loop for fetches.
///
/// # Example
///
/// ```ignore
/// use core_remote::source::RemoteSource;
///
/// async fn count_children(source: &dyn RemoteSource, folder_id: &str) -> usize {
///     let mut total = 0;
///     let mut token = None;
///     loop {
///         let page = source.list_children(folder_id, token).await.unwrap();
///         total += page.children.len();
///         match page.next_page_token {
///             Some(next) => token = Some(next),
///             None => break,
///         }
///     }
///     total
/// }
/// ```
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// List one page of the direct children of a folder
    ///
    /// Pass the token from the previous page to continue; `None` starts
    /// from the first page. Trashed items are never returned.
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<String>,
    ) -> Result<ChildPage>;

    /// Stream a file's raw bytes to a local path
    ///
    /// Returns the number of bytes written. The destination's parent
    /// directory must already exist.
    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<u64>;

    /// Export a provider-native document as PDF to a local path
    ///
    /// Returns the number of bytes written. Only valid for entries whose
    /// mime type the provider can convert.
    async fn export_to(&self, file_id: &str, dest: &Path) -> Result<u64>;
}
