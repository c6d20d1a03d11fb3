//! # Name Sanitization
//!
//! Turns provider file and folder names into names that are safe on
//! every local filesystem the downloads may land on.
//!
//! ## Overview
//!
//! Sanitization is deterministic and idempotent: the same input always
//! produces the same output, and sanitizing an already-sanitized name is
//! a no-op. Over-long names are shortened with a digest of the original
//! name so that two long names differing only in their tails stay
//! distinct after truncation.

use sha2::{Digest, Sha256};

/// Characters replaced with `-` because at least one target filesystem
/// rejects them
const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Maximum length of a single path component, in characters
const MAX_NAME_CHARS: usize = 150;

/// Hex characters of the original-name digest kept in shortened names
const DIGEST_CHARS: usize = 8;

/// Sanitize one name for local use
///
/// The steps, in order:
///
/// 1. Collapse runs of whitespace into single spaces and trim the ends.
/// 2. Replace filesystem-hostile characters with `-`.
/// 3. If the result fits in 150 characters, return it.
/// 4. Otherwise truncate the stem, keeping the extension, and append an
///    8-character digest of the *original* name.
///
/// # Examples
///
/// ```
/// use core_extract::sanitize::sanitize_name;
///
/// assert_eq!(sanitize_name("Report: Q3/Q4 final.pdf"), "Report- Q3-Q4 final.pdf");
/// assert_eq!(sanitize_name("  spaced   out  .txt"), "spaced out .txt");
/// ```
pub fn sanitize_name(original: &str) -> String {
    let collapsed = original.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned: String = collapsed
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '-' } else { c })
        .collect();

    if cleaned.chars().count() <= MAX_NAME_CHARS {
        return cleaned;
    }

    shorten(original, &cleaned)
}

/// Shorten an over-long cleaned name, keeping it unique per original name
fn shorten(original: &str, cleaned: &str) -> String {
    let digest = name_digest(original);
    let (root, extension) = split_extension(cleaned);
    let extension_chars = extension.chars().count();

    // Room for the stem once the extension, digest and separator are kept.
    match MAX_NAME_CHARS.checked_sub(extension_chars + DIGEST_CHARS + 1) {
        Some(budget) => {
            let stem: String = root.chars().take(budget).collect();
            format!("{}_{}{}", stem, digest, extension)
        }
        // The extension alone overflows the limit; keep the head of the
        // cleaned name and give up on preserving the extension.
        None => cleaned.chars().take(MAX_NAME_CHARS).collect(),
    }
}

/// First eight hex characters of the SHA-256 of the original name
fn name_digest(original: &str) -> String {
    let hash = Sha256::digest(original.as_bytes());
    hash.iter().take(DIGEST_CHARS / 2).map(|b| format!("{:02x}", b)).collect()
}

/// Split a name into stem and extension at the last dot
///
/// A leading dot does not start an extension, so `.bashrc` has no
/// extension and `archive.tar.gz` splits as (`archive.tar`, `.gz`).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
