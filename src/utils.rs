//! Utility functions for string manipulation and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for log-friendly previews of large response bodies
//! - Slugification for Markdown anchor links
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` characters with an ellipsis and a byte
/// count indicator appended. Cutting by characters keeps multi-byte input
/// safe to slice.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        let remaining = s.len() - cut.len();
        format!("{cut}…(+{remaining} bytes)")
    }
}

/// Convert a title to a URL-friendly slug.
///
/// Used to generate anchor links in the Markdown digest. Lowercases the
/// text, removes special characters, and replaces spaces with hyphens.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// assert_eq!(slugify_title("Test-Article!"), "test-article");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Small sync write via std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
