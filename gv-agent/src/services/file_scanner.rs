//! Image file discovery
//!
//! Extension-based classification plus the startup scan over the watch
//! directory. The scan is non-recursive and sorted by file name so repeated
//! runs over an unchanged directory process images in the same order.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Check whether a path names a supported image, by extension only.
///
/// Pure predicate, case-insensitive, no filesystem access. Missing and
/// unrecognized extensions are simply not images.
pub fn is_image_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "bmp" | "gif")
        }
        None => false,
    }
}

/// Startup scanner for images already present in the watch directory.
pub struct ImageScanner;

impl ImageScanner {
    pub fn new() -> Self {
        Self
    }

    /// List image files directly under `watch_dir`, sorted by file name.
    ///
    /// The listing is a single point-in-time snapshot of the directory's
    /// direct entries. A missing watch directory yields an empty list: the
    /// agent may be started before its inbox exists. Unreadable entries are
    /// logged and skipped, never aborting the scan.
    pub fn scan(&self, watch_dir: &Path) -> Vec<PathBuf> {
        if !watch_dir.is_dir() {
            tracing::warn!(
                watch_dir = %watch_dir.display(),
                "Watch directory does not exist, nothing to scan"
            );
            return Vec::new();
        }

        let mut images = Vec::new();
        let walker = WalkDir::new(watch_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_image_file(entry.path()) {
                        images.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        images
    }
}

impl Default for ImageScanner {
    fn default() -> Self {
        Self::new()
    }
}
