//! Page discovery by filesystem walking.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SiteError;
use crate::page::PageIndex;

/// File extensions collected as page media.
const MEDIA_EXTENSIONS: [&str; 4] = ["png", "gif", "jpg", "jpeg"];

/// Builds a [`PageIndex`] by walking a pages directory.
///
/// Every directory holding at least one `.md` file is a page. Its route is the
/// directory path relative to the root with ordering prefixes removed, and its
/// media are the image files next to the Markdown file.
pub struct Scanner {
    pages_dir: PathBuf,
}

impl Scanner {
    pub fn new(pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
        }
    }

    /// Scan the pages directory.
    ///
    /// Unreadable subdirectories are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the pages directory is missing or unreadable.
    pub fn scan(&self, base_url: &str) -> Result<PageIndex, SiteError> {
        if !self.pages_dir.is_dir() {
            return Err(SiteError::NotFound(self.pages_dir.clone()));
        }
        let mut index = PageIndex::new(base_url);
        scan_directory(&self.pages_dir, "", &mut index)?;
        tracing::info!(
            pages = index.len(),
            dir = %self.pages_dir.display(),
            "Scanned pages"
        );
        Ok(index)
    }
}

fn scan_directory(dir_path: &Path, route: &str, index: &mut PageIndex) -> Result<(), SiteError> {
    let entries = fs::read_dir(dir_path).map_err(|source| SiteError::Io {
        path: dir_path.to_path_buf(),
        source,
    })?;

    let mut has_markdown = false;
    let mut media = Vec::new();

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        // Skip hidden files/dirs
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            let segment = strip_order_prefix(&name);
            let child_route = if route.is_empty() {
                segment.to_owned()
            } else {
                format!("{route}/{segment}")
            };
            if let Err(e) = scan_directory(&path, &child_route, index) {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable directory");
            }
            continue;
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("md") => has_markdown = true,
            Some(ext) if MEDIA_EXTENSIONS.contains(&ext) => media.push(name),
            _ => {}
        }
    }

    if has_markdown {
        index.insert(route, media);
    }
    Ok(())
}

/// Remove a numeric ordering prefix from a folder name.
///
/// ```
/// use imgcaptions_site::strip_order_prefix;
///
/// assert_eq!(strip_order_prefix("01.blog"), "blog");
/// assert_eq!(strip_order_prefix("blog"), "blog");
/// assert_eq!(strip_order_prefix("2024"), "2024");
/// ```
#[must_use]
pub fn strip_order_prefix(name: &str) -> &str {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return name;
    }
    match name[digits..].strip_prefix('.') {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}
