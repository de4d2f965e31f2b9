//! Image source resolution seam.

use serde::Serialize;

/// Identifying handle of the page that owns an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRef {
    /// Route of the page, e.g. `blog/hello`.
    pub route: String,
    /// Public URL of the page.
    pub url: String,
}

/// Outcome of resolving an image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Final image URL. Empty means the occurrence is skipped.
    pub src: String,
    /// Basename of the image file.
    pub filename: Option<String>,
    /// Page that owns the image, when one was found.
    pub page: Option<PageRef>,
}

/// Maps a raw image reference to its final location.
///
/// Implementations never fail: an unresolvable reference comes back as the
/// raw string.
pub trait SourceResolver {
    /// Resolve `raw_src`.
    ///
    /// `prefix` is a route prefix to strip from absolute paths and
    /// `media_actions` is the `?...` suffix of a Markdown image, if any.
    fn resolve(
        &self,
        raw_src: &str,
        prefix: Option<&str>,
        media_actions: Option<&str>,
    ) -> ResolvedSource;
}

/// Resolver that returns every reference unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

impl SourceResolver for PassthroughResolver {
    fn resolve(
        &self,
        raw_src: &str,
        _prefix: Option<&str>,
        _media_actions: Option<&str>,
    ) -> ResolvedSource {
        ResolvedSource {
            src: raw_src.to_owned(),
            filename: basename(raw_src).map(str::to_owned),
            page: None,
        }
    }
}

/// Last path segment of `src`, ignoring any query or fragment.
///
/// ```
/// use imgcaptions_filter::basename;
///
/// assert_eq!(basename("https://cdn.example.com/img/cat.jpg?w=10"), Some("cat.jpg"));
/// assert_eq!(basename("dir/"), None);
/// ```
#[must_use]
pub fn basename(src: &str) -> Option<&str> {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
