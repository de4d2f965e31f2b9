//! Image source resolution against the page tree.

use imgcaptions_filter::{ResolvedSource, SourceResolver, basename};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::page::PageIndex;
use crate::scanner::strip_order_prefix;

/// Resolves image references relative to the page being rendered.
///
/// - Absolute URLs are returned unchanged.
/// - `/dir/file` belongs to the page at route `dir`, after removing `prefix`.
/// - `dir/file`, `./file` and `../dir/file` are relative to the current page.
/// - A bare `file` belongs to the current page.
///
/// When the owning page lists the file among its media, `src` becomes the
/// file's public URL. Otherwise `src` is the decoded reference.
#[derive(Debug, Clone)]
pub struct PageTreeResolver<'a> {
    index: &'a PageIndex,
    current: String,
}

impl<'a> PageTreeResolver<'a> {
    /// Resolver for the page at `current_route`.
    #[must_use]
    pub fn new(index: &'a PageIndex, current_route: &str) -> Self {
        Self {
            index,
            current: current_route.trim_matches('/').to_owned(),
        }
    }

    /// Owning route and file name of `path`; `None` when there is no file name.
    fn owner_route(&self, path: &str, prefix: Option<&str>) -> Option<(String, String)> {
        let (dir, name) = match path.rsplit_once('/') {
            Some((dir, name)) => (Some(dir), name),
            None => (None, path),
        };
        if name.is_empty() {
            return None;
        }

        let route = match dir {
            None => self.current.clone(),
            Some(dir) if path.starts_with('/') => normalize_route("", strip_prefix(dir, prefix)),
            Some(dir) => normalize_route(&self.current, dir),
        };
        Some((route, name.to_owned()))
    }
}

impl SourceResolver for PageTreeResolver<'_> {
    fn resolve(
        &self,
        raw_src: &str,
        prefix: Option<&str>,
        _media_actions: Option<&str>,
    ) -> ResolvedSource {
        if Url::parse(raw_src).is_ok() {
            return ResolvedSource {
                src: raw_src.to_owned(),
                filename: basename(raw_src).map(str::to_owned),
                page: None,
            };
        }

        let decoded = percent_decode_str(raw_src).decode_utf8_lossy().into_owned();
        let Some((route, name)) = self.owner_route(&decoded, prefix) else {
            return ResolvedSource {
                src: decoded,
                filename: None,
                page: None,
            };
        };

        let page = self.index.get(&route);
        let src = match page {
            Some(page) if page.has_media(&name) => page.media_url(&name),
            _ => {
                tracing::debug!(src = %decoded, route = %route, "Image not found in page media");
                decoded
            }
        };
        ResolvedSource {
            src,
            filename: Some(name),
            page: page.map(crate::page::Page::page_ref),
        }
    }
}

/// Remove `prefix` from the front of `dir` at a segment boundary.
fn strip_prefix<'p>(dir: &'p str, prefix: Option<&str>) -> &'p str {
    let Some(prefix) = prefix.map(|p| p.trim_end_matches('/')).filter(|p| !p.is_empty()) else {
        return dir;
    };
    match dir.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => dir,
    }
}

/// Join `path` onto `base` and resolve `.` and `..` segments.
///
/// `..` above the root stays at the root. Ordering prefixes are removed so
/// folder names and routes both work.
fn normalize_route(base: &str, path: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(strip_order_prefix(other)),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use imgcaptions_filter::PageRef;
    use pretty_assertions::assert_eq;

    use super::*;

    fn index() -> PageIndex {
        PageIndex::new("")
            .with_page("", ["logo.png"])
            .with_page("blog", ["header.jpg"])
            .with_page("blog/post", ["cat.jpg", "my photo.jpg"])
            .with_page("about", ["team.png"])
    }

    fn page(route: &str, url: &str) -> Option<PageRef> {
        Some(PageRef {
            route: route.to_owned(),
            url: url.to_owned(),
        })
    }

    #[test]
    fn test_absolute_url_unchanged() {
        let index = index();
        let resolved =
            PageTreeResolver::new(&index, "blog/post").resolve("https://cdn.x.com/a/b.png", None, None);
        assert_eq!(
            resolved,
            ResolvedSource {
                src: "https://cdn.x.com/a/b.png".to_owned(),
                filename: Some("b.png".to_owned()),
                page: None,
            }
        );
    }

    #[test]
    fn test_bare_file_on_current_page() {
        let index = index();
        let resolved = PageTreeResolver::new(&index, "blog/post").resolve("cat.jpg", None, None);
        assert_eq!(
            resolved,
            ResolvedSource {
                src: "/blog/post/cat.jpg".to_owned(),
                filename: Some("cat.jpg".to_owned()),
                page: page("blog/post", "/blog/post"),
            }
        );
    }

    #[test]
    fn test_percent_encoded_name() {
        let index = index();
        let resolved =
            PageTreeResolver::new(&index, "blog/post").resolve("my%20photo.jpg", None, None);
        assert_eq!(resolved.src, "/blog/post/my photo.jpg");
        assert_eq!(resolved.filename.as_deref(), Some("my photo.jpg"));
    }

    #[test]
    fn test_absolute_path_names_page() {
        let index = index();
        let resolved = PageTreeResolver::new(&index, "blog/post").resolve("/about/team.png", None, None);
        assert_eq!(resolved.src, "/about/team.png");
        assert_eq!(resolved.page, page("about", "/about"));
    }

    #[test]
    fn test_root_page_absolute_path() {
        let index = index();
        let resolved = PageTreeResolver::new(&index, "blog").resolve("/logo.png", None, None);
        assert_eq!(resolved.src, "/logo.png");
        assert_eq!(resolved.page, page("", "/"));
    }

    #[test]
    fn test_prefix_stripped_from_absolute_path() {
        let index = index();
        let resolver = PageTreeResolver::new(&index, "");
        let resolved = resolver.resolve("/docs/blog/header.jpg", Some("/docs"), None);
        assert_eq!(resolved.src, "/blog/header.jpg");
        assert_eq!(resolved.page, page("blog", "/blog"));

        let untouched = resolver.resolve("/docsite/x.png", Some("/docs"), None);
        assert_eq!(untouched.src, "/docsite/x.png");
        assert_eq!(untouched.page, None);
    }

    #[test]
    fn test_relative_paths() {
        let index = index();
        let resolver = PageTreeResolver::new(&index, "blog/post");

        assert_eq!(resolver.resolve("../header.jpg", None, None).src, "/blog/header.jpg");
        assert_eq!(resolver.resolve("./cat.jpg", None, None).src, "/blog/post/cat.jpg");
        assert_eq!(
            resolver.resolve("../../about/team.png", None, None).src,
            "/about/team.png"
        );
    }

    #[test]
    fn test_relative_dir_is_child_of_current_page() {
        let index = index();
        let resolver = PageTreeResolver::new(&index, "blog");
        let resolved = resolver.resolve("post/cat.jpg", None, None);
        assert_eq!(resolved.src, "/blog/post/cat.jpg");
        assert_eq!(resolved.page, page("blog/post", "/blog/post"));
    }

    #[test]
    fn test_folder_names_with_order_prefix() {
        let index = index();
        let resolver = PageTreeResolver::new(&index, "about");
        assert_eq!(
            resolver.resolve("../02.blog/01.post/cat.jpg", None, None).src,
            "/blog/post/cat.jpg"
        );
    }

    #[test]
    fn test_missing_media_falls_back_to_decoded_source() {
        let index = index();
        let resolved =
            PageTreeResolver::new(&index, "blog/post").resolve("dog%201.jpg", None, None);
        assert_eq!(
            resolved,
            ResolvedSource {
                src: "dog 1.jpg".to_owned(),
                filename: Some("dog 1.jpg".to_owned()),
                page: page("blog/post", "/blog/post"),
            }
        );
    }

    #[test]
    fn test_missing_page_falls_back() {
        let index = index();
        let resolved = PageTreeResolver::new(&index, "blog").resolve("/nowhere/x.png", None, None);
        assert_eq!(resolved.src, "/nowhere/x.png");
        assert_eq!(resolved.page, None);
    }

    #[test]
    fn test_directory_reference_has_no_filename() {
        let index = index();
        let resolved = PageTreeResolver::new(&index, "blog").resolve("images/", None, None);
        assert_eq!(resolved.src, "images/");
        assert_eq!(resolved.filename, None);
    }

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("a/b", "../c"), "a/c");
        assert_eq!(normalize_route("a", "../../.."), "");
        assert_eq!(normalize_route("", "./x//y/"), "x/y");
    }
}
