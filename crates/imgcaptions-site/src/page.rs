//! Pages and the page index.

use std::collections::{BTreeMap, BTreeSet};

use imgcaptions_filter::PageRef;

/// A page and the image files it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Route without leading or trailing slashes; `""` is the root page.
    pub route: String,
    /// Public URL of the page.
    pub url: String,
    /// Image file names in the page directory.
    pub media: BTreeSet<String>,
}

impl Page {
    #[must_use]
    pub fn has_media(&self, name: &str) -> bool {
        self.media.contains(name)
    }

    /// Public URL of one of the page's files.
    #[must_use]
    pub fn media_url(&self, name: &str) -> String {
        if self.url.ends_with('/') {
            format!("{}{name}", self.url)
        } else {
            format!("{}/{name}", self.url)
        }
    }

    #[must_use]
    pub fn page_ref(&self) -> PageRef {
        PageRef {
            route: self.route.clone(),
            url: self.url.clone(),
        }
    }
}

/// Pages keyed by route.
///
/// ```
/// use imgcaptions_site::PageIndex;
///
/// let index = PageIndex::new("/site").with_page("blog/post", ["cat.jpg"]);
/// let page = index.get("blog/post").unwrap();
/// assert_eq!(page.url, "/site/blog/post");
/// assert_eq!(page.media_url("cat.jpg"), "/site/blog/post/cat.jpg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    base_url: String,
    pages: BTreeMap<String, Page>,
}

impl PageIndex {
    /// Create an empty index whose page URLs start with `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            pages: BTreeMap::new(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_page<I, S>(mut self, route: &str, media: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(route, media);
        self
    }

    /// Add or replace the page at `route`.
    pub fn insert<I, S>(&mut self, route: &str, media: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let route = route.trim_matches('/').to_owned();
        let page = Page {
            url: self.page_url(&route),
            media: media.into_iter().map(Into::into).collect(),
            route: route.clone(),
        };
        self.pages.insert(route, page);
    }

    #[must_use]
    pub fn get(&self, route: &str) -> Option<&Page> {
        self.pages.get(route.trim_matches('/'))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All pages in route order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn page_url(&self, route: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/{route}")
    }
}
