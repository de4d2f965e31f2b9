//! Page tree for imgcaptions.
//!
//! Knows which pages exist, which images each page owns, and how a page's
//! front matter overrides the filter settings.
//!
//! - [`Scanner`] walks a pages directory into a [`PageIndex`].
//! - [`PageTreeResolver`] resolves image references against the index.
//! - [`split_front_matter`] and [`PageHeader`] read a page file's header.

mod error;
mod front_matter;
mod page;
mod resolver;
mod scanner;

pub use error::SiteError;
pub use front_matter::{PageHeader, split_front_matter};
pub use page::{Page, PageIndex};
pub use resolver::PageTreeResolver;
pub use scanner::{Scanner, strip_order_prefix};
