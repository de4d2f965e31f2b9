//! Image caption filter for page content.
//!
//! Finds images in Markdown source or rendered HTML and rewrites each one into
//! a `<figure>` with an optional `<figcaption>`, using the image title as the
//! caption.
//!
//! # Architecture
//!
//! - [`Grammar`]: the compiled rule registry, built once per process.
//! - [`attributes`]: turns raw captures into an ordered [`AttributeSet`].
//! - [`MarkdownRewriter`] / [`HtmlRewriter`]: one pass over a content string.
//! - [`ImageFilter`]: picks the rewriter from a [`FilterConfig`].
//!
//! Locating the image and producing markup are delegated to a
//! [`SourceResolver`] and a [`TemplateRenderer`]. [`PassthroughResolver`] and
//! [`FigureTemplate`] are the built-in implementations.
//!
//! # Example
//!
//! ```
//! use imgcaptions_filter::{FigureTemplate, FilterConfig, ImageFilter, PassthroughResolver};
//!
//! let filter = ImageFilter::new(FilterConfig::default()).unwrap();
//! let html = filter.apply(
//!     r#"![A cat](cat.jpg "Sleeping")"#,
//!     &PassthroughResolver,
//!     &FigureTemplate,
//! );
//! assert_eq!(
//!     html,
//!     r#"<figure><img src="cat.jpg" alt="A cat" title="Sleeping"><figcaption>Sleeping</figcaption></figure>"#
//! );
//! ```

pub mod attributes;
mod filter;
mod grammar;
mod html;
mod markdown;
mod replacements;
mod source;
mod template;

pub use attributes::{AttributeSet, MergePolicy};
pub use filter::{FilterConfig, ImageFilter, Mode, UnknownModeError};
pub use grammar::{Grammar, Rule};
pub use html::{HtmlRewriter, unwrap_paragraphs};
pub use imgcaptions_pattern::PatternError;
pub use markdown::{MarkdownRewriter, unwrap_anchors};
pub use source::{PageRef, PassthroughResolver, ResolvedSource, SourceResolver, basename};
pub use template::{FIGURE_TEMPLATE, FigureContext, FigureTemplate, RenderError, TemplateRenderer};
