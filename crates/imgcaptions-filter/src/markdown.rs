//! Markdown image rewriting.
//!
//! ```text
//! raw ──linked images, then bare images──▶ per image:
//!     resolve ─▶ merge attributes ─▶ render ─▶ collect span
//! ──▶ splice all spans in one pass
//! ```

use std::ops::Range;

use regex::Captures;

use crate::attributes::{self, AttributeSet, MergePolicy};
use crate::grammar::{ANCHOR_SEPARATOR, Grammar, Rule};
use crate::replacements::Replacements;
use crate::source::SourceResolver;
use crate::template::{FIGURE_TEMPLATE, FigureContext, TemplateRenderer};

/// Rewrites Markdown images into rendered figures.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRewriter<'g> {
    grammar: &'g Grammar,
    merge: MergePolicy,
}

impl<'g> MarkdownRewriter<'g> {
    #[must_use]
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            merge: MergePolicy::default(),
        }
    }

    /// Set how media-action and extra attributes merge onto the base set.
    #[must_use]
    pub fn with_merge_policy(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    /// Rewrite every Markdown image in `content`.
    ///
    /// An image wrapped in a link is rendered with the link's target. Images
    /// whose source does not resolve, or whose figure fails to render, are
    /// left as written.
    #[must_use]
    pub fn rewrite(
        &self,
        content: &str,
        resolver: &dyn SourceResolver,
        renderer: &dyn TemplateRenderer,
    ) -> String {
        let image = self.grammar.regex(Rule::MarkdownImage);
        let mut replacements = Replacements::new();
        let mut linked: Vec<Range<usize>> = Vec::new();
        let mut rendered = 0usize;

        for caps in self.grammar.regex(Rule::MarkdownAnchorWrapper).captures_iter(content) {
            let (Some(whole), Some(inner), Some(url)) =
                (caps.get(0), caps.name("image"), caps.name("url"))
            else {
                continue;
            };
            linked.push(whole.range());
            let Some(image_caps) = image.captures(inner.as_str()) else {
                continue;
            };
            let figure = self.figure(&image_caps, Some(url.as_str()), resolver, renderer);
            if let Some(figure) = figure {
                replacements.add(whole.range(), figure);
                rendered += 1;
            }
        }

        for caps in image.captures_iter(content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if linked.iter().any(|span| span.contains(&whole.start())) {
                continue;
            }
            let url = caps.name("url").map(|m| strip_separator(m.as_str()));
            if let Some(figure) = self.figure(&caps, url, resolver, renderer) {
                replacements.add(whole.range(), figure);
                rendered += 1;
            }
        }

        if replacements.is_empty() {
            return content.to_owned();
        }
        tracing::debug!(images = rendered, "Rewrote Markdown images");
        replacements.apply(content)
    }

    fn figure(
        &self,
        caps: &Captures<'_>,
        url: Option<&str>,
        resolver: &dyn SourceResolver,
        renderer: &dyn TemplateRenderer,
    ) -> Option<String> {
        let raw_src = format!("{}.{}", &caps["file"], &caps["ext"]);
        let media_actions = caps.name("mediaActions").map(|m| m.as_str());

        let resolved = resolver.resolve(&raw_src, None, media_actions);
        if resolved.src.is_empty() {
            tracing::debug!(src = %raw_src, "Image source did not resolve, skipping");
            return None;
        }

        let mut attrs = AttributeSet::new();
        attrs.insert("src", resolved.src.as_str());
        attrs.insert("alt", caps.name("alt").map_or("", |m| m.as_str()));
        attrs.insert("title", caps.name("title").map_or("", |m| m.as_str()));
        if let Some(actions) = media_actions {
            attrs.merge(
                attributes::markdown_media_actions(self.grammar, actions),
                self.merge,
            );
        }
        if let Some(extra) = caps.name("extra") {
            attrs.merge(attributes::markdown_extra(extra.as_str()), self.merge);
        }
        attrs.insert("src", resolved.src);

        let context = FigureContext {
            attrs,
            filename: resolved.filename,
            url: url.map(str::to_owned),
            page: resolved.page,
        };
        match renderer.render(FIGURE_TEMPLATE, &context) {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!(src = %raw_src, error = %e, "Failed to render figure, keeping image");
                None
            }
        }
    }
}

/// Rewrite `[![alt](img)](url)` into `![alt](img)___url`.
///
/// ```
/// use imgcaptions_filter::{Grammar, unwrap_anchors};
///
/// let grammar = Grammar::shared().unwrap();
/// assert_eq!(
///     unwrap_anchors(grammar, "[![alt](a.jpg)](http://x.com)"),
///     "![alt](a.jpg)___http://x.com"
/// );
/// ```
#[must_use]
pub fn unwrap_anchors(grammar: &Grammar, content: &str) -> String {
    grammar
        .regex(Rule::MarkdownAnchorWrapper)
        .replace_all(content, |caps: &Captures<'_>| {
            format!("{}{ANCHOR_SEPARATOR}{}", &caps["image"], &caps["url"])
        })
        .into_owned()
}

fn strip_separator(url: &str) -> &str {
    url.strip_prefix(ANCHOR_SEPARATOR).unwrap_or(url)
}
