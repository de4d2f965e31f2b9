//! HTML image rewriting.

use std::borrow::Cow;

use regex::Captures;

use crate::attributes;
use crate::grammar::{Grammar, Rule};
use crate::replacements::Replacements;
use crate::source::SourceResolver;
use crate::template::{FIGURE_TEMPLATE, FigureContext, TemplateRenderer};

/// Rewrites `<img>` tags in rendered HTML into figures.
///
/// The tag's own `src` is kept; the resolver only contributes the filename
/// and the owning page.
#[derive(Debug, Clone)]
pub struct HtmlRewriter<'g> {
    grammar: &'g Grammar,
    prefix: Option<String>,
}

impl<'g> HtmlRewriter<'g> {
    #[must_use]
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            prefix: None,
        }
    }

    /// Route prefix handed to the resolver.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Rewrite every `<img>` tag in `content`.
    #[must_use]
    pub fn rewrite(
        &self,
        content: &str,
        resolver: &dyn SourceResolver,
        renderer: &dyn TemplateRenderer,
    ) -> String {
        let unwrapped = unwrap(self.grammar, content);
        let mut replacements = Replacements::new();

        for tag in self.grammar.regex(Rule::HtmlImage).find_iter(&unwrapped) {
            if let Some(figure) = self.figure(tag.as_str(), resolver, renderer) {
                replacements.add(tag.range(), figure);
            }
        }

        if replacements.is_empty() {
            return unwrapped.into_owned();
        }
        replacements.apply(&unwrapped)
    }

    fn figure(
        &self,
        tag: &str,
        resolver: &dyn SourceResolver,
        renderer: &dyn TemplateRenderer,
    ) -> Option<String> {
        let attrs = attributes::html_attributes(self.grammar, tag);
        let Some(src) = attrs.get("src").filter(|s| !s.is_empty()) else {
            tracing::debug!(tag, "Image tag without src, skipping");
            return None;
        };

        let resolved = resolver.resolve(src, self.prefix.as_deref(), None);
        let context = FigureContext {
            attrs,
            filename: resolved.filename,
            url: None,
            page: resolved.page,
        };
        match renderer.render(FIGURE_TEMPLATE, &context) {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!(tag, error = %e, "Failed to render figure, keeping image");
                None
            }
        }
    }
}

/// Replace `<p>` elements holding only an image (optionally linked) with the
/// image itself. Empty paragraphs are removed.
///
/// ```
/// use imgcaptions_filter::{Grammar, unwrap_paragraphs};
///
/// let grammar = Grammar::shared().unwrap();
/// assert_eq!(
///     unwrap_paragraphs(grammar, "<p>\n  <img src=\"a.jpg\">\n</p>"),
///     "<img src=\"a.jpg\">"
/// );
/// ```
#[must_use]
pub fn unwrap_paragraphs(grammar: &Grammar, content: &str) -> String {
    unwrap(grammar, content).into_owned()
}

fn unwrap<'c>(grammar: &Grammar, content: &'c str) -> Cow<'c, str> {
    grammar
        .regex(Rule::HtmlParagraphWrapper)
        .replace_all(content, |caps: &Captures<'_>| {
            caps.name("image")
                .map_or_else(String::new, |m| m.as_str().to_owned())
        })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::{PageRef, PassthroughResolver, ResolvedSource};
    use crate::template::{FigureTemplate, RenderError};

    fn grammar() -> &'static Grammar {
        Grammar::shared().unwrap()
    }

    fn rewrite(content: &str) -> String {
        HtmlRewriter::new(grammar()).rewrite(content, &PassthroughResolver, &FigureTemplate)
    }

    /// Resolver that records the prefix and returns a fixed page.
    #[derive(Default)]
    struct PrefixResolver {
        prefix: RefCell<Option<String>>,
    }

    impl SourceResolver for PrefixResolver {
        fn resolve(
            &self,
            raw_src: &str,
            prefix: Option<&str>,
            _media_actions: Option<&str>,
        ) -> ResolvedSource {
            *self.prefix.borrow_mut() = prefix.map(str::to_owned);
            ResolvedSource {
                src: format!("/resolved/{raw_src}"),
                filename: Some("a.jpg".to_owned()),
                page: Some(PageRef {
                    route: "blog".to_owned(),
                    url: "/blog".to_owned(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        contexts: RefCell<Vec<FigureContext>>,
    }

    impl TemplateRenderer for RecordingRenderer {
        fn render(&self, _: &str, context: &FigureContext) -> Result<String, RenderError> {
            self.contexts.borrow_mut().push(context.clone());
            Ok("<figure/>".to_owned())
        }
    }

    #[test]
    fn test_unwrap_bare_image_paragraph() {
        assert_eq!(
            unwrap_paragraphs(grammar(), "<p>\n  <img src=\"a.jpg\">\n</p>"),
            "<img src=\"a.jpg\">"
        );
    }

    #[test]
    fn test_unwrap_linked_image_paragraph() {
        assert_eq!(
            unwrap_paragraphs(
                grammar(),
                r#"<p><a href="http://x.com"> <img src="a.jpg"/> </a></p>"#
            ),
            r#"<a href="http://x.com"> <img src="a.jpg"/> </a>"#
        );
    }

    #[test]
    fn test_unwrap_removes_empty_paragraph() {
        assert_eq!(unwrap_paragraphs(grammar(), "a<p> </p>b"), "ab");
    }

    #[test]
    fn test_unwrap_keeps_text_paragraphs() {
        let html = r#"<p>Photo: <img src="a.jpg"></p>"#;
        assert_eq!(unwrap_paragraphs(grammar(), html), html);
    }

    #[test]
    fn test_rewrite_paragraph_image() {
        assert_eq!(
            rewrite("<p>\n  <img src=\"a.jpg\" alt=\"A\" title=\"T\">\n</p>"),
            r#"<figure><img src="a.jpg" alt="A" title="T"><figcaption>T</figcaption></figure>"#
        );
    }

    #[test]
    fn test_rewrite_inline_image_keeps_paragraph() {
        assert_eq!(
            rewrite(r#"<p>Photo: <img src="a.jpg" class="y"></p>"#),
            r#"<p>Photo: <figure><img src="a.jpg" alt="" class="y"></figure></p>"#
        );
    }

    #[test]
    fn test_attributes_reach_renderer_exactly() {
        let renderer = RecordingRenderer::default();
        let out = HtmlRewriter::new(grammar()).rewrite(
            r#"<img src="x" class="y">"#,
            &PassthroughResolver,
            &renderer,
        );
        assert_eq!(out, "<figure/>");
        let contexts = renderer.contexts.borrow();
        let attrs: Vec<_> = contexts[0].attrs.iter().collect();
        assert_eq!(attrs, vec![("src", "x"), ("class", "y")]);
    }

    #[test]
    fn test_missing_src_is_skipped() {
        let html = r#"<img alt="nothing"> <img src="">"#;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn test_tag_src_kept_and_resolution_used() {
        let resolver = PrefixResolver::default();
        let renderer = RecordingRenderer::default();
        let out = HtmlRewriter::new(grammar())
            .with_prefix("/docs")
            .rewrite(r#"<img src="/docs/blog/a.jpg">"#, &resolver, &renderer);
        assert_eq!(out, "<figure/>");

        assert_eq!(resolver.prefix.borrow().as_deref(), Some("/docs"));
        let contexts = renderer.contexts.borrow();
        assert_eq!(contexts[0].attrs.get("src"), Some("/docs/blog/a.jpg"));
        assert_eq!(contexts[0].filename.as_deref(), Some("a.jpg"));
        assert_eq!(
            contexts[0].page.as_ref().map(|p| p.url.as_str()),
            Some("/blog")
        );
    }

    #[test]
    fn test_empty_prefix_is_none() {
        let resolver = PrefixResolver::default();
        let out = HtmlRewriter::new(grammar()).with_prefix("").rewrite(
            r#"<img src="a.jpg">"#,
            &resolver,
            &RecordingRenderer::default(),
        );
        assert_eq!(out, "<figure/>");
        assert_eq!(*resolver.prefix.borrow(), None);
    }

    #[test]
    fn test_self_closing_tag_with_bare_src() {
        assert_eq!(
            rewrite("<img src=a.jpg/>"),
            r#"<figure><img src="a.jpg" alt=""></figure>"#
        );
        assert_eq!(
            rewrite("<img alt=x src=/img/a.jpg />"),
            r#"<figure><img src="/img/a.jpg" alt="x"></figure>"#
        );
    }

    #[test]
    fn test_html_without_images_unchanged() {
        let html = "<h1>Title</h1>\n<p>Text</p>";
        assert_eq!(rewrite(html), html);
    }
}
