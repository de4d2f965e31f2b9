//! Grammar rules for Markdown and HTML images.
//!
//! Every rule is declared once in [`Rule`] and compiled into the [`Grammar`]
//! registry. Guards that a backtracking engine would write as lookaheads are
//! expressed as negated character sets, so every rule matches in linear time.

use std::sync::OnceLock;

use imgcaptions_pattern::{Pattern, PatternBuilder, PatternError};
use regex::Regex;

/// Image extensions recognized in Markdown sources.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "gif", "jpg", "jpeg"];

/// Schemes accepted for links wrapped around an image.
const LINK_SCHEMES: [&str; 4] = ["http", "https", "ftp", "file"];

/// Separator between an unwrapped image and its link target.
pub(crate) const ANCHOR_SEPARATOR: &str = "___";

const FLAGS: &str = "iu";

static GRAMMAR: OnceLock<Grammar> = OnceLock::new();

/// Named grammar rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    /// `[![alt](file.ext)](url)`, captures `image` and `url`.
    MarkdownAnchorWrapper,
    /// Markdown image with optional media actions, title, extra block and
    /// appended link.
    MarkdownImage,
    /// One `key` or `key=value` token of a media-action query.
    MarkdownMediaAction,
    /// `<p>` holding nothing but an image, optionally inside a link.
    HtmlParagraphWrapper,
    /// A complete `<img>` tag.
    HtmlImage,
    /// One `name=value` attribute of a tag.
    HtmlAttribute,
}

impl Rule {
    /// All rules, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::MarkdownAnchorWrapper,
        Self::MarkdownImage,
        Self::MarkdownMediaAction,
        Self::HtmlParagraphWrapper,
        Self::HtmlImage,
        Self::HtmlAttribute,
    ];

    /// Stable rule name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::MarkdownAnchorWrapper => "markdown_anchor_wrapper",
            Self::MarkdownImage => "markdown_image",
            Self::MarkdownMediaAction => "markdown_media_action",
            Self::HtmlParagraphWrapper => "html_paragraph_wrapper",
            Self::HtmlImage => "html_image",
            Self::HtmlAttribute => "html_attribute",
        }
    }

    /// Build the rule's pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule definition is malformed.
    pub fn pattern(self) -> Result<Pattern, PatternError> {
        let builder = match self {
            Self::MarkdownAnchorWrapper => markdown_anchor_wrapper(),
            Self::MarkdownImage => markdown_image(),
            Self::MarkdownMediaAction => markdown_media_action(),
            Self::HtmlParagraphWrapper => html_paragraph_wrapper(),
            Self::HtmlImage => html_image(),
            Self::HtmlAttribute => html_attribute(),
        };
        builder.get_pattern(FLAGS)
    }
}

struct CompiledRule {
    rule: Rule,
    pattern: Pattern,
    regex: Regex,
}

/// Compiled registry of all [`Rule`]s.
///
/// Read-only after construction and safe to share between threads.
pub struct Grammar {
    rules: Vec<CompiledRule>,
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.rules.iter().map(|c| (c.rule.name(), c.pattern.as_str())))
            .finish()
    }
}

impl Grammar {
    /// Build and compile every rule.
    ///
    /// # Errors
    ///
    /// Returns the first rule that fails to build or compile.
    pub fn build() -> Result<Self, PatternError> {
        let rules = Rule::ALL
            .into_iter()
            .map(|rule| {
                let pattern = rule.pattern()?;
                let regex = pattern.compile()?;
                Ok(CompiledRule {
                    rule,
                    pattern,
                    regex,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { rules })
    }

    /// Process-wide grammar, built on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar fails to build; a later call retries.
    pub fn shared() -> Result<&'static Self, PatternError> {
        if let Some(grammar) = GRAMMAR.get() {
            return Ok(grammar);
        }
        let grammar = Self::build()?;
        Ok(GRAMMAR.get_or_init(|| grammar))
    }

    /// Compiled regex for `rule`.
    #[must_use]
    pub fn regex(&self, rule: Rule) -> &Regex {
        &self.entry(rule).regex
    }

    /// Finalized pattern for `rule`.
    #[must_use]
    pub fn pattern(&self, rule: Rule) -> &Pattern {
        &self.entry(rule).pattern
    }

    /// Every rule with its pattern, in declaration order.
    pub fn patterns(&self) -> impl Iterator<Item = (Rule, &Pattern)> {
        self.rules.iter().map(|c| (c.rule, &c.pattern))
    }

    fn entry(&self, rule: Rule) -> &CompiledRule {
        // `build` compiles rules in `Rule::ALL` order, which is declaration order.
        &self.rules[rule as usize]
    }
}

// ── Markdown ────────────────────────────────────────────────────────

fn markdown_anchor_wrapper() -> PatternBuilder {
    PatternBuilder::new()
        .literal("[")
        .named_capture("image", |b| b.then(markdown_image_body()))
        .literal("](")
        .named_capture("url", |b| b.then(link_target()))
        .literal(")")
}

fn markdown_image() -> PatternBuilder {
    markdown_image_body().then(markdown_anchor_append())
}

/// `![alt](file.ext?actions "title"){extra}` without the appended link.
fn markdown_image_body() -> PatternBuilder {
    PatternBuilder::new()
        .literal("!")
        .then(markdown_alt())
        .whitespace()
        .zero_or_more()
        .then(markdown_file())
        .then(markdown_extra())
}

/// Alt text; one level of nested `[...]` is allowed.
fn markdown_alt() -> PatternBuilder {
    PatternBuilder::new()
        .literal("[")
        .named_capture("alt", |b| {
            b.optional_capture(|b| {
                b.negative_group("[]\n")
                    .or()
                    .literal("[")
                    .negative_group("[]\n")
                    .zero_or_more()
                    .literal("]")
            })
            .zero_or_more()
        })
        .literal("]")
}

fn markdown_file() -> PatternBuilder {
    PatternBuilder::new()
        .literal("(")
        .named_capture("file", |b| {
            b.negative_group_with(|s| s.whitespace().literal("()\"?"))
                .one_or_more()
                .lazy()
        })
        .then(image_extension())
        .then(media_actions())
        .whitespace()
        .zero_or_more()
        .then(markdown_title())
        .whitespace()
        .zero_or_more()
        .literal(")")
}

fn image_extension() -> PatternBuilder {
    PatternBuilder::new()
        .literal(".")
        .named_capture("ext", |b| b.one_of(&IMAGE_EXTENSIONS))
}

/// `?...` up to whitespace, a quote or the closing parenthesis.
fn media_actions() -> PatternBuilder {
    PatternBuilder::new()
        .named_capture("mediaActions", |b| {
            b.literal("?")
                .negative_group_with(|s| s.whitespace().literal("\")"))
                .zero_or_more()
        })
        .optional()
}

fn markdown_title() -> PatternBuilder {
    PatternBuilder::new()
        .optional_capture(|b| {
            b.literal("\"")
                .named_capture("title", |b| b.negative_group("\"\n").zero_or_more())
                .literal("\"")
        })
        .optional()
}

fn markdown_extra() -> PatternBuilder {
    PatternBuilder::new()
        .optional_capture(|b| {
            b.group(" \t")
                .zero_or_more()
                .literal("{")
                .named_capture("extra", |b| b.negative_group("}\n").zero_or_more())
                .literal("}")
        })
        .optional()
}

fn markdown_anchor_append() -> PatternBuilder {
    PatternBuilder::new()
        .named_capture("url", |b| b.literal(ANCHOR_SEPARATOR).then(link_target()))
        .optional()
}

/// Scheme-qualified URL; parentheses must pair up one level deep.
fn link_target() -> PatternBuilder {
    PatternBuilder::new()
        .one_of(&LINK_SCHEMES)
        .literal("://")
        .optional_capture(|b| {
            b.negative_group_with(|s| s.whitespace().literal("()"))
                .or()
                .literal("(")
                .negative_group_with(|s| s.whitespace().literal("()"))
                .zero_or_more()
                .literal(")")
        })
        .one_or_more()
}

fn markdown_media_action() -> PatternBuilder {
    PatternBuilder::new()
        .named_capture("key", |b| {
            b.group_with(|s| s.word_char().literal("-")).one_or_more()
        })
        .optional_capture(|b| {
            b.literal("=").named_capture("value", |b| {
                b.negative_group_with(|s| s.whitespace().literal("&"))
                    .zero_or_more()
            })
        })
        .optional()
}

// ── HTML ────────────────────────────────────────────────────────────

fn html_paragraph_wrapper() -> PatternBuilder {
    PatternBuilder::new()
        .literal("<p>")
        .whitespace()
        .zero_or_more()
        .named_capture("image", |b| b.then(html_linked_image()).or().then(html_image()))
        .optional()
        .whitespace()
        .zero_or_more()
        .literal("</p>")
}

fn html_linked_image() -> PatternBuilder {
    PatternBuilder::new()
        .literal("<a")
        .word_boundary()
        .negative_group(">")
        .zero_or_more()
        .literal(">")
        .whitespace()
        .zero_or_more()
        .then(html_image())
        .whitespace()
        .zero_or_more()
        .literal("</a>")
}

fn html_image() -> PatternBuilder {
    PatternBuilder::new()
        .literal("<img")
        .word_boundary()
        .negative_group(">")
        .zero_or_more()
        .lazy()
        .literal("/")
        .optional()
        .literal(">")
}

/// Group 1 is the name; the value is in group 2 (`"..."`), 3 (`'...'`) or 4 (bare).
fn html_attribute() -> PatternBuilder {
    PatternBuilder::new()
        .capture(|b| {
            b.negative_group_with(|s| s.whitespace().literal("=<>\"'/"))
                .one_or_more()
        })
        .whitespace()
        .zero_or_more()
        .literal("=")
        .whitespace()
        .zero_or_more()
        .optional_capture(|b| {
            b.literal("\"")
                .capture(|b| b.negative_group("\"").zero_or_more())
                .literal("\"")
                .or()
                .literal("'")
                .capture(|b| b.negative_group("'").zero_or_more())
                .literal("'")
                .or()
                .capture(|b| {
                    b.negative_group_with(|s| s.whitespace().literal(">\"'"))
                        .one_or_more()
                })
        })
}
