//! Filter entry point.

use std::fmt;
use std::str::FromStr;

use imgcaptions_pattern::PatternError;
use serde::{Deserialize, Serialize};

use crate::attributes::MergePolicy;
use crate::grammar::Grammar;
use crate::html::HtmlRewriter;
use crate::markdown::MarkdownRewriter;
use crate::source::SourceResolver;
use crate::template::TemplateRenderer;

/// Which surface syntax the filter rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Markdown source, before it is rendered.
    #[default]
    Markdown,
    /// Rendered HTML.
    Html,
}

impl Mode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mode '{0}', expected 'markdown' or 'html'")]
pub struct UnknownModeError(pub String);

impl FromStr for Mode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            _ => Err(UnknownModeError(s.to_owned())),
        }
    }
}

/// Filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub enabled: bool,
    pub mode: Mode,
    pub merge: MergePolicy,
    /// Route prefix handed to the resolver in HTML mode.
    pub prefix: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: Mode::default(),
            merge: MergePolicy::default(),
            prefix: String::new(),
        }
    }
}

/// Rewrites images in page content according to a [`FilterConfig`].
#[derive(Debug, Clone)]
pub struct ImageFilter {
    config: FilterConfig,
    grammar: &'static Grammar,
}

impl ImageFilter {
    /// Create a filter, building the shared grammar if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a grammar rule fails to build or compile.
    pub fn new(config: FilterConfig) -> Result<Self, PatternError> {
        Ok(Self {
            config,
            grammar: Grammar::shared()?,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Rewrite `content`. Returns it unchanged when the filter is disabled.
    #[must_use]
    pub fn apply(
        &self,
        content: &str,
        resolver: &dyn SourceResolver,
        renderer: &dyn TemplateRenderer,
    ) -> String {
        if !self.config.enabled {
            return content.to_owned();
        }
        match self.config.mode {
            Mode::Markdown => MarkdownRewriter::new(self.grammar)
                .with_merge_policy(self.config.merge)
                .rewrite(content, resolver, renderer),
            Mode::Html => HtmlRewriter::new(self.grammar)
                .with_prefix(self.config.prefix.as_str())
                .rewrite(content, resolver, renderer),
        }
    }
}
