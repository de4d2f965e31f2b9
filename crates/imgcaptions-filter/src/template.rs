//! Figure rendering seam and the built-in figure template.

use std::fmt::Write;

use serde::Serialize;

use crate::attributes::AttributeSet;
use crate::source::PageRef;

/// Template name passed to [`TemplateRenderer::render`] for every image.
pub const FIGURE_TEMPLATE: &str = "partials/figure";

/// Attributes emitted first, in this order, by [`FigureTemplate`].
const LEADING_ATTRIBUTES: [&str; 3] = ["src", "alt", "title"];

/// Everything a template needs to render one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FigureContext {
    pub attrs: AttributeSet,
    pub filename: Option<String>,
    /// Link target when the image was wrapped in a link.
    pub url: Option<String>,
    pub page: Option<PageRef>,
}

/// Template rendering error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("Template {template} failed: {message}")]
    Failed { template: String, message: String },
}

/// Renders a named template with a [`FigureContext`].
pub trait TemplateRenderer {
    /// Render `template` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the template is unknown or fails to render.
    fn render(&self, template: &str, context: &FigureContext) -> Result<String, RenderError>;
}

/// Built-in renderer for [`FIGURE_TEMPLATE`].
///
/// Produces `<figure>`, an optional `<a href>` around the `<img>`, and a
/// `<figcaption>` when the title is non-empty. `alt` is always written; other
/// empty attributes and names that are not valid HTML attribute names are
/// dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FigureTemplate;

impl TemplateRenderer for FigureTemplate {
    fn render(&self, template: &str, context: &FigureContext) -> Result<String, RenderError> {
        if template != FIGURE_TEMPLATE {
            return Err(RenderError::UnknownTemplate(template.to_owned()));
        }

        let attrs = &context.attrs;
        let mut out = String::from("<figure>");
        if let Some(url) = &context.url {
            write!(out, r#"<a href="{}">"#, escape_html(url)).unwrap();
        }

        out.push_str("<img");
        for name in LEADING_ATTRIBUTES {
            if let Some(value) = attrs.get(name) {
                write_attribute(&mut out, name, value, name == "alt");
            } else if name == "alt" {
                out.push_str(r#" alt="""#);
            }
        }
        for (name, value) in attrs.iter() {
            if LEADING_ATTRIBUTES.contains(&name) || !is_attribute_name(name) {
                continue;
            }
            write_attribute(&mut out, name, value, false);
        }
        out.push('>');

        if context.url.is_some() {
            out.push_str("</a>");
        }
        if let Some(title) = attrs.get("title").filter(|t| !t.is_empty()) {
            write!(out, "<figcaption>{}</figcaption>", escape_html(title)).unwrap();
        }
        out.push_str("</figure>");
        Ok(out)
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str, keep_empty: bool) {
    if value.is_empty() && !keep_empty {
        return;
    }
    write!(out, r#" {name}="{}""#, escape_html(value)).unwrap();
}

/// `[A-Za-z_:][A-Za-z0-9_:.-]*`
fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
}

/// Escape HTML special characters.
#[must_use]
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
