//! Page front matter.

use imgcaptions_config::FilterOverrides;
use serde::Deserialize;

use crate::error::SiteError;

const DELIMITER: &str = "---";

/// Fields of a page header this crate reads. Unknown fields are ignored.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageHeader {
    pub title: Option<String>,
    /// Per-page filter overrides.
    pub imgcaptions: Option<FilterOverrides>,
}

impl PageHeader {
    /// Parse a YAML header block.
    ///
    /// Empty content yields the default header.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn parse(yaml: &str) -> Result<Self, SiteError> {
        let trimmed = yaml.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(trimmed).map_err(|e| SiteError::FrontMatter(format!("Invalid YAML: {e}")))
    }

    /// Overrides to layer over the configuration; empty when absent.
    #[must_use]
    pub fn overrides(&self) -> FilterOverrides {
        self.imgcaptions.clone().unwrap_or_default()
    }
}

/// Split a leading `---` delimited YAML block from the page body.
///
/// Returns `(None, text)` when there is no complete header.
///
/// ```
/// use imgcaptions_site::split_front_matter;
///
/// let (header, body) = split_front_matter("---\ntitle: Hi\n---\n# Body\n");
/// assert_eq!(header, Some("title: Hi\n"));
/// assert_eq!(body, "# Body\n");
/// ```
#[must_use]
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let text_without_bom = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = strip_delimiter_line(text_without_bom) else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(header), body);
        }
        offset += line.len();
    }
    (None, text)
}

/// Strip an opening `---` line, returning what follows it.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let after = text.strip_prefix(DELIMITER)?;
    after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
}
