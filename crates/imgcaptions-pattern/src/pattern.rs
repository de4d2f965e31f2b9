//! Finalized patterns.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::PatternError;

/// Flag letters accepted by [`Pattern`].
const KNOWN_FLAGS: &str = "imsxu";

/// An immutable, finalized pattern with its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    flags: String,
}

impl Pattern {
    pub(crate) fn new(source: String, flags: &str) -> Result<Self, PatternError> {
        if let Some(unknown) = flags.chars().find(|c| !KNOWN_FLAGS.contains(*c)) {
            return Err(PatternError::UnknownFlag(unknown));
        }
        Ok(Self {
            source,
            flags: flags.to_owned(),
        })
    }

    /// Pattern text without delimiters or flags.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Flag letters as given to `get_pattern`.
    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Delimited `/source/flags` form.
    #[must_use]
    pub fn delimited(&self) -> String {
        format!("/{}/{}", self.source, self.flags)
    }

    /// Compile into a [`Regex`] with the pattern's flags applied.
    ///
    /// `u` is accepted for compatibility; Unicode matching is always on.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Compile`] if the engine rejects the pattern,
    /// which includes any lookaround.
    pub fn compile(&self) -> Result<Regex, PatternError> {
        let mut builder = RegexBuilder::new(&self.source);
        for flag in self.flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'u' => {
                    builder.unicode(true);
                }
                _ => {}
            }
        }
        builder
            .build()
            .map_err(|e| PatternError::Compile(e.to_string()))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::PatternBuilder;

    #[test]
    fn test_delimited_and_display() {
        let pattern = PatternBuilder::new()
            .literal("<img")
            .get_pattern("iu")
            .unwrap();
        assert_eq!(pattern.delimited(), "/<img/iu");
        assert_eq!(pattern.to_string(), "/<img/iu");
        assert_eq!(pattern.flags(), "iu");
    }

    #[test]
    fn test_unknown_flag() {
        let result = PatternBuilder::new().literal("a").get_pattern("iq");
        assert_eq!(result, Err(PatternError::UnknownFlag('q')));
    }

    #[test]
    fn test_compile_applies_case_insensitive() {
        let re = PatternBuilder::new()
            .literal(".")
            .one_of(&["png", "jpg"])
            .get_pattern("i")
            .unwrap()
            .compile()
            .unwrap();
        assert!(re.is_match("photo.JPG"));
        assert!(!re.is_match("photo.bmp"));
    }

    #[test]
    fn test_compile_without_case_insensitive() {
        let re = PatternBuilder::new()
            .literal("png")
            .get_pattern("")
            .unwrap()
            .compile()
            .unwrap();
        assert!(!re.is_match("PNG"));
    }

    #[test]
    fn test_compile_rejects_lookaround() {
        let pattern = PatternBuilder::new()
            .literal("a")
            .negative_after(|b| b.literal("b"))
            .get_pattern("")
            .unwrap();
        assert!(matches!(pattern.compile(), Err(PatternError::Compile(_))));
    }

    #[test]
    fn test_compiled_named_capture() {
        let re = PatternBuilder::new()
            .named_capture("key", PatternBuilder::word)
            .literal("=")
            .named_capture("value", |b| b.negative_group("&").zero_or_more())
            .get_pattern("")
            .unwrap()
            .compile()
            .unwrap();
        let caps = re.captures("id=special-id").unwrap();
        assert_eq!(&caps["key"], "id");
        assert_eq!(&caps["value"], "special-id");
    }
}
