//! Single-pass positional replacement.

use std::ops::Range;

/// Collects span replacements for one content string and splices them in a
/// single pass.
///
/// Spans refer to byte offsets of the original string, so two identical
/// occurrences at different positions are replaced independently.
#[derive(Debug, Default)]
pub(crate) struct Replacements {
    items: Vec<(Range<usize>, String)>,
}

impl Replacements {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `to` for the bytes in `span`.
    ///
    /// Spans must come from non-overlapping matches.
    pub(crate) fn add(&mut self, span: Range<usize>, to: impl Into<String>) {
        self.items.push((span, to.into()));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Build the new string. Consumes the collector to prevent reuse.
    pub(crate) fn apply(mut self, content: &str) -> String {
        if self.items.is_empty() {
            return content.to_owned();
        }
        self.items.sort_by_key(|(span, _)| span.start);

        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        for (span, to) in self.items {
            if span.start < last {
                continue;
            }
            out.push_str(&content[last..span.start]);
            out.push_str(&to);
            last = span.end;
        }
        out.push_str(&content[last..]);
        out
    }
}
