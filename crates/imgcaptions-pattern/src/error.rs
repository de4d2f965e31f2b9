//! Pattern construction errors.

/// Error raised while building or compiling a pattern.
///
/// Grammar construction happens once at startup, so any of these is fatal for
/// the caller that owns the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// Named group identifier is not `[A-Za-z][A-Za-z0-9]*`.
    #[error(
        "invalid group name `{0}`: names must start with an ASCII letter and contain only ASCII letters and digits"
    )]
    InvalidGroupName(String),
    /// Quantifier or wrapper called with no preceding fragment.
    #[error("`{0}` needs a preceding fragment to apply to")]
    MissingOperand(&'static str),
    /// `lazy()` called when the last fragment is not quantified.
    #[error("`lazy` must directly follow a quantifier")]
    LazyWithoutQuantifier,
    /// Fragment that cannot appear inside a character set.
    #[error("`{0}` cannot be used inside a character set")]
    InvalidSetMember(String),
    /// `optional_range` outside the rendered fragment.
    #[error("range {start}..{end} does not fit the fragment `{fragment}`")]
    InvalidRange {
        /// Byte offset where the optional part starts.
        start: usize,
        /// Byte offset where the optional part ends.
        end: usize,
        /// Rendered fragment the range was applied to.
        fragment: String,
    },
    /// Flag letter the engine does not understand.
    #[error("unknown pattern flag `{0}`")]
    UnknownFlag(char),
    /// The regex engine rejected the rendered pattern.
    #[error("failed to compile pattern: {0}")]
    Compile(String),
}
