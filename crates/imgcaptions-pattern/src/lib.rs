//! Typed regular-expression builder.
//!
//! Grammars are written as a chain of builder calls instead of opaque regex
//! literals. Every call appends a typed fragment node; quantifiers and group
//! wrappers take the previous node as an explicit operand, so a quantifier can
//! never silently bind to the wrong fragment.
//!
//! # Example
//!
//! ```
//! use imgcaptions_pattern::PatternBuilder;
//!
//! let pattern = PatternBuilder::new()
//!     .literal("![")
//!     .named_capture("alt", |b| b.negative_group("]").zero_or_more())
//!     .literal("]")
//!     .get_pattern("u")
//!     .unwrap();
//!
//! assert_eq!(pattern.as_str(), r"!\[(?P<alt>[^\]]*)\]");
//! let re = pattern.compile().unwrap();
//! assert_eq!(&re.captures("![cat]").unwrap()["alt"], "cat");
//! ```
//!
//! # Engine
//!
//! Patterns compile with the `regex` crate, which matches in linear time and
//! has no lookaround. Lookaround nodes still render (the builder is engine
//! agnostic), but [`Pattern::compile`] reports them as [`PatternError::Compile`].

mod builder;
mod error;
mod node;
mod pattern;

pub use builder::PatternBuilder;
pub use error::PatternError;
pub use pattern::Pattern;
