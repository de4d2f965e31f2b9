//! Fluent pattern builder over typed fragment nodes.

use crate::error::PatternError;
use crate::node::{ClassKind, GroupKind, Node, Quantifier, escape_set, render_branches};
use crate::pattern::Pattern;

/// Builds a [`Pattern`] from composable fragments.
///
/// Each method appends one node to the current alternation branch. Quantifiers
/// and the `*_last` wrappers pop the previous node and wrap it, so the operand
/// is explicit in the node tree instead of implied by call order.
///
/// Misuse (bad group names, a quantifier with nothing before it) is recorded
/// and reported by [`get_pattern`](Self::get_pattern); the first error wins.
#[derive(Debug, Clone)]
pub struct PatternBuilder {
    branches: Vec<Vec<Node>>,
    error: Option<PatternError>,
}

impl Default for PatternBuilder {
    fn default() -> Self {
        Self {
            branches: vec![Vec::new()],
            error: None,
        }
    }
}

impl PatternBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match `text` verbatim, escaping metacharacters.
    #[must_use]
    pub fn literal(self, text: &str) -> Self {
        self.push(Node::Literal(text.to_owned()))
    }

    /// Append pattern text unescaped. The caller guarantees it is valid.
    #[must_use]
    pub fn raw(self, pattern: &str) -> Self {
        self.push(Node::Raw(pattern.to_owned()))
    }

    /// Any character except newline.
    #[must_use]
    pub fn any(self) -> Self {
        self.push(Node::Class(ClassKind::Any))
    }

    #[must_use]
    pub fn digit(self) -> Self {
        self.push(Node::Class(ClassKind::Digit))
    }

    #[must_use]
    pub fn not_digit(self) -> Self {
        self.push(Node::Class(ClassKind::NotDigit))
    }

    #[must_use]
    pub fn whitespace(self) -> Self {
        self.push(Node::Class(ClassKind::Whitespace))
    }

    #[must_use]
    pub fn not_whitespace(self) -> Self {
        self.push(Node::Class(ClassKind::NotWhitespace))
    }

    #[must_use]
    pub fn word_char(self) -> Self {
        self.push(Node::Class(ClassKind::Word))
    }

    #[must_use]
    pub fn not_word_char(self) -> Self {
        self.push(Node::Class(ClassKind::NotWord))
    }

    #[must_use]
    pub fn word_boundary(self) -> Self {
        self.push(Node::Class(ClassKind::WordBoundary))
    }

    /// One or more word characters.
    #[must_use]
    pub fn word(self) -> Self {
        self.word_char().one_or_more()
    }

    /// Exactly one of `words`, as a non-capturing alternation.
    ///
    /// Earlier words win when several match at the same position.
    #[must_use]
    pub fn one_of(self, words: &[&str]) -> Self {
        let branches = words
            .iter()
            .map(|word| vec![Node::Literal((*word).to_owned())])
            .collect();
        self.push(Node::Group {
            kind: GroupKind::NonCapturing,
            branches,
        })
    }

    #[must_use]
    pub fn one_or_more(self) -> Self {
        self.quantify(Quantifier::OneOrMore, "one_or_more")
    }

    #[must_use]
    pub fn zero_or_more(self) -> Self {
        self.quantify(Quantifier::ZeroOrMore, "zero_or_more")
    }

    #[must_use]
    pub fn zero_or_one(self) -> Self {
        self.quantify(Quantifier::ZeroOrOne, "zero_or_one")
    }

    /// Repeat the previous node between `min` and `max` times (`None` = unbounded).
    #[must_use]
    pub fn count(self, min: usize, max: Option<usize>) -> Self {
        self.quantify(Quantifier::Count { min, max }, "count")
    }

    /// Make the previous quantifier non-greedy.
    #[must_use]
    pub fn lazy(mut self) -> Self {
        match self.current().last_mut() {
            Some(Node::Quantified { lazy, .. }) => *lazy = true,
            _ => self.fail(PatternError::LazyWithoutQuantifier),
        }
        self
    }

    /// Character set `[chars]`.
    #[must_use]
    pub fn group(self, chars: &str) -> Self {
        self.push(Node::Set {
            items: escape_set(chars),
            negated: false,
        })
    }

    /// Negated character set `[^chars]`.
    #[must_use]
    pub fn negative_group(self, chars: &str) -> Self {
        self.push(Node::Set {
            items: escape_set(chars),
            negated: true,
        })
    }

    /// Character set built from class and literal fragments, e.g. `[\s"]`.
    #[must_use]
    pub fn group_with<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.set_from(build, false)
    }

    /// Negated character set built from class and literal fragments, e.g. `[^\s"]`.
    #[must_use]
    pub fn negative_group_with<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.set_from(build, true)
    }

    /// Capturing group around a nested pattern.
    #[must_use]
    pub fn capture<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.wrap_nested(GroupKind::Capture, build)
    }

    /// Capturing group around the previous node.
    #[must_use]
    pub fn capture_last(self) -> Self {
        self.wrap_last(GroupKind::Capture, "capture_last")
    }

    /// Named capturing group around a nested pattern.
    #[must_use]
    pub fn named_capture<F>(self, name: &str, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        match validate_name(name) {
            Ok(()) => self.wrap_nested(GroupKind::Named(name.to_owned()), build),
            Err(err) => self.failed(err),
        }
    }

    /// Named capturing group around the previous node.
    #[must_use]
    pub fn named_capture_last(self, name: &str) -> Self {
        match validate_name(name) {
            Ok(()) => self.wrap_last(GroupKind::Named(name.to_owned()), "named_capture_last"),
            Err(err) => self.failed(err),
        }
    }

    /// Non-capturing group `(?:...)` around a nested pattern.
    #[must_use]
    pub fn optional_capture<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.wrap_nested(GroupKind::NonCapturing, build)
    }

    /// Non-capturing group `(?:...)` around the previous node.
    #[must_use]
    pub fn optional_capture_last(self) -> Self {
        self.wrap_last(GroupKind::NonCapturing, "optional_capture_last")
    }

    /// Positive lookbehind.
    #[must_use]
    pub fn behind<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.wrap_nested(GroupKind::Lookbehind, build)
    }

    /// Alias of [`behind`](Self::behind).
    #[must_use]
    pub fn before<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.behind(build)
    }

    /// Positive lookahead.
    #[must_use]
    pub fn after<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.wrap_nested(GroupKind::Lookahead, build)
    }

    /// Negative lookahead.
    #[must_use]
    pub fn negative_after<F>(self, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        self.wrap_nested(GroupKind::NegativeLookahead, build)
    }

    /// Start a new alternation branch.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.branches.push(Vec::new());
        self
    }

    /// Make the previous node optional (`?`).
    #[must_use]
    pub fn optional(self) -> Self {
        self.quantify(Quantifier::ZeroOrOne, "optional")
    }

    /// Wrap every occurrence of `text` in the rendered previous node in `(?:text)?`.
    ///
    /// `text` is matched against pattern text, not escaped input.
    #[must_use]
    pub fn optional_substring(mut self, text: &str) -> Self {
        let Some(node) = self.current().pop() else {
            return self.failed(PatternError::MissingOperand("optional_substring"));
        };
        let rendered = node.rendered();
        let wrapped = rendered.replace(text, &format!("(?:{text})?"));
        self.push(Node::Raw(wrapped))
    }

    /// Wrap `len` bytes at byte offset `start` of the rendered previous node in `(?:...)?`.
    #[must_use]
    pub fn optional_range(mut self, start: usize, len: usize) -> Self {
        let Some(node) = self.current().pop() else {
            return self.failed(PatternError::MissingOperand("optional_range"));
        };
        let rendered = node.rendered();
        let end = start.saturating_add(len);
        match (rendered.get(..start), rendered.get(start..end), rendered.get(end..)) {
            (Some(head), Some(middle), Some(tail)) => {
                let wrapped = format!("{head}(?:{middle})?{tail}");
                self.push(Node::Raw(wrapped))
            }
            _ => self.failed(PatternError::InvalidRange {
                start,
                end,
                fragment: rendered,
            }),
        }
    }

    /// Append all fragments of `other`.
    ///
    /// A multi-branch `other` is grouped so its alternation stays contained.
    #[must_use]
    pub fn then(mut self, other: Self) -> Self {
        let Self { mut branches, error } = other;
        if let Some(err) = error {
            return self.failed(err);
        }
        if branches.len() == 1 {
            let nodes = branches.pop().unwrap_or_default();
            self.current().extend(nodes);
            self
        } else {
            self.push(Node::Group {
                kind: GroupKind::NonCapturing,
                branches,
            })
        }
    }

    /// Finalize into a [`Pattern`] with the given flags (`i`, `m`, `s`, `x`, `u`).
    ///
    /// Does not consume or modify the builder; calling it twice yields equal patterns.
    ///
    /// # Errors
    ///
    /// Returns the first construction error, or [`PatternError::UnknownFlag`].
    pub fn get_pattern(&self, flags: &str) -> Result<Pattern, PatternError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let mut source = String::new();
        render_branches(&self.branches, &mut source);
        Pattern::new(source, flags)
    }

    fn current(&mut self) -> &mut Vec<Node> {
        if self.branches.is_empty() {
            self.branches.push(Vec::new());
        }
        let last = self.branches.len() - 1;
        &mut self.branches[last]
    }

    fn push(mut self, node: Node) -> Self {
        self.current().push(node);
        self
    }

    fn fail(&mut self, err: PatternError) {
        self.error.get_or_insert(err);
    }

    fn failed(mut self, err: PatternError) -> Self {
        self.fail(err);
        self
    }

    fn quantify(mut self, quantifier: Quantifier, operation: &'static str) -> Self {
        match self.current().pop() {
            Some(node) => self.push(Node::Quantified {
                node: Box::new(node),
                quantifier,
                lazy: false,
            }),
            None => self.failed(PatternError::MissingOperand(operation)),
        }
    }

    fn wrap_last(mut self, kind: GroupKind, operation: &'static str) -> Self {
        match self.current().pop() {
            Some(node) => self.push(Node::Group {
                kind,
                branches: vec![vec![node]],
            }),
            None => self.failed(PatternError::MissingOperand(operation)),
        }
    }

    fn wrap_nested<F>(self, kind: GroupKind, build: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        let Self { branches, error } = build(Self::new());
        if let Some(err) = error {
            return self.failed(err);
        }
        self.push(Node::Group { kind, branches })
    }

    fn set_from<F>(self, build: F, negated: bool) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        let nested = build(Self::new());
        if let Some(err) = nested.error {
            return self.failed(err);
        }
        let mut items = String::new();
        for node in nested.branches.iter().flatten() {
            match node {
                Node::Class(kind) => match kind.set_token() {
                    Some(token) => items.push_str(token),
                    None => {
                        return self.failed(PatternError::InvalidSetMember(
                            kind.token().to_owned(),
                        ));
                    }
                },
                Node::Literal(text) => items.push_str(&escape_set(text)),
                other => {
                    return self.failed(PatternError::InvalidSetMember(other.rendered()));
                }
            }
        }
        self.push(Node::Set { items, negated })
    }
}

/// Named groups must be `[A-Za-z][A-Za-z0-9]*`.
fn validate_name(name: &str) -> Result<(), PatternError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(PatternError::InvalidGroupName(name.to_owned()))
    }
}
