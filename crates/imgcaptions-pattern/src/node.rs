//! Typed fragment nodes and their rendering.

/// Characters escaped in literal fragments.
///
/// `<` and `>` are left bare: the engine reads `\<` and `\>` as word-boundary
/// assertions, not literals.
const META_CHARACTERS: &str = r"\^[].${}*(+)|/?";

/// Characters escaped inside a `[...]` set.
const SET_CHARACTERS: &str = r"\]^-[&~";

/// Single-token character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassKind {
    Any,
    Digit,
    NotDigit,
    Whitespace,
    NotWhitespace,
    Word,
    NotWord,
    WordBoundary,
}

impl ClassKind {
    pub(crate) fn token(self) -> &'static str {
        match self {
            Self::Any => ".",
            Self::Digit => r"\d",
            Self::NotDigit => r"\D",
            Self::Whitespace => r"\s",
            Self::NotWhitespace => r"\S",
            Self::Word => r"\w",
            Self::NotWord => r"\W",
            Self::WordBoundary => r"\b",
        }
    }

    /// Token usable inside a `[...]` set, if any.
    pub(crate) fn set_token(self) -> Option<&'static str> {
        match self {
            Self::Any | Self::WordBoundary => None,
            other => Some(other.token()),
        }
    }
}

/// Repetition applied to exactly one operand node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantifier {
    OneOrMore,
    ZeroOrMore,
    ZeroOrOne,
    Count { min: usize, max: Option<usize> },
}

impl Quantifier {
    fn render(self, out: &mut String) {
        match self {
            Self::OneOrMore => out.push('+'),
            Self::ZeroOrMore => out.push('*'),
            Self::ZeroOrOne => out.push('?'),
            Self::Count { min, max: Some(max) } if min == max => {
                out.push_str(&format!("{{{min}}}"));
            }
            Self::Count { min, max: Some(max) } => out.push_str(&format!("{{{min},{max}}}")),
            Self::Count { min, max: None } => out.push_str(&format!("{{{min},}}")),
        }
    }
}

/// Kind of parenthesized group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GroupKind {
    Capture,
    Named(String),
    NonCapturing,
    Lookbehind,
    Lookahead,
    NegativeLookahead,
}

impl GroupKind {
    fn open(&self, out: &mut String) {
        match self {
            Self::Capture => out.push('('),
            Self::Named(name) => {
                out.push_str("(?P<");
                out.push_str(name);
                out.push('>');
            }
            Self::NonCapturing => out.push_str("(?:"),
            Self::Lookbehind => out.push_str("(?<="),
            Self::Lookahead => out.push_str("(?="),
            Self::NegativeLookahead => out.push_str("(?!"),
        }
    }
}

/// One fragment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    /// Text matched verbatim; escaped on render.
    Literal(String),
    /// Pattern text inserted as-is.
    Raw(String),
    Class(ClassKind),
    /// Character set; `items` is already escaped for set context.
    Set { items: String, negated: bool },
    Quantified {
        node: Box<Node>,
        quantifier: Quantifier,
        lazy: bool,
    },
    Group {
        kind: GroupKind,
        branches: Vec<Vec<Node>>,
    },
}

impl Node {
    pub(crate) fn render(&self, out: &mut String) {
        match self {
            Self::Literal(text) => escape_into(text, out),
            Self::Raw(text) => out.push_str(text),
            Self::Class(kind) => out.push_str(kind.token()),
            Self::Set { items, negated } => {
                out.push('[');
                if *negated {
                    out.push('^');
                }
                out.push_str(items);
                out.push(']');
            }
            Self::Quantified {
                node,
                quantifier,
                lazy,
            } => {
                if node.is_atomic() {
                    node.render(out);
                } else {
                    out.push_str("(?:");
                    node.render(out);
                    out.push(')');
                }
                quantifier.render(out);
                if *lazy {
                    out.push('?');
                }
            }
            Self::Group { kind, branches } => {
                kind.open(out);
                render_branches(branches, out);
                out.push(')');
            }
        }
    }

    pub(crate) fn rendered(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    /// Whether a quantifier can follow the rendered node without grouping.
    fn is_atomic(&self) -> bool {
        match self {
            Self::Literal(text) => text.chars().count() == 1,
            Self::Raw(text) => is_single_token(text),
            Self::Class(_) | Self::Set { .. } | Self::Group { .. } => true,
            Self::Quantified { .. } => false,
        }
    }
}

pub(crate) fn render_branches(branches: &[Vec<Node>], out: &mut String) {
    for (i, branch) in branches.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        for node in branch {
            node.render(out);
        }
    }
}

fn is_single_token(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('\\'), Some(_), None) => true,
        (Some(c), None, None) => !matches!(c, '|' | '(' | ')' | '[' | ']' | '\\'),
        _ => false,
    }
}

/// Escape regex metacharacters in `text`.
fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        if push_control(c, out) {
            continue;
        }
        if META_CHARACTERS.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Escape characters that are special inside a `[...]` set.
pub(crate) fn escape_set(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if push_control(c, &mut out) {
            continue;
        }
        if SET_CHARACTERS.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Write newline, carriage return and tab as escapes so patterns stay on one line.
fn push_control(c: char, out: &mut String) -> bool {
    let escaped = match c {
        '\n' => r"\n",
        '\r' => r"\r",
        '\t' => r"\t",
        _ => return false,
    };
    out.push_str(escaped);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(text: &str) -> String {
        Node::Literal(text.to_owned()).rendered()
    }

    #[test]
    fn test_escape_meta_characters() {
        assert_eq!(escape("a.b*c"), r"a\.b\*c");
        assert_eq!(escape("(x)[y]{z}"), r"\(x\)\[y\]\{z\}");
        assert_eq!(escape("^$|?+/"), r"\^\$\|\?\+\/");
    }

    #[test]
    fn test_escape_leaves_angle_brackets() {
        assert_eq!(escape("<img>"), "<img>");
    }

    #[test]
    fn test_escape_backslash() {
        assert_eq!(escape(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape("a\nb\t"), r"a\nb\t");
        assert_eq!(escape_set("]\n"), r"\]\n");
    }

    #[test]
    fn test_escape_set() {
        assert_eq!(escape_set("]'\""), r#"\]'""#);
        assert_eq!(escape_set("a-z^"), r"a\-z\^");
    }

    #[test]
    fn test_quantified_multi_char_literal_is_grouped() {
        let node = Node::Quantified {
            node: Box::new(Node::Literal("ab".to_owned())),
            quantifier: Quantifier::OneOrMore,
            lazy: false,
        };
        assert_eq!(node.rendered(), "(?:ab)+");
    }

    #[test]
    fn test_quantified_single_char_literal() {
        let node = Node::Quantified {
            node: Box::new(Node::Literal("?".to_owned())),
            quantifier: Quantifier::OneOrMore,
            lazy: false,
        };
        assert_eq!(node.rendered(), r"\?+");
    }

    #[test]
    fn test_count_quantifier() {
        let exact = Node::Quantified {
            node: Box::new(Node::Class(ClassKind::Digit)),
            quantifier: Quantifier::Count {
                min: 3,
                max: Some(3),
            },
            lazy: false,
        };
        assert_eq!(exact.rendered(), r"\d{3}");

        let open = Node::Quantified {
            node: Box::new(Node::Class(ClassKind::Digit)),
            quantifier: Quantifier::Count { min: 2, max: None },
            lazy: true,
        };
        assert_eq!(open.rendered(), r"\d{2,}?");
    }

    #[test]
    fn test_group_with_branches() {
        let node = Node::Group {
            kind: GroupKind::Named("ext".to_owned()),
            branches: vec![
                vec![Node::Literal("png".to_owned())],
                vec![Node::Literal("gif".to_owned())],
            ],
        };
        assert_eq!(node.rendered(), "(?P<ext>png|gif)");
    }

    #[test]
    fn test_single_token_raw() {
        assert!(is_single_token(r"\s"));
        assert!(is_single_token("a"));
        assert!(!is_single_token("ab"));
        assert!(!is_single_token("|"));
    }
}
