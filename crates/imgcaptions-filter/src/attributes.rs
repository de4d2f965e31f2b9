//! Attribute extraction and merging.
//!
//! Raw captures from the grammar are turned into an ordered [`AttributeSet`]
//! that the template renders verbatim. `src`, `alt` and `title` are reserved;
//! everything else passes through.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::grammar::{Grammar, Rule};

/// Media-action keys kept on the image.
const MEDIA_ACTION_KEYS: [&str; 2] = ["id", "class"];

/// Keys whose values [`MergePolicy::Append`] joins instead of replacing.
const JOINABLE_KEYS: [&str; 2] = ["id", "class"];

/// How a later attribute source combines with an earlier one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Last write wins per key.
    #[default]
    Replace,
    /// `id` and `class` values are space-joined onto earlier ones.
    Append,
}

/// Ordered attribute map.
///
/// Keys keep the position of their first insertion; writing an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(IndexMap<String, String>);

impl AttributeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self` under `policy`.
    pub fn merge(&mut self, other: Self, policy: MergePolicy) {
        for (key, value) in other.0 {
            match (policy, self.0.get_mut(&key)) {
                (MergePolicy::Append, Some(existing))
                    if JOINABLE_KEYS.contains(&key.as_str()) && !existing.is_empty() =>
                {
                    if !value.is_empty() {
                        existing.push(' ');
                        existing.push_str(&value);
                    }
                }
                _ => {
                    self.0.insert(key, value);
                }
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Attributes of an HTML tag.
///
/// Names are lowercased. A repeated attribute keeps its first position and its
/// last value.
#[must_use]
pub fn html_attributes(grammar: &Grammar, tag: &str) -> AttributeSet {
    let mut attrs = AttributeSet::new();
    for caps in grammar.regex(Rule::HtmlAttribute).captures_iter(tag) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        let value = match (caps.get(2).or_else(|| caps.get(3)), caps.get(4)) {
            (Some(quoted), _) => quoted.as_str(),
            (None, Some(bare)) => bare_value(tag, bare.as_str(), bare.end()),
            (None, None) => "",
        };
        attrs.insert(name.as_str().to_ascii_lowercase(), value);
    }
    attrs
}

/// An unquoted value directly before `/>` does not own the slash.
fn bare_value<'t>(tag: &'t str, value: &'t str, end: usize) -> &'t str {
    if tag[end..].starts_with('>') {
        value.strip_suffix('/').unwrap_or(value)
    } else {
        value
    }
}

/// `id` and `class` from a media-action query such as `?classes=a,b&id=x`.
///
/// `classes` is an alias of `class`. Values are kept verbatim.
#[must_use]
pub fn markdown_media_actions(grammar: &Grammar, text: &str) -> AttributeSet {
    let mut attrs = AttributeSet::new();
    for caps in grammar.regex(Rule::MarkdownMediaAction).captures_iter(text) {
        let key = match &caps["key"] {
            "classes" => "class",
            other => other,
        };
        if !MEDIA_ACTION_KEYS.contains(&key) {
            continue;
        }
        let value = caps.name("value").map_or("", |m| m.as_str());
        attrs.insert(key, value);
    }
    attrs
}

/// Attributes from an extra block body such as `#id .c1 .c2 key="v"`.
#[must_use]
pub fn markdown_extra(text: &str) -> AttributeSet {
    let mut ids = Vec::new();
    let mut classes = Vec::new();
    let mut pairs = Vec::new();

    for token in text.split(' ') {
        if let Some(id) = token.strip_prefix('#') {
            if !id.is_empty() {
                ids.push(id);
            }
        } else if let Some(class) = token.strip_prefix('.') {
            if !class.is_empty() {
                classes.push(class);
            }
        } else if let Some((key, value)) = token.split_once('=') {
            if !key.is_empty() {
                pairs.push((key, strip_quotes(value)));
            }
        }
    }

    let mut attrs = AttributeSet::new();
    if !ids.is_empty() {
        attrs.insert("id", ids.join(" "));
    }
    if !classes.is_empty() {
        attrs.insert("class", classes.join(" "));
    }
    for (key, value) in pairs {
        attrs.insert(key, value);
    }
    attrs
}

/// Remove one pair of matching surrounding quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn grammar() -> &'static Grammar {
        Grammar::shared().unwrap()
    }

    fn set(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_insert_keeps_first_position() {
        let mut attrs = set(&[("src", "a.jpg"), ("alt", "")]);
        attrs.insert("src", "b.jpg");
        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["src", "alt"]);
        assert_eq!(attrs.get("src"), Some("b.jpg"));
    }

    #[test]
    fn test_merge_replace() {
        let mut attrs = set(&[("src", "a.jpg"), ("class", "one")]);
        attrs.merge(set(&[("class", "two"), ("width", "10")]), MergePolicy::Replace);
        assert_eq!(attrs, set(&[("src", "a.jpg"), ("class", "two"), ("width", "10")]));
    }

    #[test]
    fn test_merge_append_joins_id_and_class() {
        let mut attrs = set(&[("id", "a"), ("class", "one"), ("width", "1")]);
        attrs.merge(
            set(&[("id", "b"), ("class", "two"), ("width", "2")]),
            MergePolicy::Append,
        );
        assert_eq!(
            attrs,
            set(&[("id", "a b"), ("class", "one two"), ("width", "2")])
        );
    }

    #[test]
    fn test_merge_append_onto_empty_value() {
        let mut attrs = set(&[("class", "")]);
        attrs.merge(set(&[("class", "two")]), MergePolicy::Append);
        assert_eq!(attrs.get("class"), Some("two"));
    }

    #[test]
    fn test_serializes_in_order() {
        let attrs = set(&[("src", "a.jpg"), ("alt", "x"), ("class", "c")]);
        assert_eq!(
            serde_json::to_string(&attrs).unwrap(),
            r#"{"src":"a.jpg","alt":"x","class":"c"}"#
        );
    }

    #[test]
    fn test_merge_policy_serde_names() {
        let policy: MergePolicy = serde_json::from_str(r#""append""#).unwrap();
        assert_eq!(policy, MergePolicy::Append);
        assert_eq!(MergePolicy::default(), MergePolicy::Replace);
    }

    #[test]
    fn test_html_attributes_exact() {
        let attrs = html_attributes(grammar(), r#"<img src="x" class="y">"#);
        assert_eq!(attrs, set(&[("src", "x"), ("class", "y")]));
    }

    #[test]
    fn test_html_attributes_quoting_styles() {
        let attrs = html_attributes(
            grammar(),
            r#"<img src='a b.jpg' width=300 alt="He said 'hi'" data-x = "1">"#,
        );
        assert_eq!(
            attrs,
            set(&[
                ("src", "a b.jpg"),
                ("width", "300"),
                ("alt", "He said 'hi'"),
                ("data-x", "1"),
            ])
        );
    }

    #[test]
    fn test_html_attributes_last_write_wins() {
        let attrs = html_attributes(grammar(), r#"<img class="a" src="x" CLASS="b">"#);
        assert_eq!(attrs, set(&[("class", "b"), ("src", "x")]));
    }

    #[test]
    fn test_html_attributes_ignores_bare_flags() {
        let attrs = html_attributes(grammar(), r#"<img hidden src="x" />"#);
        assert_eq!(attrs, set(&[("src", "x")]));
    }

    #[test]
    fn test_html_attributes_bare_value_before_self_close() {
        let attrs = html_attributes(grammar(), "<img src=a.jpg/>");
        assert_eq!(attrs, set(&[("src", "a.jpg")]));

        let attrs = html_attributes(grammar(), "<img src=/img/dir/ alt=x>");
        assert_eq!(attrs, set(&[("src", "/img/dir/"), ("alt", "x")]));
    }

    #[test]
    fn test_media_actions_classes_alias() {
        let attrs = markdown_media_actions(grammar(), "?classes=float-left");
        assert_eq!(attrs, set(&[("class", "float-left")]));
    }

    #[test]
    fn test_media_actions_keep_only_id_and_class() {
        let attrs = markdown_media_actions(
            grammar(),
            "?resize=600,400&id=special-id&lightbox&class=a,b",
        );
        assert_eq!(attrs, set(&[("id", "special-id"), ("class", "a,b")]));
    }

    #[test]
    fn test_media_actions_bare_key_has_empty_value() {
        let attrs = markdown_media_actions(grammar(), "?id");
        assert_eq!(attrs, set(&[("id", "")]));
    }

    #[test]
    fn test_extra_ids_classes_and_pairs() {
        let attrs = markdown_extra("#id .c1 .c2 attr=v");
        assert_eq!(attrs, set(&[("id", "id"), ("class", "c1 c2"), ("attr", "v")]));
    }

    #[test]
    fn test_extra_strips_one_pair_of_quotes() {
        let attrs = markdown_extra(r#"title="x" alt='y' data=''z''"#);
        assert_eq!(
            attrs,
            set(&[("title", "x"), ("alt", "y"), ("data", "'z'")])
        );
    }

    #[test]
    fn test_extra_splits_on_first_equals() {
        let attrs = markdown_extra("data-expr=a=b");
        assert_eq!(attrs, set(&[("data-expr", "a=b")]));
    }

    #[test]
    fn test_extra_ignores_empty_and_bare_tokens() {
        let attrs = markdown_extra("  # . lonely =v .ok ");
        assert_eq!(attrs, set(&[("class", "ok")]));
    }

    #[test]
    fn test_extra_empty() {
        assert!(markdown_extra("").is_empty());
    }
}
