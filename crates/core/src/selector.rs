//! Compound CSS selectors evaluated against a [`DomTree`].
//!
//! Only what content heuristics need is supported: a tag or `*`, `#id`,
//! `.class`, and attribute tests (`[a]`, `[a=v]`, `[a^=v]`, `[a$=v]`,
//! `[a*=v]`), joined into comma separated lists. Combinators are rejected.
//!
//! # Example
//!
//! ```rust
//! use sift_core::{Document, Selector};
//!
//! let doc = Document::parse(r#"<div role="main"><p class="lead">Hi</p></div>"#, None).unwrap();
//! let selector = Selector::parse(r#"[role="main"], p.lead"#).unwrap();
//! assert_eq!(selector.select(doc.tree(), doc.tree().root()).len(), 2);
//! ```

use crate::dom_tree::{DomTree, NodeId};
use crate::{Result, SiftError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parse a comma separated list of compound selectors
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::InvalidSelector`] for empty input, combinators,
    /// or malformed attribute tests.
    pub fn parse(source: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for part in source.split(',') {
            alternatives.push(parse_compound(part.trim()).map_err(|reason| {
                SiftError::InvalidSelector(format!("{source}: {reason}"))
            })?);
        }
        Ok(Self { source: source.to_string(), alternatives })
    }

    /// The text this selector was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether element `id` matches any alternative
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        tree.is_element(id) && self.alternatives.iter().any(|c| compound_matches(c, tree, id))
    }

    /// Light-tree descendants of `scope` that match, in document order
    pub fn select(&self, tree: &DomTree, scope: NodeId) -> Vec<NodeId> {
        tree.descendants(scope)
            .into_iter()
            .filter(|d| self.matches(tree, *d))
            .collect()
    }
}

fn compound_matches(compound: &Compound, tree: &DomTree, id: NodeId) -> bool {
    if let Some(tag) = &compound.tag
        && tree.tag_name(id) != Some(tag.as_str())
    {
        return false;
    }
    if let Some(expected) = &compound.id
        && tree.attr(id, "id") != Some(expected.as_str())
    {
        return false;
    }
    if !compound.classes.iter().all(|c| tree.classes(id).any(|have| have == c)) {
        return false;
    }
    compound.attrs.iter().all(|test| {
        let Some(value) = tree.attr(id, &test.name) else {
            return false;
        };
        match test.op {
            AttrOp::Exists => true,
            AttrOp::Equals => value == test.value,
            AttrOp::Prefix => value.starts_with(&test.value),
            AttrOp::Suffix => value.ends_with(&test.value),
            AttrOp::Contains => value.contains(&test.value),
        }
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(input: &str) -> std::result::Result<Compound, String> {
    if input.is_empty() {
        return Err("empty selector".to_string());
    }

    let chars: Vec<char> = input.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;

    let read_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && is_ident_char(chars[end]) {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };

    if chars[0] == '*' {
        i = 1;
    } else if is_ident_char(chars[0]) {
        let (tag, end) = read_ident(0);
        compound.tag = Some(tag.to_ascii_lowercase());
        i = end;
    }

    while i < chars.len() {
        match chars[i] {
            '#' | '.' => {
                let (name, end) = read_ident(i + 1);
                if name.is_empty() {
                    return Err(format!("missing name after '{}'", chars[i]));
                }
                if chars[i] == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                i = end;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|p| p + i)
                    .ok_or_else(|| "unterminated attribute test".to_string())?;
                let body: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attr_test(&body)?);
                i = close + 1;
            }
            c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => {
                return Err("combinators are not supported".to_string());
            }
            c => return Err(format!("unexpected character '{c}'")),
        }
    }

    Ok(compound)
}

fn parse_attr_test(body: &str) -> std::result::Result<AttrTest, String> {
    let body = body.trim();
    let (name, op, raw_value) = if let Some(pos) = body.find('=') {
        let (lhs, rhs) = body.split_at(pos);
        let rhs = &rhs[1..];
        let (name, op) = match lhs.chars().last() {
            Some('^') => (&lhs[..lhs.len() - 1], AttrOp::Prefix),
            Some('$') => (&lhs[..lhs.len() - 1], AttrOp::Suffix),
            Some('*') => (&lhs[..lhs.len() - 1], AttrOp::Contains),
            _ => (lhs, AttrOp::Equals),
        };
        (name.trim(), op, rhs.trim())
    } else {
        (body, AttrOp::Exists, "")
    };

    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(format!("bad attribute name in [{body}]"));
    }

    let value = raw_value.trim_matches(|c| c == '"' || c == '\'').to_string();
    Ok(AttrTest { name: name.to_ascii_lowercase(), op, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tree() -> (DomTree, NodeId) {
        let mut tree = DomTree::new("html");
        let body = tree.append_element(tree.root(), "body", Vec::new());
        let main = tree.append_element(
            body,
            "div",
            vec![
                ("id".into(), "content".into()),
                ("class".into(), "post-content wide".into()),
                ("data-testid".into(), "t3_abc-post-rtjson-content".into()),
                ("role".into(), "main".into()),
            ],
        );
        (tree, main)
    }

    #[rstest]
    #[case("div")]
    #[case("*")]
    #[case("#content")]
    #[case(".post-content")]
    #[case("div.post-content.wide")]
    #[case("[role]")]
    #[case(r#"[role="main"]"#)]
    #[case("[role='main']")]
    #[case("[data-testid^=t3_]")]
    #[case(r#"div[data-testid$="-post-rtjson-content"]"#)]
    #[case("[data-testid*=rtjson]")]
    #[case("article, #content")]
    fn test_matches(#[case] source: &str) {
        let (tree, main) = tree();
        let selector = Selector::parse(source).unwrap();
        assert!(selector.matches(&tree, main), "{source} should match");
    }

    #[rstest]
    #[case("article")]
    #[case("#other")]
    #[case(".post")]
    #[case("[role=navigation]")]
    #[case("[data-testid$=comment]")]
    fn test_does_not_match(#[case] source: &str) {
        let (tree, main) = tree();
        let selector = Selector::parse(source).unwrap();
        assert!(!selector.matches(&tree, main), "{source} should not match");
    }

    #[rstest]
    #[case("")]
    #[case("article p")]
    #[case("div > p")]
    #[case("[unterminated")]
    #[case("div.")]
    #[case("a, ")]
    fn test_invalid(#[case] source: &str) {
        assert!(matches!(Selector::parse(source), Err(SiftError::InvalidSelector(_))));
    }

    #[test]
    fn test_select_skips_scope_and_text() {
        let (mut tree, main) = tree();
        tree.append_text(main, "text");
        let inner = tree.append_element(main, "div", Vec::new());
        let selector = Selector::parse("div").unwrap();
        assert_eq!(selector.select(&tree, main), vec![inner]);
    }
}
