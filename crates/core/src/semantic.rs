use std::sync::LazyLock;

use crate::Document;
use crate::dom_tree::NodeId;
use crate::selector::Selector;

/// Selectors for elements that declare themselves the main content, most specific first
pub const SEMANTIC_SELECTORS: &[&str] = &[
    "article",
    "main",
    r#"[role="main"]"#,
    r#"[itemprop="articleBody"]"#,
    ".post-content",
    ".entry-content",
    ".article-content",
    ".article-body",
    ".post-body",
    "#content",
    ".content",
];

static COMPILED: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    SEMANTIC_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("semantic selectors are valid"))
        .collect()
});

/// Find the main content through semantic markup.
///
/// Selectors are tried in order. The first one that matches an element with
/// visible text wins, and among its matches the element with the most text
/// is returned.
pub fn find_semantic_content(doc: &Document) -> Option<NodeId> {
    let tree = doc.tree();

    COMPILED.iter().find_map(|selector| {
        selector
            .select(tree, tree.root())
            .into_iter()
            .map(|id| (id, tree.normalized_text(id).chars().count()))
            .filter(|(_, len)| *len > 0)
            .fold(None, |best: Option<(NodeId, usize)>, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            })
            .map(|(id, _)| id)
    })
}
