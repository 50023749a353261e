//! Arena-backed document tree.
//!
//! [`DomTree`] stores every node of a parsed document in a flat vector and
//! addresses them with [`NodeId`]s. Elements may own a shadow root, which is
//! reachable through [`DomTree::shadow_root`] but never appears in the
//! element's child list, so ordinary traversal only walks the light tree.
//!
//! Trees are never edited in place once built. Operations that remove
//! content (see [`crate::scoring::prune`]) build a fresh tree instead.

use serde::Serialize;

/// Index of a node inside one [`DomTree`].
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Payload of a tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// An element with its lowercase tag name and attributes in source order
    Element { tag: String, attrs: Vec<(String, String)> },
    /// A run of character data
    Text(String),
    /// Root of an encapsulated sub-tree attached to a host element
    ShadowRoot { mode: String },
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct DomNode {
    /// What the node holds
    pub data: NodeData,
    /// Parent node (the host, for a shadow root)
    pub parent: Option<NodeId>,
    /// Ordered light-tree children
    pub children: Vec<NodeId>,
    /// Attached shadow root, if any
    pub shadow_root: Option<NodeId>,
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Tags rendered as separate blocks when text is laid out line by line
pub const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "td", "th", "thead", "tr", "ul", "body", "html",
];

/// A rooted document tree with explicit shadow-root accessors
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
    root: NodeId,
}

impl DomTree {
    /// Create a tree holding a single root element
    pub fn new(root_tag: &str) -> Self {
        let root =
            DomNode { data: element_data(root_tag, Vec::new()), parent: None, children: Vec::new(), shadow_root: None };
        Self { nodes: vec![root], root: NodeId(0) }
    }

    /// Create a tree whose root is a copy of `data`
    pub(crate) fn with_root_data(data: NodeData) -> Self {
        let root = DomNode { data, parent: None, children: Vec::new(), shadow_root: None };
        Self { nodes: vec![root], root: NodeId(0) }
    }

    /// The root element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes, shadow content included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree only holds its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Borrow a node.
    ///
    /// Panics if `id` was issued by a different tree.
    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    /// Borrow a node if the id is in range
    pub fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    /// Append an element below `parent` and return its id
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push_child(parent, element_data(tag, attrs))
    }

    /// Append a text node below `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_child(parent, NodeData::Text(text.to_string()))
    }

    /// Attach a shadow root to `host`, replacing nothing if one already exists
    pub fn attach_shadow(&mut self, host: NodeId, mode: &str) -> NodeId {
        if let Some(existing) = self.nodes[host.0].shadow_root {
            return existing;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode {
            data: NodeData::ShadowRoot { mode: mode.to_string() },
            parent: Some(host),
            children: Vec::new(),
            shadow_root: None,
        });
        self.nodes[host.0].shadow_root = Some(id);
        id
    }

    pub(crate) fn push_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode { data, parent: Some(parent), children: Vec::new(), shadow_root: None });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Number of nodes allocated so far, usable as a rollback point
    pub(crate) fn checkpoint(&self) -> usize {
        self.nodes.len()
    }

    /// Discard every node allocated at or after `checkpoint`.
    ///
    /// Only valid when those nodes form the most recently appended subtree.
    pub(crate) fn rollback(&mut self, checkpoint: usize) {
        if checkpoint >= self.nodes.len() || checkpoint == 0 {
            return;
        }
        let parent = self.nodes[checkpoint].parent;
        self.nodes.truncate(checkpoint);
        if let Some(parent) = parent {
            let node = &mut self.nodes[parent.0];
            node.children.retain(|c| c.0 < checkpoint);
            if node.shadow_root.is_some_and(|s| s.0 >= checkpoint) {
                node.shadow_root = None;
            }
        }
    }

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Whether the node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    /// Attribute value by name
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Whitespace separated class list
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class").unwrap_or_default().split_whitespace()
    }

    /// Light-tree children
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Light-tree element children
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied().filter(move |c| self.is_element(*c))
    }

    /// Parent of a node; the host for a shadow root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Encapsulated sub-tree attached to `id`
    pub fn shadow_root(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).shadow_root
    }

    /// Host element owning a shadow root
    pub fn shadow_host(&self, shadow_root: NodeId) -> Option<NodeId> {
        match self.node(shadow_root).data {
            NodeData::ShadowRoot { .. } => self.parent(shadow_root),
            _ => None,
        }
    }

    /// Whether the node lives inside some shadow root
    pub fn in_shadow_tree(&self, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if matches!(self.node(node).data, NodeData::ShadowRoot { .. }) {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Number of ancestors between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(node) = current {
            depth += 1;
            current = self.parent(node);
        }
        depth
    }

    /// Element descendants of `id` in document order, light tree only
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !self.is_element(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Element descendants with a given tag
    pub fn descendants_by_tag<'a>(&'a self, id: NodeId, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id)
            .into_iter()
            .filter(move |d| self.tag_name(*d) == Some(tag))
    }

    /// Concatenated light-tree text of `id`
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, false, &mut out);
        out
    }

    /// Concatenated text including every shadow root below `id`
    pub fn deep_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, true, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, deep: bool, out: &mut String) {
        let node = self.node(id);
        if let NodeData::Text(text) = &node.data {
            out.push_str(text);
            return;
        }
        if deep && let Some(shadow) = node.shadow_root {
            self.collect_text(shadow, deep, out);
        }
        for child in &node.children {
            self.collect_text(*child, deep, out);
        }
    }

    /// Text held directly by `id`, excluding descendants' text
    pub fn inline_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|c| match &self.node(*c).data {
                NodeData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Light-tree text with runs of whitespace collapsed and ends trimmed
    pub fn normalized_text(&self, id: NodeId) -> String {
        collapse_whitespace(&self.text(id))
    }

    /// Ratio of link text to total text (0.0 to 1.0)
    pub fn link_density(&self, id: NodeId) -> f64 {
        let text_length = self.normalized_text(id).chars().count();
        if text_length == 0 {
            return 0.0;
        }

        let mut link_length: usize = self
            .descendants_by_tag(id, "a")
            .map(|a| self.normalized_text(a).chars().count())
            .sum();
        if self.tag_name(id) == Some("a") {
            link_length = text_length;
        }

        (link_length as f64 / text_length as f64).min(1.0)
    }

    /// Markup of `id` including its own tag
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    /// Markup of `id` without its own tag
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize_contents(id, &mut out);
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.tag_name(p))
                    .is_some_and(|t| matches!(t, "script" | "style"));
                if raw {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeData::ShadowRoot { mode } => {
                out.push_str("<template shadowrootmode=\"");
                escape_attr(mode, out);
                out.push_str("\">");
                self.serialize_children(id, out);
                out.push_str("</template>");
            }
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                self.serialize_contents(id, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn serialize_contents(&self, id: NodeId, out: &mut String) {
        if let Some(shadow) = self.shadow_root(id) {
            self.serialize(shadow, out);
        }
        self.serialize_children(id, out);
    }

    fn serialize_children(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            self.serialize(*child, out);
        }
    }

    /// Copy the subtree rooted at `id` into a new, independent tree
    pub fn copy_subtree(&self, id: NodeId) -> DomTree {
        let mut copy = DomTree::with_root_data(self.node(id).data.clone());
        let root = copy.root();
        self.copy_contents_into(id, &mut copy, root);
        copy
    }

    /// Copy the shadow root and children of `src` below `dst` in `target`
    pub(crate) fn copy_contents_into(&self, src: NodeId, target: &mut DomTree, dst: NodeId) {
        self.copy_shadow_into(src, target, dst);
        self.copy_children_into(src, target, dst);
    }

    /// Copy the shadow root of `src`, if any, onto `dst` in `target`
    pub(crate) fn copy_shadow_into(&self, src: NodeId, target: &mut DomTree, dst: NodeId) {
        if let Some(shadow) = self.shadow_root(src) {
            let mode = match &self.node(shadow).data {
                NodeData::ShadowRoot { mode } => mode.clone(),
                _ => "open".to_string(),
            };
            let new_shadow = target.attach_shadow(dst, &mode);
            self.copy_children_into(shadow, target, new_shadow);
        }
    }

    fn copy_children_into(&self, src: NodeId, target: &mut DomTree, dst: NodeId) {
        for child in self.children(src) {
            let new_child = target.push_child(dst, self.node(*child).data.clone());
            self.copy_contents_into(*child, target, new_child);
        }
    }
}

fn element_data(tag: &str, attrs: Vec<(String, String)>) -> NodeData {
    NodeData::Element { tag: tag.to_ascii_lowercase(), attrs }
}

/// Collapse runs of whitespace to single spaces and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::new("html");
        let body = tree.append_element(tree.root(), "body", Vec::new());
        let div = tree.append_element(body, "div", vec![("class".into(), "post body".into())]);
        tree.append_text(div, "Hello ");
        let a = tree.append_element(div, "a", vec![("href".into(), "/x".into())]);
        tree.append_text(a, "world");
        (tree, body, div)
    }

    #[test]
    fn test_serialize_round_trip_markup() {
        let (tree, _, div) = sample();
        assert_eq!(tree.outer_html(div), r#"<div class="post body">Hello <a href="/x">world</a></div>"#);
        assert_eq!(tree.inner_html(div), r#"Hello <a href="/x">world</a>"#);
    }

    #[test]
    fn test_text_and_inline_text() {
        let (tree, _, div) = sample();
        assert_eq!(tree.text(div), "Hello world");
        assert_eq!(tree.inline_text(div), "Hello ");
        assert_eq!(tree.classes(div).collect::<Vec<_>>(), vec!["post", "body"]);
    }

    #[test]
    fn test_link_density() {
        let (tree, body, div) = sample();
        let density = tree.link_density(div);
        assert!(density > 0.4 && density < 0.5, "density was {density}");
        assert_eq!(tree.link_density(body), density);
    }

    #[test]
    fn test_shadow_root_is_not_a_child() {
        let (mut tree, body, _) = sample();
        let host = tree.append_element(body, "x-card", Vec::new());
        let shadow = tree.attach_shadow(host, "open");
        let inner = tree.append_element(shadow, "p", Vec::new());
        tree.append_text(inner, "hidden text");

        assert!(tree.children(host).is_empty());
        assert_eq!(tree.shadow_root(host), Some(shadow));
        assert_eq!(tree.shadow_host(shadow), Some(host));
        assert!(tree.in_shadow_tree(inner));
        assert!(!tree.text(body).contains("hidden text"));
        assert!(tree.deep_text(body).contains("hidden text"));
        assert!(
            tree.outer_html(host)
                .contains(r#"<template shadowrootmode="open"><p>hidden text</p></template>"#)
        );
    }

    #[test]
    fn test_copy_subtree_is_independent() {
        let (tree, _, div) = sample();
        let copy = tree.copy_subtree(div);
        assert_eq!(copy.outer_html(copy.root()), tree.outer_html(div));
        assert_eq!(copy.parent(copy.root()), None);
    }

    #[test]
    fn test_rollback_discards_last_subtree() {
        let (mut tree, body, _) = sample();
        let before = tree.outer_html(tree.root());
        let checkpoint = tree.checkpoint();
        let nav = tree.append_element(body, "nav", Vec::new());
        tree.append_text(nav, "menu");
        tree.rollback(checkpoint);
        assert_eq!(tree.outer_html(tree.root()), before);
        assert_eq!(tree.len(), checkpoint);
    }

    #[test]
    fn test_escaping() {
        let mut tree = DomTree::new("p");
        let root = tree.root();
        tree.append_text(root, "a < b & c");
        assert_eq!(tree.outer_html(root), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_descendants_document_order() {
        let (tree, body, div) = sample();
        let order: Vec<_> = tree.descendants(body).into_iter().filter_map(|d| tree.tag_name(d)).collect();
        assert_eq!(order, vec!["div", "a"]);
        assert_eq!(tree.depth(div), 2);
    }
}
