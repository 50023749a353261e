//! Markup parsing into a [`DomTree`].
//!
//! This module provides the [`Document`] type handed to the pipeline and the
//! [`DocumentParser`] collaborator that produces it. The default
//! [`HtmlParser`] cleans markup with [`preprocess_html`](crate::preprocess_html),
//! parses it with `scraper`, and copies the result into an arena tree,
//! turning declarative shadow roots (`<template shadowrootmode>`) into
//! explicit shadow sub-trees.
//!
//! # Example
//!
//! ```rust
//! use sift_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Title</title></head>
//!         <body><p class="content">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html, Some("https://example.com/post")).unwrap();
//! assert_eq!(doc.title(), Some("Title".to_string()));
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node};
use url::Url;

use crate::dom_tree::{DomTree, NodeData, NodeId};
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::selector::Selector;
use crate::{Result, SiftError};

/// A parsed document plus the identifier of where it came from.
///
/// The source identifier is usually a URL, but any string is accepted; it
/// is only interpreted by site-specific strategies and carried into result
/// metadata.
#[derive(Debug, Clone)]
pub struct Document {
    tree: DomTree,
    source: Option<String>,
    url: Option<Url>,
}

impl Document {
    /// Parses markup with the default [`HtmlParser`].
    ///
    /// # Arguments
    ///
    /// * `html` - The markup to parse
    /// * `source` - Optional source identifier, typically the page URL
    pub fn parse(html: &str, source: Option<&str>) -> Result<Self> {
        HtmlParser::default().parse(html, source)
    }

    /// Parses markup and requires `url` to be a valid absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::InvalidUrl`] if the URL cannot be parsed.
    pub fn parse_with_url(html: &str, url: &str) -> Result<Self> {
        Url::parse(url).map_err(|e| SiftError::InvalidUrl(format!("{url}: {e}")))?;
        Self::parse(html, Some(url))
    }

    /// Wraps an already built tree.
    pub fn from_tree(tree: DomTree, source: Option<&str>) -> Self {
        let url = source.and_then(|s| Url::parse(s).ok());
        Self { tree, source: source.map(str::to_string), url }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Source identifier, if one was supplied.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Source identifier parsed as a URL, when it is one.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The `<body>` element, or the root when there is none.
    pub fn body(&self) -> NodeId {
        let root = self.tree.root();
        if self.tree.tag_name(root) == Some("body") {
            return root;
        }
        self.tree
            .element_children(root)
            .find(|c| self.tree.tag_name(*c) == Some("body"))
            .unwrap_or(root)
    }

    /// Selects light-tree elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::InvalidSelector`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        let sel = Selector::parse(selector)?;
        Ok(sel.select(&self.tree, self.tree.root()))
    }

    /// Text content of the `<title>` element, if present.
    pub fn title(&self) -> Option<String> {
        self.tree
            .descendants_by_tag(self.tree.root(), "title")
            .next()
            .map(|t| self.tree.normalized_text(t))
            .filter(|t| !t.is_empty())
    }

    /// Light-tree text of the whole document.
    pub fn text_content(&self) -> String {
        self.tree.text(self.tree.root())
    }

    /// Whether any text exists anywhere, shadow trees included.
    pub fn has_text(&self) -> bool {
        self.tree
            .deep_text(self.tree.root())
            .chars()
            .any(|c| !c.is_whitespace())
    }
}

/// Turns raw markup plus a source identifier into a [`Document`].
///
/// The pipeline never parses markup itself; callers inject whichever parser
/// suits their input.
pub trait DocumentParser: Send + Sync {
    /// Parse `markup` that was obtained from `source`.
    fn parse(&self, markup: &str, source: Option<&str>) -> Result<Document>;
}

/// Default HTML parser backed by `scraper` and `lol_html` preprocessing.
#[derive(Debug, Clone, Default)]
pub struct HtmlParser {
    preprocess: PreprocessConfig,
}

impl HtmlParser {
    /// Creates a parser with custom preprocessing.
    pub fn with_preprocess(preprocess: PreprocessConfig) -> Self {
        Self { preprocess }
    }
}

impl DocumentParser for HtmlParser {
    fn parse(&self, markup: &str, source: Option<&str>) -> Result<Document> {
        let cleaned = preprocess_html(markup, &self.preprocess);
        let html = Html::parse_document(&cleaned);
        let root_element = html.root_element();

        let mut tree = DomTree::with_root_data(NodeData::Element {
            tag: root_element.value().name().to_ascii_lowercase(),
            attrs: collect_attrs(root_element),
        });
        let root = tree.root();
        convert_children(*root_element, &mut tree, root);

        Ok(Document::from_tree(tree, source))
    }
}

fn collect_attrs(element: ElementRef<'_>) -> Vec<(String, String)> {
    element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Mode of a declarative shadow root template, if `element` is one
fn shadow_mode(element: ElementRef<'_>) -> Option<String> {
    let value = element.value();
    if value.name() != "template" {
        return None;
    }
    value
        .attr("shadowrootmode")
        .or_else(|| value.attr("shadowroot"))
        .map(|mode| mode.to_ascii_lowercase())
}

fn convert_children(node: NodeRef<'_, Node>, tree: &mut DomTree, parent: NodeId) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                if !text.is_empty() {
                    tree.append_text(parent, text);
                }
            }
            // Template contents hang off the template in their own fragment
            Node::Fragment => convert_children(child, tree, parent),
            Node::Element(_) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                match shadow_mode(child_element) {
                    Some(mode) if tree.is_element(parent) => {
                        let shadow = tree.attach_shadow(parent, &mode);
                        convert_children(child, tree, shadow);
                    }
                    _ => {
                        let tag = child_element.value().name();
                        let id = tree.append_element(parent, tag, collect_attrs(child_element));
                        if tag != "template" {
                            convert_children(child, tree, id);
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML, None).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert_eq!(doc.tree().tag_name(doc.tree().root()), Some("html"));
        assert_eq!(doc.tree().attr(doc.tree().root(), "lang"), Some("en"));
        assert_eq!(doc.tree().tag_name(doc.body()), Some("body"));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML, None).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(doc.tree().text(elements[0]), "Paragraph 1");
        assert_eq!(doc.tree().text(elements[1]), "Paragraph 2");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML, None).unwrap();
        assert!(matches!(doc.select("p > a"), Err(SiftError::InvalidSelector(_))));
    }

    #[test]
    fn test_source_identifier() {
        let doc = Document::parse(SAMPLE_HTML, Some("https://example.com/a")).unwrap();
        assert_eq!(doc.source(), Some("https://example.com/a"));
        assert_eq!(doc.url().map(|u| u.host_str()), Some(Some("example.com")));

        let doc = Document::parse(SAMPLE_HTML, Some("clipboard")).unwrap();
        assert_eq!(doc.source(), Some("clipboard"));
        assert!(doc.url().is_none());
    }

    #[test]
    fn test_parse_with_url_rejects_garbage() {
        assert!(matches!(
            Document::parse_with_url(SAMPLE_HTML, "not a url"),
            Err(SiftError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_declarative_shadow_root() {
        let html = r#"
            <html><body>
                <x-post>
                    <template shadowrootmode="open"><div class="chrome"><slot name="body"></slot></div></template>
                    <p slot="body">Slotted text</p>
                </x-post>
            </body></html>
        "#;
        let doc = Document::parse(html, None).unwrap();
        let tree = doc.tree();
        let host = doc.select("x-post").unwrap()[0];

        let shadow = tree.shadow_root(host).expect("shadow root attached");
        assert!(tree.in_shadow_tree(tree.descendants(shadow)[0]));
        assert!(tree.element_children(host).all(|c| tree.tag_name(c) == Some("p")));
        assert!(doc.select("template").unwrap().is_empty());
        assert!(doc.select(".chrome").unwrap().is_empty(), "shadow content stays out of light selection");
    }

    #[test]
    fn test_shadow_content_survives_parsing() {
        let html = r#"<html><body><x-post><template shadowrootmode="open"><div class="chrome">Chrome text</div><slot name="b"></slot></template><p slot="b">Slotted</p></x-post></body></html>"#;
        let doc = Document::parse(html, None).unwrap();
        let tree = doc.tree();
        let host = doc.select("x-post").unwrap()[0];
        let shadow = tree.shadow_root(host).unwrap();

        let shadow_tags: Vec<_> = tree.descendants(shadow).into_iter().filter_map(|id| tree.tag_name(id)).collect();
        assert_eq!(shadow_tags, vec!["div", "slot"]);
        assert_eq!(tree.attr(tree.children(shadow)[0], "class"), Some("chrome"));
        assert!(tree.deep_text(host).contains("Chrome text"));
        assert!(tree.deep_text(host).contains("Slotted"));
        assert_eq!(
            tree.outer_html(host),
            r#"<x-post><template shadowrootmode="open"><div class="chrome">Chrome text</div><slot name="b"></slot></template><p slot="b">Slotted</p></x-post>"#
        );
        assert!(doc.has_text());
    }

    #[test]
    fn test_shadow_only_document_has_text() {
        let html = r#"<html><body><x-card><template shadowrootmode="closed"><p>Only here</p></template></x-card></body></html>"#;
        let doc = Document::parse(html, None).unwrap();
        assert!(doc.has_text());
        assert!(!doc.text_content().contains("Only here"));
    }

    #[test]
    fn test_inert_template_is_not_content() {
        let html = "<html><body><template><p>Inert markup</p></template><p>Shown</p></body></html>";
        let doc = Document::parse(html, None).unwrap();
        assert!(!tree_text(&doc).contains("Inert markup"));
        assert!(tree_text(&doc).contains("Shown"));
    }

    fn tree_text(doc: &Document) -> String {
        doc.tree().deep_text(doc.tree().root())
    }

    #[test]
    fn test_scripts_are_stripped() {
        let html = "<html><body><script>var x = 1;</script><p>Visible</p></body></html>";
        let doc = Document::parse(html, None).unwrap();
        assert!(!doc.text_content().contains("var x"));
        assert!(doc.has_text());
    }

    #[test]
    fn test_empty_document_has_no_text() {
        let doc = Document::parse("<html><body></body></html>", None).unwrap();
        assert!(!doc.has_text());
    }
}
