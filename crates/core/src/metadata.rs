use serde::Serialize;

use crate::Document;
use crate::dom_tree::NodeId;

/// Descriptive metadata discovered in a document's head and headings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub site_name: Option<String>,
    pub excerpt: Option<String>,
    pub language: Option<String>,
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. Open Graph `og:title`
    /// 2. Twitter `twitter:title`
    /// 3. Meta `title` / `DC.title`
    /// 4. `<title>` element
    /// 5. First `<h1>` element
    pub fn extract_title(&self) -> Option<String> {
        ["og:title", "twitter:title", "title", "DC.title"]
            .iter()
            .find_map(|key| self.meta_content(key))
            .or_else(|| self.title())
            .or_else(|| {
                let tree = self.tree();
                tree.descendants_by_tag(tree.root(), "h1")
                    .map(|h| tree.normalized_text(h))
                    .find(|t| !t.is_empty())
            })
    }

    /// Collect all metadata fields
    pub fn extract_metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            title: self.extract_title(),
            site_name: self.meta_content("og:site_name"),
            excerpt: self
                .meta_content("og:description")
                .or_else(|| self.meta_content("description")),
            language: self
                .tree()
                .attr(self.tree().root(), "lang")
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        }
    }

    /// Content of a `<meta>` tag matched by `property` or `name`
    fn meta_content(&self, key: &str) -> Option<String> {
        let tree = self.tree();
        let matches_key = |meta: &NodeId| {
            tree.attr(*meta, "property")
                .or_else(|| tree.attr(*meta, "name"))
                .is_some_and(|k| k.eq_ignore_ascii_case(key))
        };

        tree.descendants_by_tag(tree.root(), "meta")
            .filter(matches_key)
            .filter_map(|meta| tree.attr(meta, "content"))
            .map(|content| content.trim().to_string())
            .find(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn test_title_priority() {
        let html = r#"
            <html lang="en"><head>
                <title>Fallback Title</title>
                <meta property="og:title" content="Open Graph Title">
                <meta property="og:site_name" content="Example">
                <meta name="description" content="A short summary">
            </head><body><h1>Heading</h1></body></html>
        "#;
        let doc = Document::parse(html, None).unwrap();
        let metadata = doc.extract_metadata();

        assert_eq!(metadata.title.as_deref(), Some("Open Graph Title"));
        assert_eq!(metadata.site_name.as_deref(), Some("Example"));
        assert_eq!(metadata.excerpt.as_deref(), Some("A short summary"));
        assert_eq!(metadata.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_title_falls_back_to_heading() {
        let doc = Document::parse("<html><body><h1> Only a heading </h1></body></html>", None).unwrap();
        assert_eq!(doc.extract_title().as_deref(), Some("Only a heading"));
    }

    #[test]
    fn test_no_title() {
        let doc = Document::parse("<html><body><p>text</p></body></html>", None).unwrap();
        assert_eq!(doc.extract_metadata().title, None);
    }
}
