use regex::Regex;
use std::sync::LazyLock;

static COMMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static HIDDEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("valid regex"));

static WHITESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Configuration for markup cleaning ahead of parsing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to drop script, style and noscript elements
    pub remove_scripts: bool,
    /// Whether to drop embedded media that carries no readable text (iframe, svg, canvas)
    pub remove_embeds: bool,
    /// Whether to drop elements hidden with inline styles or the `hidden` attribute
    pub remove_hidden: bool,
    /// Whether to strip comments
    pub remove_comments: bool,
    /// Whether to collapse whitespace runs to a single space
    pub normalize_whitespace: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_scripts: true,
            remove_embeds: true,
            remove_hidden: true,
            remove_comments: true,
            normalize_whitespace: true,
        }
    }
}

/// Clean markup before it is parsed into a [`crate::DomTree`]
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = if config.remove_comments {
        COMMENT_PATTERN.replace_all(html, "").into_owned()
    } else {
        html.to_string()
    };

    let mut removed: Vec<&str> = Vec::new();
    if config.remove_scripts {
        removed.extend(["script", "style", "noscript"]);
    }
    if config.remove_embeds {
        removed.extend(["iframe", "svg", "canvas"]);
    }
    if !removed.is_empty() || config.remove_hidden {
        processed = rewrite_elements(&processed, &removed, config.remove_hidden);
    }

    if config.normalize_whitespace {
        processed = WHITESPACE_PATTERN.replace_all(&processed, " ").into_owned();
    }

    processed
}

/// Remove the listed tags, and optionally hidden elements, in one streaming pass
fn rewrite_elements(html: &str, tags: &[&str], remove_hidden: bool) -> String {
    let mut handlers = Vec::new();
    for &tag in tags {
        handlers.push(lol_html::element!(tag, |el| {
            el.remove();
            Ok(())
        }));
    }
    if remove_hidden {
        handlers.push(lol_html::element!("*", |el| {
            let hidden_style = el.get_attribute("style").is_some_and(|s| HIDDEN_PATTERN.is_match(&s));
            if hidden_style || el.has_attribute("hidden") {
                el.remove();
            }
            Ok(())
        }));
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }
    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_scripts_and_embeds() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <p>Content</p>
                </body>
            </html>
        "#;

        let result = preprocess_html(html, &PreprocessConfig::default());
        assert!(!result.contains("alert"));
        assert!(!result.contains("color:red"));
        assert!(!result.contains("Enable JavaScript"));
        assert!(!result.contains("<iframe"));
        assert!(!result.contains("rect"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_remove_comments() {
        let html = "<body><!-- a\nmultiline comment --><p>Visible content</p></body>";
        let result = preprocess_html(html, &PreprocessConfig::default());
        assert!(!result.contains("<!--"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"
            <body>
                <div style="display:none">Hidden content</div>
                <div hidden>Invisible content</div>
                <div>Visible content</div>
            </body>
        "#;

        let result = preprocess_html(html, &PreprocessConfig::default());
        assert!(!result.contains("Hidden content"));
        assert!(!result.contains("Invisible content"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_keeps_everything_when_disabled() {
        let html = "<body><script>x()</script>\n\n<p>Text</p></body>";
        let config = PreprocessConfig {
            remove_scripts: false,
            remove_embeds: false,
            remove_hidden: false,
            remove_comments: false,
            normalize_whitespace: false,
        };
        assert_eq!(preprocess_html(html, &config), html);
    }

    #[test]
    fn test_normalize_whitespace() {
        let html = "<body>    Multiple   spaces\t\t\n\nhere</body>";
        let result = preprocess_html(html, &PreprocessConfig::default());
        assert_eq!(result, "<body> Multiple spaces here</body>");
    }
}
