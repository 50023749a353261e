use std::str::FromStr;

use anyhow::Context;
use sift_core::{Document, PipelineResult};

/// Output format for extracted content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Html,
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: markdown, html, text, json", s)),
        }
    }
}

/// Serialize a pipeline result in the requested format.
///
/// Site extractors return text rather than markup; for those results the
/// HTML output wraps each line in a paragraph and Markdown keeps the lines
/// as paragraphs.
pub fn render(result: &PipelineResult, format: OutputFormat) -> anyhow::Result<String> {
    let is_markup = result.node.is_some();
    let output = match format {
        OutputFormat::Html if is_markup => result.content.clone(),
        OutputFormat::Html => text_to_html(&result.content),
        OutputFormat::Markdown if is_markup => {
            htmd::convert(&result.content).context("Failed to convert to Markdown")?
        }
        OutputFormat::Markdown => result
            .content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        OutputFormat::Text if is_markup => {
            let doc = Document::parse(&result.content, None).context("Failed to parse extracted HTML")?;
            block_text(&doc)
        }
        OutputFormat::Text => result.content.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(result).context("Failed to serialize result")?,
    };
    Ok(ensure_trailing_newline(output))
}

/// Paragraph-separated text of a parsed fragment
fn block_text(doc: &Document) -> String {
    let tree = doc.tree();
    let blocks: Vec<String> = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|id| {
            matches!(
                tree.tag_name(*id),
                Some("p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" | "pre" | "blockquote" | "td")
            )
        })
        .filter(|id| {
            !tree
                .parent(*id)
                .is_some_and(|p| matches!(tree.tag_name(p), Some("li" | "blockquote" | "td")))
        })
        .map(|id| tree.normalized_text(id))
        .filter(|text| !text.is_empty())
        .collect();

    if blocks.is_empty() { doc.tree().normalized_text(tree.root()) } else { blocks.join("\n\n") }
}

fn text_to_html(text: &str) -> String {
    let body: String = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix("## ") {
            Some(heading) => format!("<h2>{}</h2>\n", escape(heading)),
            None => format!("<p>{}</p>\n", escape(line)),
        })
        .collect();
    format!("<article>\n{body}</article>")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn ensure_trailing_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert_eq!("HTML".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert_eq!("txt".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_to_html_escapes_and_marks_headings() {
        let html = text_to_html("Fish & chips <3\n\n## Comments\nTasty");
        assert_eq!(html, "<article>\n<p>Fish &amp; chips &lt;3</p>\n<h2>Comments</h2>\n<p>Tasty</p>\n</article>");
    }

    #[test]
    fn test_block_text_separates_paragraphs() {
        let doc = Document::parse("<div><h2>Title</h2><p>One.</p><ul><li><p>Two.</p></li></ul></div>", None).unwrap();
        assert_eq!(block_text(&doc), "Title\n\nOne.\n\nTwo.");
    }
}
