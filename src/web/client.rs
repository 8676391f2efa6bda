//! Page fetching and readable-content extraction.
//!
//! Extraction runs a prioritized fallback chain: explicitly selected text,
//! then structured-article extraction, then heuristic content selectors, and
//! finally the whole page body.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use htmd::HtmlToMarkdown;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Articles shorter than this are treated as extraction misses and the next
/// strategy is tried instead.
const MIN_CONTENT_LEN: usize = 250;

/// Places where the main content of non-article pages typically lives,
/// in priority order.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".main-content",
    "#main-content",
    ".post-body",
    "#content",
    ".content",
];

/// Source of raw page HTML. The session only depends on this seam, so tests
/// can substitute canned documents for live fetches.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct PageClient {
    http_client: Client,
}

impl PageClient {
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }
}

impl Default for PageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for PageClient {
    async fn fetch(&self, url: &str) -> Result<String> {
        let url = Url::parse(url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(anyhow!("Cannot summarize {} pages.", url.scheme()));
        }

        let response = self
            .http_client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Extracts the most meaningful text from a page. A non-blank `selection`
/// short-circuits everything else; the final body fallback always yields a
/// result (possibly empty for pages without text).
pub fn extract_content(html: &str, selection: Option<&str>) -> String {
    if let Some(selection) = selection {
        if !selection.trim().is_empty() {
            return selection.to_string();
        }
    }

    let document = Html::parse_document(html);

    if let Some(text) = extract_article(&document) {
        debug!("extracted {} chars via article element", text.len());
        return text;
    }

    for selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = clean_text(&element.text().collect::<String>());
            if text.len() > MIN_CONTENT_LEN {
                debug!("extracted {} chars via heuristic selector", text.len());
                return text;
            }
        }
    }

    // Last resort: the entire page body.
    let body_selector = Selector::parse("body").unwrap();
    document
        .select(&body_selector)
        .next()
        .map(|body| clean_text(&body.text().collect::<String>()))
        .unwrap_or_default()
}

/// Structured extraction for well-formed articles: converts the `<article>`
/// element to markdown and prepends the page title. Short results are
/// rejected, letting the heuristic selectors take over.
fn extract_article(document: &Html) -> Option<String> {
    let article_selector = Selector::parse("article").ok()?;
    let article = document.select(&article_selector).next()?;

    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript", "svg"])
        .build();
    let markdown = tidy_markdown(&converter.convert(&article.html()).ok()?);
    if markdown.trim().len() <= MIN_CONTENT_LEN {
        return None;
    }

    let title_selector = Selector::parse("title").ok()?;
    let title = document
        .select(&title_selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty());

    Some(match title {
        Some(title) => format!("{title}\n\n{markdown}"),
        None => markdown,
    })
}

/// Strips image references and collapses excess blank lines left over from
/// the HTML-to-markdown conversion.
fn tidy_markdown(content: &str) -> String {
    let image_pattern = Regex::new(r"!\[.*?\]\([^)]*\)\n?").unwrap();
    let multiple_newlines = Regex::new(r"\n{3,}").unwrap();

    let content = image_pattern.replace_all(content, "");
    multiple_newlines
        .replace_all(&content, "\n\n")
        .trim()
        .to_string()
}

/// Collapses whitespace runs to a single space and blank-line runs to a
/// single newline.
fn clean_text(text: &str) -> String {
    let whitespace_runs = Regex::new(r"\s\s+").unwrap();
    let blank_lines = Regex::new(r"\n\n+").unwrap();

    let text = whitespace_runs.replace_all(text, " ");
    blank_lines.replace_all(&text, "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_paragraph() -> String {
        "Rust combines low-level control over performance with high-level \
         ergonomics and safety guarantees. "
            .repeat(4)
    }

    #[test]
    fn selection_takes_precedence_over_page_content() {
        let html = format!("<html><body><article><p>{}</p></article></body></html>", long_paragraph());
        assert_eq!(
            extract_content(&html, Some("just this part")),
            "just this part"
        );
    }

    #[test]
    fn blank_selection_is_ignored() {
        let html = "<html><body><p>short page</p></body></html>";
        assert_eq!(extract_content(html, Some("  \n ")), "short page");
    }

    #[test]
    fn article_extraction_includes_title() {
        let html = format!(
            "<html><head><title>A Fine Article</title></head>\
             <body><nav>menu</nav><article><p>{}</p></article></body></html>",
            long_paragraph()
        );
        let text = extract_content(&html, None);
        assert!(text.starts_with("A Fine Article\n\n"));
        assert!(text.contains("low-level control"));
        assert!(!text.contains("menu"));
    }

    #[test]
    fn short_article_falls_through_to_heuristic_selectors() {
        let html = format!(
            "<html><body><article><p>tiny</p></article>\
             <div class=\"main-content\"><p>{}</p></div></body></html>",
            long_paragraph()
        );
        let text = extract_content(&html, None);
        assert!(text.contains("low-level control"));
        assert!(!text.starts_with("tiny"));
    }

    #[test]
    fn falls_back_to_body_text() {
        let html = "<html><body><p>just a  short\n\n\npage</p></body></html>";
        assert_eq!(extract_content(html, None), "just a short page");
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("a   b\t\tc"), "a b c");
        assert_eq!(clean_text("  padded  "), "padded");
    }

    #[test]
    fn tidy_markdown_strips_images() {
        let content = "before\n![alt text](https://example.com/pic.png)\nafter";
        assert_eq!(tidy_markdown(content), "before\nafter");
    }
}
