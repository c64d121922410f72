//! Content parsing and extraction.
//!
//! Dispatches on the response's declared content type and, for HTML
//! documents, runs a small chain of named extractors over the parsed tree.
//! Any single extractor failing is logged and skipped rather than aborting
//! the whole page -- a missing title or a malformed `<a>` tag should never
//! sink an otherwise-good page.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Coarse classification of a response body, derived from its `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    PlainText,
    Json,
    Other,
}

impl ContentKind {
    pub fn classify(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("html") {
            ContentKind::Html
        } else if ct.contains("json") {
            ContentKind::Json
        } else if ct.starts_with("text/") {
            ContentKind::PlainText
        } else {
            ContentKind::Other
        }
    }
}

/// The result of parsing a fetched page.
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub links: Vec<String>,
    pub clean_text: String,
}

/// Elements whose entire subtree is excluded from clean-text extraction.
const STRIPPED_TAGS: &[&str] = &["script", "style", "iframe", "noscript", "svg"];

/// Parses a fetched body according to its content kind.
///
/// HTML bodies run the full extractor chain (links, metadata, clean text).
/// Plain text bodies pass through as clean text with no links. JSON and
/// other content types carry no extracted structure -- callers that need
/// to inspect them do so on the raw body directly.
pub fn parse_content(kind: ContentKind, body: &str, base_url: &Url) -> ParsedPage {
    match kind {
        ContentKind::Html => parse_html(body, base_url),
        ContentKind::PlainText => ParsedPage {
            clean_text: body.trim().to_string(),
            ..Default::default()
        },
        ContentKind::Json | ContentKind::Other => ParsedPage::default(),
    }
}

fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = run_extractor("title", || extract_title(&document));
    let meta_description = run_extractor("meta-description", || extract_meta_description(&document));
    let links = run_extractor("links", || Some(extract_links(&document, base_url))).unwrap_or_default();
    let clean_text = run_extractor("clean-text", || Some(extract_clean_text(&document))).unwrap_or_default();

    ParsedPage {
        title,
        meta_description,
        links,
        clean_text,
    }
}

/// Runs a single named extractor, logging and swallowing any panic-free
/// failure (represented here as `None`) so one bad extractor never aborts
/// the rest of the chain.
fn run_extractor<T>(name: &str, f: impl FnOnce() -> Option<T>) -> Option<T> {
    let result = f();
    if result.is_none() {
        tracing::debug!(extractor = name, "extractor produced no output");
    }
    result
}

/// Extracts the page title, falling back to the first `<h1>` when there is
/// no `<title>` element or it is empty.
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;
    if let Some(element) = document.select(&title_selector).next() {
        let text = element.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }

    let h1_selector = Selector::parse("h1").ok()?;
    let text = document
        .select(&h1_selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    let content = document
        .select(&selector)
        .next()?
        .value()
        .attr("content")?
        .trim()
        .to_string();
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

/// Extracts and resolves every `<a href>` to an absolute URL, skipping
/// fragment-only, `javascript:`, `mailto:`, `tel:`, and `data:` links.
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("javascript:")
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || lower.starts_with("data:")
        {
            continue;
        }

        if let Some(resolved) = resolve_link(base_url, href) {
            links.push(resolved);
        }
    }
    links
}

fn resolve_link(base_url: &Url, href: &str) -> Option<String> {
    base_url.join(href).ok().map(|u| u.to_string())
}

/// Walks the document tree collecting visible text, skipping the subtrees
/// of [`STRIPPED_TAGS`] entirely. Whitespace is collapsed so the result is
/// suitable for word-count or keyword heuristics.
fn extract_clean_text(document: &Html) -> String {
    let exclude: HashSet<&str> = STRIPPED_TAGS.iter().copied().collect();
    let mut out = String::new();
    collect_text(document.root_element(), &exclude, &mut out);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef, exclude: &HashSet<&str>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            scraper::node::Node::Text(text) => {
                out.push_str(&text.text);
                out.push(' ');
            }
            scraper::node::Node::Element(el) => {
                if exclude.contains(el.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, exclude, out);
                }
            }
            _ => {}
        }
    }
}
