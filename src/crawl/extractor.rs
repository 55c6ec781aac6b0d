//! HTML text and link extraction
//!
//! Parsing is synchronous on purpose: `scraper::Html` is not Send, so the
//! worker parses a fetched body in one call and only the extracted strings
//! cross await points.

use scraper::{Html, Selector};
use url::Url;

/// Visible text of a page, with script and style content dropped.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let skip = Selector::parse("script, style, noscript").expect("static selector");
    let skipped: Vec<_> = document.select(&skip).map(|el| el.id()).collect();

    let mut text = String::new();
    for node in document.tree.nodes() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let inside_skipped = node
            .ancestors()
            .any(|a| skipped.contains(&a.id()));
        if inside_skipped {
            continue;
        }

        let trimmed = fragment.trim();
        if !trimmed.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(trimmed);
        }
    }
    text
}

/// Resolve every anchor href against the page's base URL.
///
/// Returns absolute http(s) URLs in document order, deduplicated. Hrefs
/// that do not resolve are logged and skipped.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("static selector");

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match base.join(href) {
            Ok(resolved) => {
                if resolved.scheme() != "http" && resolved.scheme() != "https" {
                    continue;
                }
                if seen.insert(resolved.to_string()) {
                    links.push(resolved);
                }
            }
            Err(e) => {
                tracing::debug!("skipping unresolvable href {:?} on {}: {}", href, base, e);
            }
        }
    }

    links
}
