// ABOUTME: Selector helpers shared by the extractors for reading text, meta content, and attributes.
// ABOUTME: Also resolves the host key (host plus explicit port) used for links and registry lookups.

//! Field extraction utilities.
//!
//! Key behaviors:
//! - Selectors are compiled once and reused (`selector`).
//! - Meta lookups are presence based: a tag with an empty `content` still counts.
//! - Attribute lookups skip empty values.

use scraper::{Html, Selector};
use url::Url;

/// Compile a selector known to be valid at build time.
///
/// # Panics
///
/// Panics if `css` is not a valid selector. Only call with literal selectors.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

/// Returns the trimmed text of the first element matching `sel`, or an empty string.
pub fn first_text(doc: &Html, sel: &Selector) -> String {
    doc.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Returns the `content` attribute of the first matching meta tag that declares one.
///
/// Selectors are tried in order.
pub fn meta_content(doc: &Html, selectors: &[&Selector]) -> Option<String> {
    for sel in selectors {
        for el in doc.select(sel) {
            if let Some(content) = el.value().attr("content") {
                return Some(content.trim().to_string());
            }
        }
    }
    None
}

/// Extracts a non-empty attribute value from the first matching element.
pub fn extract_attr_first(doc: &Html, sel: &Selector, attr: &str) -> Option<String> {
    for el in doc.select(sel) {
        if let Some(value) = el.value().attr(attr) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// The host as it appears in the URL authority, including an explicit port.
pub fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
