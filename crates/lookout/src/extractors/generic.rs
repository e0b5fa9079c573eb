// ABOUTME: The generic extractor: baseline title, description, favicon, and image for any HTML page.
// ABOUTME: Never fails; missing fields are left as empty strings. Every specialization builds on it.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::extractors::fields::{extract_attr_first, first_text, host_key, meta_content, selector};
use crate::link::Link;

/// Meta properties checked for a preview image, in priority order.
pub const META_IMAGE_NAMES: &[&str] = &["og:image", "twitter:image"];

static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="description"]"#));
static OG_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    selector(r#"meta[property="og:description"], meta[name="og:description"]"#)
});
static ICONS: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel~="icon"]"#));
static INLINE_IMAGE: Lazy<Selector> = Lazy::new(|| selector("img"));
static META_IMAGES: Lazy<Vec<Selector>> = Lazy::new(|| {
    META_IMAGE_NAMES
        .iter()
        .map(|name| selector(&format!(r#"meta[property="{name}"], meta[name="{name}"]"#)))
        .collect()
});

/// Extract the baseline fields of a Link from a parsed document.
///
/// `url` supplies the host and the scheme used to absolutize relative favicon and image
/// references; `uri` is stored untouched.
pub fn primitive(doc: &Html, url: &Url, uri: &str) -> Link {
    let mut link = Link::new(host_key(url), uri);
    link.title = first_text(doc, &TITLE);
    link.description = meta_content(doc, &[&DESCRIPTION, &OG_DESCRIPTION]).unwrap_or_default();
    link.favicon = extract_favicon(doc, url);
    link.image = extract_image(doc, url);
    link
}

/// Pick the icon with the largest declared size, else the first unsized icon.
///
/// Icons whose size token is not an integer are ignored.
pub fn extract_favicon(doc: &Html, url: &Url) -> String {
    let mut largest: Option<(u32, String)> = None;
    let mut first_unsized: Option<String> = None;

    for el in doc.select(&ICONS) {
        let href = el.value().attr("href").map(str::trim).unwrap_or("");
        if href.is_empty() {
            continue;
        }
        let href = resolve_favicon_href(href, url);

        match el.value().attr("sizes").or_else(|| el.value().attr("size")) {
            Some(sizes) => {
                if let Some(size) = size_token(sizes) {
                    if size > largest.as_ref().map_or(0, |(l, _)| *l) {
                        largest = Some((size, href));
                    }
                }
            }
            None => {
                if first_unsized.is_none() {
                    first_unsized = Some(href);
                }
            }
        }
    }

    largest
        .map(|(_, href)| href)
        .or(first_unsized)
        .unwrap_or_default()
}

/// The leading integer of a size declaration such as "32x32".
fn size_token(sizes: &str) -> Option<u32> {
    sizes.trim().split(['x', 'X']).next()?.trim().parse().ok()
}

fn resolve_favicon_href(href: &str, url: &Url) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    if href.starts_with("//") {
        return format!("{}:{}", url.scheme(), href);
    }
    let prefix = format!("{}://{}", url.scheme(), host_key(url));
    if href.starts_with('/') {
        format!("{}{}", prefix, href)
    } else {
        format!("{}/{}", prefix, href)
    }
}

/// Preview image from meta properties, falling back to the first inline image.
pub fn extract_image(doc: &Html, url: &Url) -> String {
    let mut image = META_IMAGES
        .iter()
        .find_map(|sel| meta_content(doc, &[sel]))
        .unwrap_or_default();

    if image.is_empty() {
        image = extract_attr_first(doc, &INLINE_IMAGE, "src").unwrap_or_default();
    }

    if !image.is_empty() && !image.starts_with("http") {
        let mut prefix = format!("{}:", url.scheme());
        if !image.starts_with("//") {
            prefix.push_str("//");
        }
        image = prefix + &image;
    }
    image
}
