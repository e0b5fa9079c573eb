// ABOUTME: YouTube specialization: generic fields, query parameter extras, and video thumbnails.
// ABOUTME: Distinguishes playlist and watch pages by path.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::error::PreviewError;
use crate::extractors::fields::{meta_content, selector};
use crate::extractors::generic::primitive;
use crate::link::Link;

/// Query parameters copied into extras, with the extras key they land under.
pub const QUERY_TO_EXTRAS: &[(&str, &str)] = &[
    ("i", "Index"),
    ("list", "Playlist"),
    ("t", "Time"),
    ("v", "Video"),
];

const TITLE_SUFFIX: &str = " - YouTube";

static ITEMPROP_NAME: Lazy<Selector> = Lazy::new(|| selector(r#"meta[itemprop="name"]"#));

/// Thumbnail URL for a video id.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

/// Extract a YouTube page preview.
pub fn extract(doc: &Html, url: &Url, uri: &str) -> Result<Link, PreviewError> {
    let mut link = primitive(doc, url, uri);

    if let Some(stripped) = link.title.strip_suffix(TITLE_SUFFIX) {
        link.title = stripped.to_string();
    }
    if link.title.is_empty() {
        link.title = meta_content(doc, &[&ITEMPROP_NAME])
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "YouTube".to_string());
    }
    link.set_extra("IsYouTubeLink", "true");

    if url.query().map_or(true, str::is_empty) {
        return Ok(link);
    }

    // Later occurrences of a parameter overwrite earlier ones.
    for (key, value) in url.query_pairs() {
        if let Some((_, extra)) = QUERY_TO_EXTRAS.iter().find(|(param, _)| *param == key) {
            link.set_extra(*extra, value.into_owned());
        }
    }

    link.set_extra("IsPlaylist", "false");
    link.set_extra("IsVideo", "false");

    if url.path().starts_with("/playlist") {
        link.set_extra("IsPlaylist", "true");
        if let Ok(mut image) = Url::parse(&link.image) {
            image.set_query(None);
            link.image = image.to_string();
        }
    }

    if url.path().starts_with("/watch") {
        link.image = thumbnail_url(link.extra("Video").unwrap_or_default());
        link.set_extra("IsVideo", "true");
    }

    Ok(link)
}
