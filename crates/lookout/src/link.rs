// ABOUTME: Link struct holding the preview metadata extracted for one requested URL.
// ABOUTME: Includes a markdown preview card renderer and helpers for direct media links.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Extras key set on direct image links.
pub const IS_IMAGE_LINK: &str = "IsImageLink";
/// Extras key set on direct video links.
pub const IS_VIDEO_LINK: &str = "IsVideoLink";

/// The preview metadata for a single URL.
///
/// `uri` is the string the caller asked for and `host` is the canonical host that was
/// actually fetched. Specializations communicate anything else through `extras`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Link {
    pub description: String,
    pub favicon: String,
    pub host: String,
    pub title: String,
    pub uri: String,
    pub image: String,
    pub extras: HashMap<String, String>,
}

impl Link {
    /// Create an empty link for the given host and request string.
    pub fn new(host: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Look up an extras value.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    /// Set an extras value, replacing any previous one.
    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extras.insert(key.into(), value.into());
    }

    /// Returns true if this link points straight at an image.
    pub fn is_image_link(&self) -> bool {
        self.extra(IS_IMAGE_LINK) == Some("true")
    }

    /// Returns true if this link points straight at a video.
    pub fn is_video_link(&self) -> bool {
        self.extra(IS_VIDEO_LINK) == Some("true")
    }

    /// Format the link as a markdown preview card.
    pub fn format_markdown(&self) -> String {
        let mut parts = Vec::new();

        if !self.title.is_empty() {
            parts.push(format!("# {}", self.title));
        }

        if !self.uri.is_empty() {
            parts.push(format!("Source: {}", self.uri));
        }

        if !self.description.is_empty() {
            parts.push(format!("> {}", self.description));
        }

        if !self.image.is_empty() {
            parts.push(format!("![Preview]({})", self.image));
        }

        if !self.extras.is_empty() {
            let mut keys: Vec<&String> = self.extras.keys().collect();
            keys.sort();
            let lines = keys
                .into_iter()
                .map(|k| format!("- {}: {}", k, self.extras[k]))
                .collect::<Vec<_>>()
                .join("\n");
            parts.push(lines);
        }

        parts.join("\n\n")
    }
}
