// ABOUTME: Specializations that turn a parsed page into a Link, and the LinkParser capability.
// ABOUTME: Built-in variants (generic, Reddit, YouTube, Twitch) share one dispatch point with caller parsers.

//! Link extraction module.
//!
//! Every page is handled by exactly one [`Specialization`]. The generic extractor is the
//! base layer; the Reddit and YouTube specializations start from it and add extras, while
//! the Twitch specialization ignores the page and queries Twitch's GraphQL API instead.
//! Callers plug in their own logic through [`LinkParser`].
//!
//! Submodules:
//! - `fields`: selector helpers shared by the extractors.
//! - `generic`: the heuristic title/description/favicon/image extractor.
//! - `registry`: host to specialization mapping with override tracking.

pub mod fields;
pub mod generic;
pub mod reddit;
pub mod registry;
pub mod twitch;
pub mod youtube;

use std::fmt;
use std::sync::Arc;

use scraper::Html;
use url::Url;

use crate::error::PreviewError;
use crate::link::Link;
use crate::options::Settings;

/// A caller-supplied extraction capability.
///
/// Receives the parsed document, the URL the document is keyed by, and the string the
/// caller originally asked for (to be stored as the Link's `uri`).
pub trait LinkParser: Send + Sync {
    fn parse(&self, doc: &Html, url: &Url, uri: &str) -> Result<Link, PreviewError>;
}

impl<F> LinkParser for F
where
    F: Fn(&Html, &Url, &str) -> Result<Link, PreviewError> + Send + Sync,
{
    fn parse(&self, doc: &Html, url: &Url, uri: &str) -> Result<Link, PreviewError> {
        self(doc, url, uri)
    }
}

/// Everything a network-backed specialization needs besides the URL.
#[derive(Debug, Clone)]
pub struct ExtractContext<'a> {
    pub http_client: &'a reqwest::Client,
    pub settings: Settings,
    pub twitch_endpoint: &'a str,
}

/// The closed set of extraction strategies a host can resolve to.
#[derive(Clone)]
pub enum Specialization {
    Generic,
    Reddit,
    YouTube,
    Twitch,
    Custom(Arc<dyn LinkParser>),
}

impl Specialization {
    /// Wrap a caller-supplied parser.
    pub fn custom(parser: impl LinkParser + 'static) -> Self {
        Specialization::Custom(Arc::new(parser))
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Specialization::Generic => "generic",
            Specialization::Reddit => "reddit",
            Specialization::YouTube => "youtube",
            Specialization::Twitch => "twitch",
            Specialization::Custom(_) => "custom",
        }
    }

    /// Returns true for caller-supplied parsers.
    pub fn is_custom(&self) -> bool {
        matches!(self, Specialization::Custom(_))
    }

    /// Produce a Link from a fetched HTML body.
    ///
    /// The document is only parsed for specializations that read it, and never lives
    /// across the Twitch network call.
    pub async fn extract(
        &self,
        ctx: &ExtractContext<'_>,
        raw_html: &str,
        url: &Url,
        uri: &str,
    ) -> Result<Link, PreviewError> {
        match self {
            Specialization::Twitch => twitch::extract(ctx, url, uri).await,
            _ => {
                let doc = Html::parse_document(raw_html);
                self.extract_document(&doc, url, uri)
            }
        }
    }

    /// Produce a Link from an already parsed document.
    pub fn extract_document(&self, doc: &Html, url: &Url, uri: &str) -> Result<Link, PreviewError> {
        match self {
            Specialization::Reddit => reddit::extract(doc, url, uri),
            Specialization::YouTube => youtube::extract(doc, url, uri),
            Specialization::Custom(parser) => parser.parse(doc, url, uri),
            // Twitch never reads the document; `extract` routes it before parsing.
            Specialization::Generic | Specialization::Twitch => {
                Ok(generic::primitive(doc, url, uri))
            }
        }
    }
}

impl fmt::Debug for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Specialization::Generic => "Generic",
            Specialization::Reddit => "Reddit",
            Specialization::YouTube => "YouTube",
            Specialization::Twitch => "Twitch",
            Specialization::Custom(_) => "Custom(..)",
        };
        f.write_str(name)
    }
}
