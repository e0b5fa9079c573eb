// ABOUTME: Resource fetching for link previews: one bounded GET with configurable headers.
// ABOUTME: Classifies responses by declared content type and decodes HTML bodies with charset detection.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use url::Url;

use crate::error::PreviewError;

/// Default maximum allowed body length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Options for fetching a resource.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub request_language: String,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub max_content_length: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            request_language: String::new(),
            user_agent: String::new(),
            headers: HashMap::new(),
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }
}

/// What kind of resource a response carries, judged by its declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Html,
    Image,
    Video,
    Unsupported,
}

impl ResourceKind {
    /// Classify a (lowercased) Content-Type header value.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let ct = content_type.unwrap_or("").trim_start();
        if ct.starts_with("text/html") {
            ResourceKind::Html
        } else if ct.starts_with("image/") {
            ResourceKind::Image
        } else if ct.starts_with("video/") {
            ResourceKind::Video
        } else {
            ResourceKind::Unsupported
        }
    }
}

/// A response whose status was accepted. The body has not been read yet.
#[derive(Debug)]
pub struct FetchedResource {
    pub status: u16,
    pub url: String,
    pub content_type: Option<String>,
    max_content_length: usize,
    response: reqwest::Response,
}

impl FetchedResource {
    /// Classify this resource by its declared content type.
    pub fn kind(&self) -> ResourceKind {
        ResourceKind::from_content_type(self.content_type.as_deref())
    }

    /// Read the full body, enforcing the content length ceiling.
    pub async fn bytes(self) -> Result<Bytes, PreviewError> {
        let url = self.url;
        if let Some(len) = self.response.content_length() {
            if len as usize > self.max_content_length {
                return Err(PreviewError::content_not_valid(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large")),
                ));
            }
        }

        let body = self.response.bytes().await.map_err(|e| {
            PreviewError::content_not_valid(
                url.as_str(),
                "Fetch",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        })?;

        if body.len() > self.max_content_length {
            return Err(PreviewError::content_not_valid(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
        Ok(body)
    }

    /// Read the body and decode it as text, using the charset hint from the content type.
    pub async fn text(self) -> Result<String, PreviewError> {
        let content_type = self.content_type.clone();
        let body = self.bytes().await?;
        Ok(decode_body(&body, content_type.as_deref()))
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub(crate) fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Returns true for statuses a preview may be built from: any 2xx, or 304.
fn is_accepted_status(status: reqwest::StatusCode) -> bool {
    status.is_success() || status == reqwest::StatusCode::NOT_MODIFIED
}

/// Fetch a resource with exactly one GET attempt.
///
/// The timeout ceiling comes from the `reqwest::Client`. Transport failures map to
/// `NoResponse`; statuses other than 2xx/304 map to `PageNotAccessible`.
pub async fn fetch(
    client: &reqwest::Client,
    url: &Url,
    opts: &FetchOptions,
) -> Result<FetchedResource, PreviewError> {
    let mut request = client
        .get(url.as_str())
        .header(ACCEPT_LANGUAGE, &opts.request_language)
        .header(USER_AGENT, &opts.user_agent);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    let response = request.send().await.map_err(|e| {
        tracing::warn!(url = %url, error = %e, "fetch failed");
        PreviewError::no_response(
            url.as_str(),
            "Fetch",
            Some(anyhow::anyhow!("request failed: {}", e)),
        )
    })?;

    let status = response.status();
    if !is_accepted_status(status) {
        return Err(PreviewError::not_accessible(
            url.as_str(),
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    tracing::debug!(
        url = %url,
        status = status.as_u16(),
        content_type = content_type.as_deref().unwrap_or(""),
        "fetched resource"
    );

    Ok(FetchedResource {
        status: status.as_u16(),
        url: url.to_string(),
        content_type,
        max_content_length: opts.max_content_length,
        response,
    })
}
