// ABOUTME: The main Client that canonicalizes a URL, fetches it, and dispatches to a specialization.
// ABOUTME: Provides async get(), get_with_cancel() and parse_html() plus registry and settings access.

use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::canonical::{canonicalize, Canonical};
use crate::error::PreviewError;
use crate::extractors::fields::host_key;
use crate::extractors::registry::ParserRegistry;
use crate::extractors::{ExtractContext, Specialization};
use crate::link::{Link, IS_IMAGE_LINK, IS_VIDEO_LINK};
use crate::options::{ClientBuilder, Options, Settings};
use crate::resource::{fetch, FetchOptions, ResourceKind};

/// The link preview client.
///
/// Cloning is cheap: clones share the HTTP connection pool, the parser registry and
/// the request settings.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Arc<Options>,
    http_client: reqwest::Client,
    registry: Arc<ParserRegistry>,
    settings: Arc<RwLock<Settings>>,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts
            .http_client
            .clone()
            .unwrap_or_else(|| build_http_client(&opts));
        let registry = opts
            .registry
            .clone()
            .unwrap_or_else(|| Arc::new(ParserRegistry::builtin()));
        let settings = Arc::new(RwLock::new(opts.settings.clone()));

        Self {
            opts: Arc::new(opts),
            http_client,
            registry,
            settings,
        }
    }

    /// Build a preview for a URL.
    pub async fn get(&self, url: &str) -> Result<Link, PreviewError> {
        self.resolve(url).await
    }

    /// Build a preview for a URL, giving up with `Cancelled` once the token fires.
    ///
    /// Cancellation abandons whichever network call is in flight, the page fetch or
    /// the Twitch query.
    pub async fn get_with_cancel(
        &self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<Link, PreviewError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(url, "preview cancelled");
                Err(PreviewError::cancelled(url, "Get"))
            }
            result = self.resolve(url) => result,
        }
    }

    /// Build a preview from HTML the caller already has.
    ///
    /// Canonicalization and registry resolution run as for [`Client::get`]; only the page
    /// fetch is skipped.
    pub async fn parse_html(&self, html: &str, url: &str) -> Result<Link, PreviewError> {
        let original = parse_target(url, "ParseHTML")?;
        if html.trim().is_empty() {
            return Err(PreviewError::content_not_valid(
                url,
                "ParseHTML",
                Some(anyhow::anyhow!("empty HTML")),
            ));
        }

        let canonical = canonicalize(&original, url.trim(), &self.registry);
        self.extract(&canonical, &original, html).await
    }

    async fn resolve(&self, raw: &str) -> Result<Link, PreviewError> {
        let original = parse_target(raw, "Get")?;
        let canonical = canonicalize(&original, raw.trim(), &self.registry);

        let settings = self.settings();
        let fetch_opts = FetchOptions {
            request_language: settings.request_language,
            user_agent: settings.user_agent,
            headers: self.opts.headers.clone(),
            max_content_length: self.opts.max_content_length,
        };
        let resource = fetch(&self.http_client, &canonical.target, &fetch_opts).await?;

        match resource.kind() {
            ResourceKind::Image => Ok(media_link(&canonical, IS_IMAGE_LINK)),
            ResourceKind::Video => Ok(media_link(&canonical, IS_VIDEO_LINK)),
            ResourceKind::Unsupported => Err(PreviewError::unsupported_content(
                raw,
                "Get",
                Some(anyhow::anyhow!(
                    "content type {:?}",
                    resource.content_type.as_deref().unwrap_or("")
                )),
            )),
            ResourceKind::Html => {
                let html = resource.text().await?;
                self.extract(&canonical, &original, &html).await
            }
        }
    }

    /// Resolve the specialization for a page and run it.
    async fn extract(
        &self,
        canonical: &Canonical,
        original: &Url,
        html: &str,
    ) -> Result<Link, PreviewError> {
        let (spec, url) = self.specialization_for(canonical, original);
        tracing::debug!(url = %url, parser = spec.name(), "resolved specialization");

        let ctx = ExtractContext {
            http_client: &self.http_client,
            settings: self.settings(),
            twitch_endpoint: &self.opts.twitch_endpoint,
        };
        spec.extract(&ctx, html, &url, &canonical.uri)
            .await
            .inspect_err(|e| {
                tracing::warn!(url = %url, parser = spec.name(), error = %e, "extraction failed");
            })
    }

    /// Canonical host first, then the host the caller asked for, then the generic extractor.
    fn specialization_for(&self, canonical: &Canonical, original: &Url) -> (Specialization, Url) {
        let canonical_host = host_key(&canonical.target);
        if let Some(spec) = self.registry.lookup(&canonical_host) {
            return (spec, canonical.target.clone());
        }

        let original_host = host_key(original);
        if original_host != canonical_host {
            if let Some(spec) = self.registry.lookup(&original_host) {
                return (spec, original.clone());
            }
        }

        (Specialization::Generic, canonical.target.clone())
    }

    /// Registers a specialization for a host that is not yet claimed.
    pub fn register(&self, host: &str, spec: Specialization) -> Result<(), PreviewError> {
        self.registry.register(host, spec)
    }

    /// Replaces whatever is registered for the host.
    pub fn force_register(&self, host: &str, spec: Specialization) {
        self.registry.force_register(host, spec)
    }

    /// Removes the parser registered for the host, if any.
    pub fn unregister(&self, host: &str) {
        self.registry.unregister(host)
    }

    /// Returns true if a built-in host's parser was replaced.
    pub fn has_overridden(&self, host: &str) -> bool {
        self.registry.has_overridden(host)
    }

    /// The registry shared by this client and its clones.
    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    /// Set the Accept-Language sent from the next request on.
    pub fn set_request_language(&self, lang: &str) -> Result<(), PreviewError> {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_request_language(lang)
    }

    /// Set the User-Agent sent from the next page request on.
    pub fn set_user_agent(&self, agent: &str) -> Result<(), PreviewError> {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_user_agent(agent)
    }

    /// The current Accept-Language value.
    pub fn request_language(&self) -> String {
        self.settings().request_language
    }

    /// The current User-Agent value.
    pub fn user_agent(&self) -> String {
        self.settings().user_agent
    }

    fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn build_http_client(opts: &Options) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(opts.timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to a default HTTP client");
            reqwest::Client::new()
        })
}

/// Parse and validate a caller-supplied URL: http(s) with a host.
fn parse_target(raw: &str, op: &str) -> Result<Url, PreviewError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PreviewError::invalid_url(raw, op, None));
    }

    let url = Url::parse(trimmed).map_err(|e| {
        PreviewError::invalid_url(raw, op, Some(anyhow::anyhow!("malformed URL: {}", e)))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(PreviewError::invalid_url(
            raw,
            op,
            Some(anyhow::anyhow!("unsupported scheme {:?}", url.scheme())),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(PreviewError::invalid_url(
            raw,
            op,
            Some(anyhow::anyhow!("missing host")),
        ));
    }
    Ok(url)
}

fn media_link(canonical: &Canonical, flag: &str) -> Link {
    let mut link = Link::new(host_key(&canonical.target), canonical.uri.as_str());
    link.set_extra(flag, "true");
    link
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    #[test]
    fn parse_target_rejects_bad_input() {
        assert!(parse_target("", "Get").unwrap_err().is_invalid_url());
        assert!(parse_target("not a url", "Get").unwrap_err().is_invalid_url());
        assert!(parse_target("ftp://example.com/file", "Get")
            .unwrap_err()
            .is_invalid_url());
        assert!(parse_target("mailto:someone@example.com", "Get")
            .unwrap_err()
            .is_invalid_url());
        assert_eq!(
            parse_target("  https://example.com/a  ", "Get").unwrap().as_str(),
            "https://example.com/a"
        );
    }

    #[tokio::test]
    async fn get_rejects_invalid_url_without_fetching() {
        let client = Client::builder().build();
        let err = client.get("::nonsense::").await.unwrap_err();
        assert!(err.is_invalid_url());
        assert_eq!(err.op, "Get");
    }

    #[test]
    fn settings_setters_apply_and_reject_empty() {
        let client = Client::builder().build();
        assert_eq!(client.request_language(), "en-US,en;q=0.5");

        client.set_request_language("fr-FR").unwrap();
        client.set_user_agent("PreviewBot/1.0").unwrap();
        assert_eq!(client.request_language(), "fr-FR");
        assert_eq!(client.user_agent(), "PreviewBot/1.0");

        assert!(client.set_user_agent("").unwrap_err().is_empty_value());
        assert_eq!(client.user_agent(), "PreviewBot/1.0");

        assert!(client
            .set_request_language("fr\r\n")
            .unwrap_err()
            .is_empty_value());
        assert_eq!(client.request_language(), "fr-FR");
    }

    #[test]
    fn clones_share_settings_and_registry() {
        let client = Client::builder().build();
        let clone = client.clone();
        clone.set_request_language("de").unwrap();
        clone.force_register("example.com", Specialization::Reddit);
        assert_eq!(client.request_language(), "de");
        assert!(client.registry().lookup("example.com").is_some());
    }

    #[test]
    fn specialization_prefers_canonical_host() {
        let client = Client::builder().build();
        let original = Url::parse("https://www.reddit.com/r/rust").unwrap();
        let canonical = canonicalize(&original, original.as_str(), client.registry());

        let (spec, url) = client.specialization_for(&canonical, &original);
        assert_eq!(spec.name(), "reddit");
        assert_eq!(url.host_str(), Some("old.reddit.com"));
    }

    #[test]
    fn specialization_falls_back_to_original_host() {
        let client = Client::builder().build();
        client.unregister("youtube.com");
        let original = Url::parse("https://youtu.be/abc").unwrap();
        let canonical = canonicalize(&original, original.as_str(), client.registry());

        let (spec, url) = client.specialization_for(&canonical, &original);
        assert_eq!(spec.name(), "youtube");
        assert_eq!(url.as_str(), "https://youtu.be/abc");
    }

    #[test]
    fn specialization_defaults_to_generic() {
        let client = Client::builder().build();
        let original = Url::parse("https://example.com/").unwrap();
        let canonical = canonicalize(&original, original.as_str(), client.registry());
        let (spec, _) = client.specialization_for(&canonical, &original);
        assert_eq!(spec.name(), "generic");
    }

    #[tokio::test]
    async fn parse_html_uses_generic_extractor() {
        let client = Client::builder().build();
        let html = r#"<html><head><title>Example</title>
            <meta name="description" content="An example page"></head></html>"#;
        let link = client
            .parse_html(html, "https://example.com/page")
            .await
            .unwrap();
        assert_eq!(link.title, "Example");
        assert_eq!(link.description, "An example page");
        assert_eq!(link.host, "example.com");
        assert_eq!(link.uri, "https://example.com/page");
    }

    #[tokio::test]
    async fn parse_html_rejects_empty_document() {
        let client = Client::builder().build();
        let err = client
            .parse_html("  ", "https://example.com/")
            .await
            .unwrap_err();
        assert!(err.is_content_not_valid());
    }

    #[tokio::test]
    async fn custom_parser_receives_original_uri() {
        let client = Client::builder().build();
        client
            .register(
                "example.com",
                Specialization::custom(
                    |doc: &Html, url: &Url, uri: &str| -> Result<Link, PreviewError> {
                        let mut link = crate::extractors::generic::primitive(doc, url, uri);
                        link.set_extra("Custom", "yes");
                        Ok(link)
                    },
                ),
            )
            .unwrap();

        let link = client
            .parse_html("<title>Hi</title>", "https://example.com/x")
            .await
            .unwrap();
        assert_eq!(link.title, "Hi");
        assert_eq!(link.extra("Custom"), Some("yes"));
        assert_eq!(link.uri, "https://example.com/x");
    }
}
