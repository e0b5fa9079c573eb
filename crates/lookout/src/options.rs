// ABOUTME: Configuration for the preview client: Options, the shared request Settings, and ClientBuilder.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::client::Client;
use crate::error::PreviewError;
use crate::extractors::registry::ParserRegistry;
use crate::resource::MAX_CONTENT_LENGTH;

/// Default Accept-Language sent with every page request.
pub const DEFAULT_REQUEST_LANGUAGE: &str = "en-US,en;q=0.5";

/// Default GraphQL endpoint queried by the Twitch specialization.
pub const DEFAULT_TWITCH_ENDPOINT: &str = "https://gql.twitch.tv/gql";

/// Default timeout ceiling for each network call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default User-Agent sent with every page request.
pub fn default_user_agent() -> String {
    format!("Lookout Bot/{}", env!("CARGO_PKG_VERSION"))
}

/// Request settings that may change while the client is in use.
///
/// Every fetch reads a snapshot of these, so a setter call applies to the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub request_language: String,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_language: DEFAULT_REQUEST_LANGUAGE.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    /// Set the Accept-Language value. Empty values and values that cannot be sent as a
    /// header are rejected.
    pub fn set_request_language(&mut self, lang: &str) -> Result<(), PreviewError> {
        self.request_language = header_value(lang, "SetRequestLanguage")?;
        Ok(())
    }

    /// Set the User-Agent value. Empty values and values that cannot be sent as a
    /// header are rejected.
    pub fn set_user_agent(&mut self, agent: &str) -> Result<(), PreviewError> {
        self.user_agent = header_value(agent, "SetUserAgent")?;
        Ok(())
    }
}

fn header_value(value: &str, op: &str) -> Result<String, PreviewError> {
    if value.trim().is_empty() {
        return Err(PreviewError::empty_value(op));
    }
    HeaderValue::from_str(value).map_err(|e| {
        let mut err = PreviewError::empty_value(op);
        err.source = Some(anyhow::anyhow!("not a valid header value: {}", e));
        err
    })?;
    Ok(value.to_string())
}

/// Configuration options for the preview client.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub settings: Settings,
    pub headers: HashMap<String, String>,
    pub http_client: Option<reqwest::Client>,
    pub registry: Option<Arc<ParserRegistry>>,
    pub twitch_endpoint: String,
    pub max_content_length: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            settings: Settings::default(),
            headers: HashMap::new(),
            http_client: None,
            registry: None,
            twitch_endpoint: DEFAULT_TWITCH_ENDPOINT.to_string(),
            max_content_length: MAX_CONTENT_LENGTH,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the timeout ceiling for each network call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the initial Accept-Language header.
    ///
    /// Values the `Client` setter would reject keep the default and are logged.
    pub fn request_language(mut self, lang: impl Into<String>) -> Self {
        if let Err(e) = self.opts.settings.set_request_language(&lang.into()) {
            tracing::warn!(error = %e, "ignoring request language");
        }
        self
    }

    /// Set the initial User-Agent header.
    ///
    /// Values the `Client` setter would reject keep the default and are logged.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        if let Err(e) = self.opts.settings.set_user_agent(&user_agent.into()) {
            tracing::warn!(error = %e, "ignoring user agent");
        }
        self
    }

    /// Add a custom header to all page requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a custom HTTP client. Its own timeout takes precedence.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Share an existing parser registry instead of seeding a fresh built-in one.
    pub fn registry(mut self, registry: Arc<ParserRegistry>) -> Self {
        self.opts.registry = Some(registry);
        self
    }

    /// Point the Twitch specialization at a different GraphQL endpoint.
    pub fn twitch_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.opts.twitch_endpoint = endpoint.into();
        self
    }

    /// Set the maximum body length read from a page.
    pub fn max_content_length(mut self, len: usize) -> Self {
        self.opts.max_content_length = len;
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
