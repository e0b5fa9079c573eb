// ABOUTME: Error types for link previews including the ErrorCode enum and PreviewError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the different ways a preview can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    NoResponse,
    PageNotAccessible,
    PageContentNotValid,
    UnsupportedContent,
    HostAlreadyRegistered,
    EmptyValue,
    Parse,
    Cancelled,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::NoResponse => "no response from page",
            ErrorCode::PageNotAccessible => "page not accessible",
            ErrorCode::PageContentNotValid => "page content not valid",
            ErrorCode::UnsupportedContent => "unsupported content type",
            ErrorCode::HostAlreadyRegistered => "host already has a registered parser",
            ErrorCode::EmptyValue => "value must not be empty",
            ErrorCode::Parse => "parse error",
            ErrorCode::Cancelled => "request cancelled",
        };
        write!(f, "{}", s)
    }
}

/// The error type returned by every fallible preview operation.
#[derive(Debug, thiserror::Error)]
pub struct PreviewError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lookout: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl PreviewError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a NoResponse error (transport failure or timeout).
    pub fn no_response(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::NoResponse, url, op, source)
    }

    /// Create a PageNotAccessible error.
    pub fn not_accessible(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::PageNotAccessible, url, op, source)
    }

    /// Create a PageContentNotValid error.
    pub fn content_not_valid(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::PageContentNotValid, url, op, source)
    }

    /// Create an UnsupportedContent error.
    pub fn unsupported_content(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::UnsupportedContent, url, op, source)
    }

    /// Create a HostAlreadyRegistered error. The host takes the place of the url.
    pub fn host_already_registered(host: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::HostAlreadyRegistered, host, "Register", None)
    }

    /// Create an EmptyValue error for a configuration setter.
    pub fn empty_value(op: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::EmptyValue, String::new(), op, None)
    }

    /// Create a Parse error.
    pub fn parse(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Parse, url, op, source)
    }

    /// Create a Cancelled error.
    pub fn cancelled(url: impl Into<String>, op: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::Cancelled, url, op, None)
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a NoResponse error.
    pub fn is_no_response(&self) -> bool {
        self.code == ErrorCode::NoResponse
    }

    /// Returns true if this is a PageNotAccessible error.
    pub fn is_not_accessible(&self) -> bool {
        self.code == ErrorCode::PageNotAccessible
    }

    /// Returns true if this is a PageContentNotValid error.
    pub fn is_content_not_valid(&self) -> bool {
        self.code == ErrorCode::PageContentNotValid
    }

    /// Returns true if this is an UnsupportedContent error.
    pub fn is_unsupported_content(&self) -> bool {
        self.code == ErrorCode::UnsupportedContent
    }

    /// Returns true if this is a HostAlreadyRegistered error.
    pub fn is_host_already_registered(&self) -> bool {
        self.code == ErrorCode::HostAlreadyRegistered
    }

    /// Returns true if this is an EmptyValue error.
    pub fn is_empty_value(&self) -> bool {
        self.code == ErrorCode::EmptyValue
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is a Cancelled error.
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }
}
