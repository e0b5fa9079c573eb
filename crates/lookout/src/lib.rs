// ABOUTME: Main library entry point for the Lookout link preview engine.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Link, PreviewError, ErrorCode, Specialization, ParserRegistry.

//! Lookout - link previews for arbitrary URLs.
//!
//! This crate fetches a URL and extracts the metadata a chat or social client needs to
//! render a preview card: title, description, favicon, image, and site-specific extras
//! for Reddit, YouTube and Twitch. Callers can register their own parsers per host.
//!
//! # Example
//!
//! ```no_run
//! use lookout::{Client, PreviewError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PreviewError> {
//!     let client = Client::builder().build();
//!     let link = client.get("https://example.com/article").await?;
//!     println!("{}", link.format_markdown());
//!     Ok(())
//! }
//! ```

pub mod canonical;
pub mod client;
pub mod error;
pub mod extractors;
pub mod link;
pub mod options;
pub mod resource;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, PreviewError};
pub use crate::extractors::generic::primitive;
pub use crate::extractors::registry::ParserRegistry;
pub use crate::extractors::{LinkParser, Specialization};
pub use crate::link::{Link, IS_IMAGE_LINK, IS_VIDEO_LINK};
pub use crate::options::{ClientBuilder, Options, Settings};
pub use tokio_util::sync::CancellationToken;
