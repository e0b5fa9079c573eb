// ABOUTME: Reddit specialization: generic fields plus vote counts read from old.reddit.com markup.
// ABOUTME: Derives a Percentage extra from the dislike/like counts.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::error::PreviewError;
use crate::extractors::fields::{first_text, selector};
use crate::extractors::generic::primitive;
use crate::link::Link;

static DISLIKES: Lazy<Selector> = Lazy::new(|| selector(".unvoted > .dislikes"));
static LIKES: Lazy<Selector> = Lazy::new(|| selector(".unvoted > .likes"));
static SCORE: Lazy<Selector> = Lazy::new(|| selector(".unvoted > .unvoted"));

/// Extract a Reddit post preview.
///
/// Vote counts are copied verbatim into `Dislikes`, `Likes` and `Score`. When all three
/// are present a `Percentage` is derived; a count that is not an integer fails the call.
pub fn extract(doc: &Html, url: &Url, uri: &str) -> Result<Link, PreviewError> {
    let mut link = primitive(doc, url, uri);

    let dislikes = first_text(doc, &DISLIKES);
    let likes = first_text(doc, &LIKES);
    let score = first_text(doc, &SCORE);

    if !dislikes.is_empty() && !likes.is_empty() && !score.is_empty() {
        let percentage = vote_percentage(&score, &dislikes, &likes)
            .map_err(|e| PreviewError::parse(uri, "Reddit", Some(e)))?;
        link.set_extra("Percentage", percentage.to_string());
    }

    link.set_extra("Dislikes", dislikes);
    link.set_extra("Likes", likes);
    link.set_extra("Score", score);
    link.set_extra("IsRedditLink", "true");
    Ok(link)
}

/// Compute the Percentage extra.
///
/// A zero score yields 0. Otherwise this is `round(100 * dislikes / likes)`, with an
/// exact 0 promoted to 100.
fn vote_percentage(score: &str, dislikes: &str, likes: &str) -> anyhow::Result<i64> {
    let score: i64 = score.parse()?;
    if score == 0 {
        return Ok(0);
    }

    let dislikes: i64 = dislikes.parse()?;
    let likes: i64 = likes.parse()?;
    if likes == 0 {
        anyhow::bail!("cannot derive a percentage from zero likes");
    }

    let percentage = (100.0 * dislikes as f64 / likes as f64).round() as i64;
    if percentage == 0 {
        Ok(100)
    } else {
        Ok(percentage)
    }
}
