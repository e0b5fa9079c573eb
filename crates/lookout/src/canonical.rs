// ABOUTME: Canonical URL rewriting applied before a page is fetched.
// ABOUTME: Maps Reddit and YouTube alias hosts onto the hosts their specializations read best.

use url::Url;

use crate::extractors::registry::ParserRegistry;

/// The URL that will actually be fetched, and the string recorded as the Link's URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    pub target: Url,
    pub uri: String,
}

/// Rewrite alias hosts to their canonical form.
///
/// Each rule only applies while the built-in specialization for its host has not been
/// overridden:
/// - `*.reddit.com` and `reddit.com` become `old.reddit.com`, whose markup carries vote counts.
/// - `youtu.be/<id>` becomes `https://youtube.com/watch?v=<id>`, keeping any query.
///   The rewritten URL also becomes the URI so short and long links preview identically.
/// - `*.youtube.com` becomes `youtube.com`.
///
/// Subdomain matches require a dot boundary, so look-alike hosts such as
/// `notreddit.com` are not rewritten.
pub fn canonicalize(url: &Url, uri: &str, registry: &ParserRegistry) -> Canonical {
    let unchanged = || Canonical {
        target: url.clone(),
        uri: uri.to_string(),
    };
    let Some(host) = url.host_str() else {
        return unchanged();
    };

    if is_subdomain_of(host, "reddit.com")
        && host != "old.reddit.com"
        && !registry.has_overridden("reddit.com")
    {
        return rehost(url, uri, "old.reddit.com").unwrap_or_else(unchanged);
    }

    if host == "youtu.be" && !registry.has_overridden("youtu.be") {
        return expand_short_link(url).unwrap_or_else(unchanged);
    }

    if host != "youtube.com"
        && is_subdomain_of(host, "youtube.com")
        && !registry.has_overridden("youtube.com")
    {
        return rehost(url, uri, "youtube.com").unwrap_or_else(unchanged);
    }

    unchanged()
}

fn is_subdomain_of(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn rehost(url: &Url, uri: &str, host: &str) -> Option<Canonical> {
    let mut target = url.clone();
    target.set_host(Some(host)).ok()?;
    tracing::debug!(from = %url, to = %target, "rewrote alias host");
    Some(Canonical {
        target,
        uri: uri.to_string(),
    })
}

fn expand_short_link(url: &Url) -> Option<Canonical> {
    let id = url.path_segments()?.find(|s| !s.is_empty())?;
    let mut raw = format!("https://youtube.com/watch?v={}", id);
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        raw.push('&');
        raw.push_str(query);
    }
    let target = Url::parse(&raw).ok()?;
    tracing::debug!(from = %url, to = %target, "expanded short link");
    Some(Canonical {
        uri: target.to_string(),
        target,
    })
}
