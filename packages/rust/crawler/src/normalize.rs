//! URL canonicalization for frontier deduplication.
//!
//! These work on plain strings: the visited set compares the spelling a site
//! actually uses, not a re-serialized [`Url`].

use url::Url;

/// Canonical form of `url` used as the visited-set key.
///
/// Drops the fragment, a single trailing `/`, and a trailing `.html`, so
/// `/docs/intro`, `/docs/intro/`, `/docs/intro.html` and `/docs/intro#setup`
/// all compare equal.
pub fn normalize(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_slash = without_fragment
        .strip_suffix('/')
        .unwrap_or(without_fragment);
    without_slash
        .strip_suffix(".html")
        .unwrap_or(without_slash)
        .to_string()
}

/// Everything before the first `?`.
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// The `host[:port]` part of `url`, or `None` when it does not parse.
pub fn network_location(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
