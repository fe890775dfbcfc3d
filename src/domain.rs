/// Hostname helpers and whitelist matching for the RAM saver
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("static regex"));
static PATH_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/.*$").expect("static regex"));

/// Pages the browser or other extensions own; the sweeper never closes these
const INTERNAL_PREFIXES: [&str; 5] = [
    "chrome://",
    "chrome-extension://",
    "edge://",
    "devtools://",
    "about:",
];

/// Lowercased hostname of a URL, or None when it does not parse or has no host
pub fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_lowercase())
}

/// Check whether a URL's host is covered by the whitelist
///
/// Match rule: the hostname equals a whitelist entry, or ends with
/// "." followed by the entry (any depth of subdomain). Entries are
/// trimmed and lowercased here, so stored values don't have to be.
/// An unparseable URL is never whitelisted.
///
/// Examples with whitelist ["example.com"]:
/// - https://example.com/page → true
/// - https://sub.example.com → true
/// - https://notexample.com → false
pub fn is_whitelisted(url: &str, whitelist: &[String]) -> bool {
    if url.is_empty() || whitelist.is_empty() {
        return false;
    }

    let Some(host) = hostname(url) else {
        return false;
    };

    whitelist
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .any(|entry| host == entry || host.ends_with(&format!(".{}", entry)))
}

/// Normalize user input into a whitelist entry
///
/// "HTTPS://Docs.Example.com/some/path" → "docs.example.com"
pub fn normalize_domain(input: &str) -> Option<String> {
    let lowered = input.trim().to_lowercase();
    let without_scheme = SCHEME_PREFIX.replace(&lowered, "");
    let domain = PATH_SUFFIX.replace(&without_scheme, "");

    if domain.is_empty() {
        None
    } else {
        Some(domain.into_owned())
    }
}

pub fn is_internal_url(url: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_exact_host_match() {
        let whitelist = list(&["example.com"]);
        assert!(is_whitelisted("https://example.com", &whitelist));
        assert!(is_whitelisted("https://example.com/path?q=1", &whitelist));
        assert!(is_whitelisted("http://example.com:8080/", &whitelist));
    }

    #[test]
    fn test_subdomain_match() {
        let whitelist = list(&["example.com"]);
        assert!(is_whitelisted("https://sub.example.com", &whitelist));
        assert!(is_whitelisted("https://a.b.example.com/x", &whitelist));
    }

    #[test]
    fn test_suffix_without_dot_does_not_match() {
        let whitelist = list(&["example.com"]);
        assert!(!is_whitelisted("https://notexample.com", &whitelist));
        assert!(!is_whitelisted("https://example.com.evil.org", &whitelist));
    }

    #[test]
    fn test_entries_normalized_at_check_time() {
        let whitelist = list(&["  GitHub.COM "]);
        assert!(is_whitelisted("https://GITHUB.com/rust-lang", &whitelist));
        assert!(is_whitelisted("https://gist.github.com", &whitelist));
    }

    #[test]
    fn test_parse_failure_is_not_whitelisted() {
        let whitelist = list(&["example.com"]);
        assert!(!is_whitelisted("not a url", &whitelist));
        assert!(!is_whitelisted("", &whitelist));
        assert!(!is_whitelisted("example.com", &whitelist));
    }

    #[test]
    fn test_empty_whitelist_and_entries() {
        assert!(!is_whitelisted("https://example.com", &[]));
        assert!(!is_whitelisted("https://example.com", &list(&["", "   "])));
    }

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("https://News.BBC.co.uk/article"), Some("news.bbc.co.uk".to_string()));
        assert_eq!(hostname("http://127.0.0.1:8080"), Some("127.0.0.1".to_string()));
        assert_eq!(hostname("garbage"), None);
        assert_eq!(hostname("about:blank"), None);
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://Docs.Example.com/some/path"), Some("docs.example.com".to_string()));
        assert_eq!(normalize_domain("  example.com  "), Some("example.com".to_string()));
        assert_eq!(normalize_domain("http://example.com/"), Some("example.com".to_string()));
        assert_eq!(normalize_domain("   "), None);
        assert_eq!(normalize_domain("https://"), None);
    }

    #[test]
    fn test_internal_urls() {
        assert!(is_internal_url("chrome://settings"));
        assert!(is_internal_url("chrome-extension://abc/newtab.html"));
        assert!(is_internal_url("about:blank"));
        assert!(!is_internal_url("https://chrome.google.com"));
    }
}
