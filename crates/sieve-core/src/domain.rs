//! Domain utilities: base domain (eTLD+1) extraction and suffix walking
//!
//! Base domains are computed against a public suffix rule set with exact,
//! wildcard (`*.ck`) and exception (`!www.ck`) rules. An embedded subset of
//! the public suffix list is available through [`PublicSuffixList::builtin`];
//! a full list can be loaded with [`PublicSuffixList::parse`].
//!
//! # Examples
//!
//! ```
//! use sieve_core::domain::{PublicSuffixList, subdomain_suffixes};
//!
//! let psl = PublicSuffixList::builtin();
//! let base = psl.base_domain_of("a.b.example.co.uk").unwrap();
//! assert_eq!(base, "example.co.uk");
//! assert_eq!(
//!     subdomain_suffixes("a.b.example.co.uk", &base),
//!     vec!["a.b.example.co.uk", "b.example.co.uk", "example.co.uk", ""]
//! );
//! ```

use std::collections::HashSet;

/// Maximum number of entries returned by [`subdomain_suffixes`], including
/// the terminating empty marker.
pub const MAX_SUBDOMAINS: usize = 10;

const BUILTIN_RULES: &str = include_str!("../data/public_suffix_list.dat");

// =============================================================================
// Public Suffix List
// =============================================================================

/// Public suffix rule sets.
#[derive(Debug, Default, Clone)]
pub struct PublicSuffixList {
    /// Exact rules (e.g., "com", "co.uk")
    exact: HashSet<String>,
    /// Wildcard rules (e.g., "*.ck" stored as "ck")
    wildcard: HashSet<String>,
    /// Exception rules (e.g., "!www.ck" stored as "www.ck")
    exception: HashSet<String>,
}

impl PublicSuffixList {
    /// Parse rules in the public suffix list text format.
    ///
    /// Blank lines and `//` comments are skipped; only the first
    /// whitespace-separated token of a line is read.
    pub fn parse(text: &str) -> Self {
        let mut psl = Self::default();
        for line in text.lines() {
            let rule = match line.split_whitespace().next() {
                Some(rule) if !rule.starts_with("//") => rule.to_ascii_lowercase(),
                _ => continue,
            };

            if let Some(rest) = rule.strip_prefix('!') {
                psl.exception.insert(rest.to_string());
            } else if let Some(rest) = rule.strip_prefix("*.") {
                psl.wildcard.insert(rest.to_string());
            } else {
                psl.exact.insert(rule);
            }
        }
        psl
    }

    /// The embedded rule subset.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_RULES)
    }

    /// Number of rules across all three sets.
    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcard.len() + self.exception.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn is_exact(&self, suffix: &str) -> bool {
        self.exact.contains(suffix)
    }

    #[inline]
    fn is_wildcard(&self, suffix: &str) -> bool {
        self.wildcard.contains(suffix)
    }

    #[inline]
    fn is_exception(&self, suffix: &str) -> bool {
        self.exception.contains(suffix)
    }

    /// Get the base domain (registrable domain) of a host.
    ///
    /// Returns `None` for malformed hosts, IP addresses, hosts that are
    /// themselves public suffixes, and hosts under no known suffix.
    pub fn base_domain_of(&self, host: &str) -> Option<String> {
        let host = normalize_host(host)?;
        let labels: Vec<&str> = host.split('.').collect();
        let n = labels.len();

        // Longest suffix first, so "co.uk" wins over "uk".
        for i in 0..n {
            let suffix = labels[i..].join(".");

            // Exception rules override wildcards
            if self.is_exception(&suffix) {
                return Some(suffix);
            }

            let is_public = self.is_exact(&suffix)
                || (i + 1 < n && self.is_wildcard(&labels[i + 1..].join(".")));
            if is_public {
                return if i > 0 {
                    Some(labels[i - 1..].join("."))
                } else {
                    None
                };
            }
        }

        None
    }

    /// Check if a request is third-party relative to the top-level page.
    ///
    /// `None` when either base domain cannot be computed.
    pub fn is_third_party(&self, page_host: &str, request_host: &str) -> Option<bool> {
        let page = self.base_domain_of(page_host)?;
        let request = self.base_domain_of(request_host)?;
        Some(page != request)
    }
}

/// Lowercase a host and drop one trailing dot. Rejects empty labels,
/// characters outside `[a-z0-9-_]` and IP literals.
pub fn normalize_host(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() || host.len() > 253 {
        return None;
    }

    let valid_labels = host.split('.').all(|label| {
        !label.is_empty()
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    });
    if !valid_labels {
        return None;
    }

    if host.parse::<std::net::Ipv4Addr>().is_ok() {
        return None;
    }

    Some(host)
}

// =============================================================================
// Suffix Walking
// =============================================================================

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

/// Walk host suffixes from most specific to `base_domain`, followed by an
/// empty end marker.
///
/// At most [`MAX_SUBDOMAINS`] entries are produced; deeper hosts are cut
/// short before reaching the base domain. A host that does not end with
/// `base_domain` yields only itself.
pub fn subdomain_suffixes<'a>(host: &'a str, base_domain: &str) -> Vec<&'a str> {
    let mut suffixes = Vec::with_capacity(MAX_SUBDOMAINS);
    let mut current = host;
    suffixes.push(current);

    let is_suffix = host
        .len()
        .checked_sub(base_domain.len())
        .and_then(|start| host.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(base_domain));

    if is_suffix {
        while current.len() > base_domain.len() && suffixes.len() < MAX_SUBDOMAINS - 1 {
            match get_parent_domain(current) {
                Some(parent) if parent.len() >= base_domain.len() => {
                    current = parent;
                    suffixes.push(current);
                }
                _ => break,
            }
        }
    }

    suffixes.push("");
    suffixes
}

/// Check a domain restriction list against a host.
///
/// Entries prefixed with `~` exclude a domain. Suffixes of `host` are walked
/// from most to least specific down to `base_domain`: an excluded suffix
/// rejects, a listed suffix accepts. When no entry matches, the list accepts
/// only if it has no positive entries.
pub fn domain_matches<S: AsRef<str>>(domains: &[S], host: &str, base_domain: &str) -> bool {
    if host.is_empty() || base_domain.is_empty() {
        return false;
    }

    for suffix in subdomain_suffixes(host, base_domain) {
        if suffix.is_empty() {
            break;
        }
        for domain in domains {
            let domain = domain.as_ref();
            match domain.strip_prefix('~') {
                Some(excluded) if excluded.eq_ignore_ascii_case(suffix) => return false,
                None if domain.eq_ignore_ascii_case(suffix) => return true,
                _ => {}
            }
        }
    }

    domains.iter().all(|d| d.as_ref().starts_with('~'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_domain_simple() {
        let psl = PublicSuffixList::builtin();
        assert_eq!(psl.base_domain_of("example.com").as_deref(), Some("example.com"));
        assert_eq!(psl.base_domain_of("sub.example.com").as_deref(), Some("example.com"));
        assert_eq!(psl.base_domain_of("WWW.Example.COM.").as_deref(), Some("example.com"));
    }

    #[test]
    fn test_base_domain_two_part() {
        let psl = PublicSuffixList::builtin();
        assert_eq!(
            psl.base_domain_of("a.b.example.co.uk").as_deref(),
            Some("example.co.uk")
        );
        assert_eq!(psl.base_domain_of("example.co.uk").as_deref(), Some("example.co.uk"));
        assert_eq!(psl.base_domain_of("co.uk"), None);
    }

    #[test]
    fn test_wildcard_and_exception_rules() {
        let psl = PublicSuffixList::parse("// comment\n*.ck\n!www.ck\ncom\n");
        assert_eq!(psl.len(), 3);
        assert_eq!(psl.base_domain_of("foo.bar.ck").as_deref(), Some("foo.bar.ck"));
        assert_eq!(psl.base_domain_of("bar.ck"), None);
        assert_eq!(psl.base_domain_of("www.ck").as_deref(), Some("www.ck"));
        assert_eq!(psl.base_domain_of("a.www.ck").as_deref(), Some("www.ck"));
    }

    #[test]
    fn test_base_domain_rejects_malformed() {
        let psl = PublicSuffixList::builtin();
        assert_eq!(psl.base_domain_of(""), None);
        assert_eq!(psl.base_domain_of("localhost"), None);
        assert_eq!(psl.base_domain_of("a..example.com"), None);
        assert_eq!(psl.base_domain_of("192.168.0.1"), None);
        assert_eq!(psl.base_domain_of("ex/ample.com"), None);
        assert_eq!(psl.base_domain_of("example.notarealtld"), None);
    }

    #[test]
    fn test_is_third_party() {
        let psl = PublicSuffixList::builtin();
        assert_eq!(psl.is_third_party("www.example.com", "cdn.example.com"), Some(false));
        assert_eq!(psl.is_third_party("www.example.com", "ads.tracker.net"), Some(true));
        assert_eq!(psl.is_third_party("localhost", "ads.tracker.net"), None);
    }

    #[test]
    fn test_get_parent_domain() {
        assert_eq!(get_parent_domain("sub.example.com"), Some("example.com"));
        assert_eq!(get_parent_domain("example.com"), Some("com"));
        assert_eq!(get_parent_domain("com"), None);
        assert_eq!(get_parent_domain(""), None);
    }

    #[test]
    fn test_subdomain_suffixes() {
        assert_eq!(
            subdomain_suffixes("a.b.example.co.uk", "example.co.uk"),
            vec!["a.b.example.co.uk", "b.example.co.uk", "example.co.uk", ""]
        );
        assert_eq!(subdomain_suffixes("example.com", "example.com"), vec!["example.com", ""]);
        assert_eq!(subdomain_suffixes("example.com", "other.org"), vec!["example.com", ""]);
    }

    #[test]
    fn test_subdomain_suffixes_mismatched_non_ascii_host() {
        assert_eq!(subdomain_suffixes("ä.com", "x.com"), vec!["ä.com", ""]);
        assert!(!domain_matches(&["x.com"], "ä.com", "x.com"));
    }

    #[test]
    fn test_subdomain_suffixes_are_bounded() {
        let host = "l1.l2.l3.l4.l5.l6.l7.l8.l9.l10.l11.example.com";
        let suffixes = subdomain_suffixes(host, "example.com");
        assert_eq!(suffixes.len(), MAX_SUBDOMAINS);
        assert_eq!(suffixes[0], host);
        assert_eq!(suffixes[MAX_SUBDOMAINS - 1], "");
        assert!(!suffixes.contains(&"example.com"));
    }

    #[test]
    fn test_domain_matches() {
        let domains = ["example.com", "~ads.example.com"];
        assert!(domain_matches(&domains, "www.example.com", "example.com"));
        assert!(domain_matches(&domains, "example.com", "example.com"));
        assert!(!domain_matches(&domains, "x.ads.example.com", "example.com"));
        assert!(!domain_matches(&domains, "other.org", "other.org"));

        // Suffix, not substring
        assert!(!domain_matches(&["example.com"], "notexample.com", "notexample.com"));
    }

    #[test]
    fn test_domain_matches_exclusions_only() {
        let domains = ["~example.com"];
        assert!(!domain_matches(&domains, "www.example.com", "example.com"));
        assert!(domain_matches(&domains, "other.org", "other.org"));
    }
}
