//! URL helpers for the hot path
//!
//! These functions avoid allocations and work directly on string slices.

use std::borrow::Cow;

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();

    let colon_pos = bytes.iter().position(|&b| b == b':')?;

    if bytes.len() > colon_pos + 2 && bytes[colon_pos + 1] == b'/' && bytes[colon_pos + 2] == b'/' {
        return Some(colon_pos + 3);
    }

    None
}

/// Get the start and end positions of the hostname in a URL.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Skip userinfo
    let mut host_start = scheme_end;
    for (i, &b) in bytes.iter().enumerate().skip(scheme_end) {
        if b == b'@' {
            host_start = i + 1;
            break;
        }
        if b == b'/' || b == b'?' || b == b'#' {
            break;
        }
    }

    let mut host_end = bytes.len();
    for (i, &b) in bytes.iter().enumerate().skip(host_start) {
        if b == b'/' || b == b'?' || b == b'#' || b == b':' {
            host_end = i;
            break;
        }
    }

    if host_end == host_start {
        return None;
    }

    Some((host_start, host_end))
}

/// Host extraction without allocations.
/// Returns a slice into the original URL.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    Some(&url[host_start..host_end])
}

/// Slices of `url` starting at each host suffix.
///
/// For `http://ads.example.com/x` and suffixes `["ads.example.com",
/// "example.com", ""]` this yields `["ads.example.com/x", "example.com/x"]`.
/// Empty suffixes are skipped. Returns an empty list when `host` is not the
/// URL's host, so domain-anchored rules cannot match a malformed request.
/// Trailing dots on either host are ignored; pass a [`canonical_url`] so the
/// views do not carry them.
pub fn url_from_suffixes<'u>(url: &'u str, host: &str, suffixes: &[&str]) -> Vec<&'u str> {
    let (host_start, host_end) = match get_host_position(url) {
        Some(pos) => pos,
        None => return Vec::new(),
    };
    let url_host = url[host_start..host_end].trim_end_matches('.');
    let host = host.trim_end_matches('.');
    if !url_host.eq_ignore_ascii_case(host) {
        return Vec::new();
    }
    let host_end = host_start + url_host.len();

    suffixes
        .iter()
        .map(|suffix| suffix.trim_end_matches('.'))
        .filter(|suffix| !suffix.is_empty() && suffix.len() <= host.len())
        .filter_map(|suffix| url.get(host_end - suffix.len()..))
        .collect()
}

/// `url` with trailing dots removed from its host.
///
/// `http://ads.example.com./x` becomes `http://ads.example.com/x`; URLs
/// without a fully-qualified host are returned as they are.
pub fn canonical_url(url: &str) -> Cow<'_, str> {
    let (host_start, host_end) = match get_host_position(url) {
        Some(pos) => pos,
        None => return Cow::Borrowed(url),
    };
    let trimmed_end = host_start + url[host_start..host_end].trim_end_matches('.').len();
    if trimmed_end == host_end {
        return Cow::Borrowed(url);
    }

    let mut canonical = String::with_capacity(url.len());
    canonical.push_str(&url[..trimmed_end]);
    canonical.push_str(&url[host_end..]);
    Cow::Owned(canonical)
}
