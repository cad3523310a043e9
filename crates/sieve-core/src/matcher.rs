//! Core Matching Engine
//!
//! Every outgoing request goes through here. Exceptions are evaluated as a
//! separate pass before block rules; the first admitting rule in store
//! order wins.

use std::borrow::Cow;

use crate::domain::{normalize_host, subdomain_suffixes};
use crate::rules::{NetworkRule, RuleStore};
use crate::types::{MatchDecision, MatchResult, RequestContext, RuleList};
use crate::url::{canonical_url, url_from_suffixes};

// =============================================================================
// Matcher
// =============================================================================

/// The core matching engine.
pub struct Matcher<'a> {
    store: &'a RuleStore,
}

impl<'a> Matcher<'a> {
    /// Create a new matcher over a compiled store.
    pub fn new(store: &'a RuleStore) -> Self {
        Self { store }
    }

    /// Match a request and return the decision.
    ///
    /// A request whose host or base domain does not normalize is allowed.
    pub fn match_request(&self, ctx: &RequestContext<'_>) -> MatchResult {
        let request = match CanonicalRequest::new(ctx) {
            Some(request) => request,
            None => return MatchResult::default(),
        };
        let ctx = request.context(ctx);

        // Shared between both passes
        let suffixes = subdomain_suffixes(ctx.host, ctx.base_domain);
        let url_suffixes = url_from_suffixes(ctx.url, ctx.host, &suffixes);

        if let Some(index) = first_match(self.store.exception_rules(), &ctx, &url_suffixes) {
            log::debug!(
                "allowed {} {}",
                ctx.url,
                self.store.exception_rules()[index].pattern.as_str()
            );
            return MatchResult {
                decision: MatchDecision::Allow,
                rule: Some((RuleList::Exception, index)),
            };
        }

        if let Some(index) = first_match(self.store.network_rules(), &ctx, &url_suffixes) {
            log::debug!(
                "blocked {} {}",
                ctx.url,
                self.store.network_rules()[index].pattern.as_str()
            );
            return MatchResult {
                decision: MatchDecision::Block,
                rule: Some((RuleList::Block, index)),
            };
        }

        MatchResult::default()
    }

    /// Shorthand for the decision alone.
    pub fn evaluate(&self, ctx: &RequestContext<'_>) -> MatchDecision {
        self.match_request(ctx).decision
    }
}

/// Whether any rule in `rules` matches the request.
pub fn matches(rules: &[NetworkRule], ctx: &RequestContext<'_>) -> bool {
    let request = match CanonicalRequest::new(ctx) {
        Some(request) => request,
        None => return false,
    };
    let ctx = request.context(ctx);
    let suffixes = subdomain_suffixes(ctx.host, ctx.base_domain);
    let url_suffixes = url_from_suffixes(ctx.url, ctx.host, &suffixes);
    first_match(rules, &ctx, &url_suffixes).is_some()
}

/// Lowercased host and base domain without trailing dots, and the URL with
/// its host in the same form.
struct CanonicalRequest<'u> {
    url: Cow<'u, str>,
    host: String,
    base_domain: String,
}

impl<'u> CanonicalRequest<'u> {
    fn new(ctx: &RequestContext<'u>) -> Option<Self> {
        Some(Self {
            url: canonical_url(ctx.url),
            host: normalize_host(ctx.host)?,
            base_domain: normalize_host(ctx.base_domain)?,
        })
    }

    fn context(&self, original: &RequestContext<'_>) -> RequestContext<'_> {
        RequestContext {
            url: &self.url,
            host: &self.host,
            base_domain: &self.base_domain,
            resource: original.resource,
            is_third_party: original.is_third_party,
        }
    }
}

/// Index of the first rule admitting the request and matching its URL.
fn first_match(rules: &[NetworkRule], ctx: &RequestContext<'_>, url_suffixes: &[&str]) -> Option<usize> {
    rules
        .iter()
        .position(|rule| rule.admits(ctx) && rule.is_match(ctx.url, url_suffixes))
}
