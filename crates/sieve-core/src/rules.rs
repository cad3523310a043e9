//! Compiled rule store
//!
//! Built once from a filter list and read-only afterwards. Element hiders
//! live in a single arena; the per-domain index holds arena indices only, so
//! a hider listed under several domains is stored once.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::domain::{domain_matches, subdomain_suffixes};
use crate::types::{AttributeMask, PartyFlags, PositionFlags, RequestContext, RuleList};

// =============================================================================
// Network Rule
// =============================================================================

/// A compiled URL-matching rule (block or exception).
#[derive(Debug, Clone)]
pub struct NetworkRule {
    pub pattern: Regex,
    pub position: PositionFlags,
    pub party: PartyFlags,
    pub attributes: AttributeMask,
    /// Domain restriction, `None` applies everywhere
    pub domains: Option<Vec<String>>,
}

impl NetworkRule {
    /// Check everything except the URL pattern: resource kind, domain
    /// restriction and party.
    pub fn admits(&self, ctx: &RequestContext<'_>) -> bool {
        if !self.attributes.admits(ctx.resource) {
            return false;
        }

        if let Some(domains) = &self.domains {
            if !domain_matches(domains, ctx.host, ctx.base_domain) {
                return false;
            }
        }

        if self.party.contains(PartyFlags::THIRD_PARTY) && !ctx.is_third_party {
            return false;
        }
        if self.party.contains(PartyFlags::FIRST_PARTY) && ctx.is_third_party {
            return false;
        }

        true
    }

    /// Test the pattern.
    ///
    /// Domain-anchored rules are tried against each `url_suffixes` entry
    /// (the URL cut at successive host labels); all others against `url`.
    pub fn is_match(&self, url: &str, url_suffixes: &[&str]) -> bool {
        if self.position.contains(PositionFlags::DOMAIN_START) {
            url_suffixes.iter().any(|view| self.pattern.is_match(view))
        } else {
            self.pattern.is_match(url)
        }
    }
}

// =============================================================================
// Element Hider
// =============================================================================

/// A domain-scoped cosmetic rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHider {
    /// CSS selector after `##`
    pub selector: String,
    /// Domains the selector applies to; `~` entries exclude
    pub domains: Vec<String>,
}

// =============================================================================
// Rule Store
// =============================================================================

#[derive(Debug, Default, Clone)]
pub struct RuleStore {
    network_rules: Vec<NetworkRule>,
    exception_rules: Vec<NetworkRule>,
    hiders: Vec<ElementHider>,
    hider_index: HashMap<String, Vec<usize>>,
    /// Hiders listing only excluded domains; considered for every host
    unscoped_hiders: Vec<usize>,
    general_selectors: String,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rule(&mut self, list: RuleList, rule: NetworkRule) {
        match list {
            RuleList::Exception => self.exception_rules.push(rule),
            RuleList::Block => self.network_rules.push(rule),
        }
    }

    /// Add a hider and index it under each listed domain.
    /// Returns its arena index.
    pub fn push_hider(&mut self, hider: ElementHider) -> usize {
        let id = self.hiders.len();
        let mut indexed = false;
        for domain in &hider.domains {
            if domain.starts_with('~') {
                continue;
            }
            let bucket = self.hider_index.entry(domain.to_ascii_lowercase()).or_default();
            if !bucket.contains(&id) {
                bucket.push(id);
            }
            indexed = true;
        }
        if !indexed {
            self.unscoped_hiders.push(id);
        }
        self.hiders.push(hider);
        id
    }

    /// Append a selector to the shared general buffer.
    pub fn push_general_selector(&mut self, selector: &str) {
        if selector.is_empty() {
            return;
        }
        if !self.general_selectors.is_empty() {
            self.general_selectors.push(',');
        }
        self.general_selectors.push_str(selector);
    }

    pub fn network_rules(&self) -> &[NetworkRule] {
        &self.network_rules
    }

    pub fn exception_rules(&self) -> &[NetworkRule] {
        &self.exception_rules
    }

    pub fn rules(&self, list: RuleList) -> &[NetworkRule] {
        match list {
            RuleList::Exception => &self.exception_rules,
            RuleList::Block => &self.network_rules,
        }
    }

    pub fn hiders(&self) -> &[ElementHider] {
        &self.hiders
    }

    /// Hider indices stored under a domain token.
    pub fn hiders_under(&self, domain: &str) -> &[usize] {
        self.hider_index.get(domain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Comma-joined selectors that apply to every page.
    pub fn general_selectors(&self) -> &str {
        &self.general_selectors
    }

    pub fn has_cosmetic_rules(&self) -> bool {
        !self.hiders.is_empty() || !self.general_selectors.is_empty()
    }

    /// Domain-scoped selectors applicable to `host`, in discovery order
    /// (most specific suffix first). General selectors are not included.
    pub fn hiding_selectors(&self, host: &str, base_domain: &str) -> Vec<&str> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut selectors = Vec::new();

        let scoped = subdomain_suffixes(host, base_domain)
            .into_iter()
            .take_while(|suffix| !suffix.is_empty())
            .flat_map(|suffix| self.hiders_under(suffix).iter().copied());

        for id in scoped.chain(self.unscoped_hiders.iter().copied()) {
            if !seen.insert(id) {
                continue;
            }
            let hider = &self.hiders[id];
            if domain_matches(&hider.domains, host, base_domain) {
                selectors.push(hider.selector.as_str());
            }
        }

        selectors
    }
}
