use regex::RegexBuilder;

use sieve_core::rules::{NetworkRule, RuleStore};
use sieve_core::types::RuleList;

use crate::error::ParseError;
use crate::parser::{parse_line, Filter, NetworkFilter};

/// What a single line contributed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Ignored,
    NetworkRule,
    ExceptionRule,
    Hider,
    GeneralSelector,
}

/// Counters gathered while compiling a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub lines: usize,
    pub ignored: usize,
    pub network_rules: usize,
    pub exception_rules: usize,
    pub hiders: usize,
    pub general_selectors: usize,
    pub dropped: usize,
}

impl CompileStats {
    fn record(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Ignored => self.ignored += 1,
            LineOutcome::NetworkRule => self.network_rules += 1,
            LineOutcome::ExceptionRule => self.exception_rules += 1,
            LineOutcome::Hider => self.hiders += 1,
            LineOutcome::GeneralSelector => self.general_selectors += 1,
        }
    }
}

/// Build the regex for a network filter.
///
/// Matching is case-insensitive unless the filter has `$match-case`.
pub fn compile_network_filter(filter: &NetworkFilter) -> Result<NetworkRule, ParseError> {
    let source = filter.regex_source();
    let pattern = RegexBuilder::new(&source)
        .case_insensitive(!filter.is_case_sensitive())
        .build()
        .map_err(|e| ParseError::InvalidRegex(e.to_string()))?;

    Ok(NetworkRule {
        pattern,
        position: filter.position,
        party: filter.party,
        attributes: filter.attributes,
        domains: filter.domains.clone(),
    })
}

/// Parse one line and add whatever it yields to `store`.
pub fn add_line(store: &mut RuleStore, line: &str) -> Result<LineOutcome, ParseError> {
    let filter = match parse_line(line)? {
        Some(filter) => filter,
        None => return Ok(LineOutcome::Ignored),
    };

    match filter {
        Filter::Network(filter) => {
            let rule = compile_network_filter(&filter)?;
            if filter.exception {
                store.push_rule(RuleList::Exception, rule);
                Ok(LineOutcome::ExceptionRule)
            } else {
                store.push_rule(RuleList::Block, rule);
                Ok(LineOutcome::NetworkRule)
            }
        }
        Filter::Hider(hider) => {
            store.push_hider(hider);
            Ok(LineOutcome::Hider)
        }
        Filter::GeneralHider(selector) => {
            store.push_general_selector(&selector);
            Ok(LineOutcome::GeneralSelector)
        }
    }
}

/// Compile a whole filter list. Bad lines are logged and dropped.
pub fn compile_filter_list(text: &str) -> (RuleStore, CompileStats) {
    let mut store = RuleStore::new();
    let mut stats = CompileStats::default();

    for (index, line) in text.lines().enumerate() {
        compile_into(&mut store, &mut stats, index + 1, line);
    }

    (store, stats)
}

/// Compile raw filter-list bytes. Lines that are not UTF-8 are dropped.
pub fn compile_filter_list_bytes(bytes: &[u8]) -> (RuleStore, CompileStats) {
    let mut store = RuleStore::new();
    let mut stats = CompileStats::default();

    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    for (index, raw) in bytes.split(|&b| b == b'\n').enumerate() {
        match std::str::from_utf8(raw) {
            Ok(line) => compile_into(&mut store, &mut stats, index + 1, line),
            Err(e) => {
                stats.lines += 1;
                stats.dropped += 1;
                log::warn!("ignoring adblock rule at line {}: not valid UTF-8: {}", index + 1, e);
            }
        }
    }

    (store, stats)
}

fn compile_into(store: &mut RuleStore, stats: &mut CompileStats, line_no: usize, line: &str) {
    stats.lines += 1;
    match add_line(store, line) {
        Ok(outcome) => stats.record(outcome),
        Err(e) => {
            stats.dropped += 1;
            log::warn!("ignoring adblock rule at line {}: {}: {}", line_no, line.trim(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use sieve_core::domain::PublicSuffixList;
    use sieve_core::matcher::Matcher;
    use sieve_core::types::{MatchDecision, RequestContext, ResourceType};

    use super::*;

    fn base(psl: &PublicSuffixList, host: &str) -> String {
        psl.base_domain_of(host).expect("host should have a base domain")
    }

    fn request<'a>(url: &'a str, host: &'a str, base_domain: &'a str) -> RequestContext<'a> {
        RequestContext {
            url,
            host,
            base_domain,
            resource: ResourceType::empty(),
            is_third_party: false,
        }
    }

    #[test]
    fn compiles_mixed_list() {
        let list = "\
! comment
[Adblock Plus 2.0]

||ads.example.com^
@@||ads.example.com/allowed/
example.com##.ad-banner
##.tracker
||bad.com^$popup
/ad[/
";
        let (store, stats) = compile_filter_list(list);
        assert_eq!(stats.lines, 9);
        assert_eq!(stats.ignored, 3);
        assert_eq!(stats.network_rules, 1);
        assert_eq!(stats.exception_rules, 1);
        assert_eq!(stats.hiders, 1);
        assert_eq!(stats.general_selectors, 1);
        assert_eq!(stats.dropped, 2);

        assert_eq!(store.network_rules().len(), 1);
        assert_eq!(store.exception_rules().len(), 1);
        assert_eq!(store.general_selectors(), ".tracker");
    }

    #[test]
    fn domain_anchor_aligns_on_labels() {
        let psl = PublicSuffixList::builtin();
        let (store, _) = compile_filter_list("||ads.example.com^");
        let matcher = Matcher::new(&store);
        let base_domain = base(&psl, "ads.example.com");

        let ctx = request("http://ads.example.com/x", "ads.example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);

        let base_domain = base(&psl, "notads.example.com");
        let ctx = request("http://notads.example.com/x", "notads.example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Allow);

        let base_domain = base(&psl, "cdn.ads.example.com");
        let ctx = request("http://cdn.ads.example.com/x", "cdn.ads.example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);

        // `^` also matches at the end of the URL
        let base_domain = base(&psl, "ads.example.com");
        let ctx = request("http://ads.example.com", "ads.example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);
        let ctx = request("http://ads.example.com:8080", "ads.example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);

        // A dot is not a separator
        let base_domain = base(&psl, "ads.example.com.evil.net");
        let ctx = request("http://ads.example.com.evil.net/", "ads.example.com.evil.net", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Allow);
    }

    #[test]
    fn regex_rule_respects_resource_type() {
        let psl = PublicSuffixList::builtin();
        let (store, _) = compile_filter_list("/banner\\./$image");
        let matcher = Matcher::new(&store);
        let base_domain = base(&psl, "example.com");

        let mut ctx = request("http://example.com/img/banner.gif", "example.com", &base_domain);
        ctx.resource = ResourceType::IMAGE;
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);

        ctx.resource = ResourceType::SCRIPT;
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Allow);
    }

    #[test]
    fn exceptions_dominate_block_rules() {
        let psl = PublicSuffixList::builtin();
        let (store, _) = compile_filter_list("||example.com^\n/ads/*\n@@/ads/ok$script");
        let matcher = Matcher::new(&store);
        let base_domain = base(&psl, "www.example.com");

        let mut ctx = request("http://www.example.com/ads/ok.js", "www.example.com", &base_domain);
        ctx.resource = ResourceType::SCRIPT;
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Allow);

        ctx.resource = ResourceType::IMAGE;
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);
    }

    #[test]
    fn match_case_controls_case_sensitivity() {
        let psl = PublicSuffixList::builtin();
        let (store, _) = compile_filter_list("/BannerAd/$match-case\nPopUp");
        let matcher = Matcher::new(&store);
        let base_domain = base(&psl, "example.com");

        let ctx = request("http://example.com/bannerad.png", "example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Allow);

        let ctx = request("http://example.com/BannerAd.png", "example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);

        let ctx = request("http://example.com/popup.js", "example.com", &base_domain);
        assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block);
    }

    #[test]
    fn unrestricted_rules_ignore_host() {
        let psl = PublicSuffixList::builtin();
        let (store, _) = compile_filter_list("/tracking/pixel");
        let matcher = Matcher::new(&store);

        for host in ["example.com", "www.example.co.uk", "cdn.other.org"] {
            let url = format!("http://{}/tracking/pixel.gif", host);
            let base_domain = base(&psl, host);
            let ctx = request(&url, host, &base_domain);
            assert_eq!(matcher.evaluate(&ctx), MatchDecision::Block, "host {host}");
        }
    }

    #[test]
    fn recompiling_gives_identical_verdicts() {
        let psl = PublicSuffixList::builtin();
        let list = "||ads.example.com^\n@@||ads.example.com/ok\n/banner/*$image\n||t.net^$third-party";
        let (first, _) = compile_filter_list(list);
        let (second, _) = compile_filter_list(list);

        let corpus = [
            ("http://ads.example.com/x", "ads.example.com", ResourceType::empty(), false),
            ("http://ads.example.com/ok", "ads.example.com", ResourceType::empty(), false),
            ("http://example.com/banner/1.gif", "example.com", ResourceType::IMAGE, false),
            ("http://example.com/banner/1.js", "example.com", ResourceType::SCRIPT, false),
            ("http://t.net/p", "t.net", ResourceType::empty(), true),
            ("http://t.net/p", "t.net", ResourceType::empty(), false),
        ];

        for (url, host, resource, third_party) in corpus {
            let base_domain = base(&psl, host);
            let mut ctx = request(url, host, &base_domain);
            ctx.resource = resource;
            ctx.is_third_party = third_party;
            assert_eq!(
                Matcher::new(&first).evaluate(&ctx),
                Matcher::new(&second).evaluate(&ctx),
                "{url}"
            );
        }
    }

    #[test]
    fn skips_invalid_utf8_lines() {
        let bytes = b"||ads.example.com^\n\xff\xfe##.bad\n##.tracker\n";
        let (store, stats) = compile_filter_list_bytes(bytes);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.dropped, 1);
        assert_eq!(store.network_rules().len(), 1);
        assert_eq!(store.general_selectors(), ".tracker");
    }
}
