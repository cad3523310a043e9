use sieve_core::rules::ElementHider;
use sieve_core::types::{AttributeMask, PartyFlags, PositionFlags, ResourceType};

use crate::error::ParseError;
use crate::pattern::{filter_to_regex, regex_literal};

/// One parsed filter line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Network(NetworkFilter),
    /// `domains##selector`
    Hider(ElementHider),
    /// `##selector`
    GeneralHider(String),
}

/// A network filter before its pattern is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFilter {
    /// `@@` prefix
    pub exception: bool,
    /// Pattern text with anchors and options removed
    pub body: String,
    pub position: PositionFlags,
    pub party: PartyFlags,
    pub attributes: AttributeMask,
    pub domains: Option<Vec<String>>,
}

impl NetworkFilter {
    /// Regex source for this filter: a `/.../` body verbatim, anything else
    /// translated.
    pub fn regex_source(&self) -> String {
        match regex_literal(&self.body) {
            Some(inner) => inner.to_string(),
            None => filter_to_regex(&self.body, self.position),
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.position.contains(PositionFlags::MATCH_CASE)
    }
}

/// Options that are understood but not supported by this engine.
const UNSUPPORTED_OPTIONS: &[&str] = &["collapse", "donottrack"];

/// Parse one filter-list line.
///
/// Returns `Ok(None)` for blank lines, comments and list headers.
pub fn parse_line(raw_line: &str) -> Result<Option<Filter>, ParseError> {
    let line = raw_line.trim();
    if line.is_empty() || is_comment_line(line) {
        return Ok(None);
    }

    if line.contains("#@#") || line.contains("#?#") || line.contains("#$#") {
        return Err(ParseError::UnsupportedSyntax(line.to_string()));
    }

    if let Some(pos) = line.find("##") {
        return parse_hider(&line[..pos], &line[pos + 2..]).map(Some);
    }

    parse_network(line).map(|filter| Some(Filter::Network(filter)))
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[')
}

fn parse_hider(domains_text: &str, selector: &str) -> Result<Filter, ParseError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(ParseError::UnsupportedSyntax(format!("{}##", domains_text)));
    }

    if domains_text.is_empty() {
        return Ok(Filter::GeneralHider(selector.to_string()));
    }

    let domains = split_domains(domains_text, ',');
    if domains.is_empty() {
        return Err(ParseError::EmptyDomainList);
    }

    Ok(Filter::Hider(ElementHider {
        selector: selector.to_string(),
        domains,
    }))
}

fn split_domains(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(|domain| domain.trim().to_ascii_lowercase())
        .filter(|domain| !domain.is_empty() && domain != "~")
        .collect()
}

fn parse_network(line: &str) -> Result<NetworkFilter, ParseError> {
    let (exception, line) = match line.strip_prefix("@@") {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let (pattern_part, options_text) = split_rule_options(line);
    let mut filter = match options_text {
        Some(options_text) => parse_options(options_text)?,
        None => NetworkFilter {
            exception: false,
            body: String::new(),
            position: PositionFlags::empty(),
            party: PartyFlags::empty(),
            attributes: AttributeMask::default(),
            domains: None,
        },
    };
    filter.exception = exception;

    let mut body = pattern_part;
    if let Some(rest) = body.strip_prefix("||") {
        filter.position |= PositionFlags::DOMAIN_START;
        body = rest;
    } else if let Some(rest) = body.strip_prefix('|') {
        filter.position |= PositionFlags::START;
        body = rest;
    }
    if let Some(rest) = body.strip_suffix('|') {
        filter.position |= PositionFlags::END;
        body = rest;
    }

    filter.body = body.to_string();
    Ok(filter)
}

/// Split at the options `$`.
///
/// The last `$` starts the options unless what follows contains `/`, in
/// which case the `$` belongs to a regex body such as `/ads$/`.
fn split_rule_options(line: &str) -> (&str, Option<&str>) {
    match line.rfind('$') {
        Some(pos) if !line[pos + 1..].contains('/') => (&line[..pos], Some(&line[pos + 1..])),
        _ => (line, None),
    }
}

fn parse_options(text: &str) -> Result<NetworkFilter, ParseError> {
    let mut position = PositionFlags::empty();
    let mut party = PartyFlags::empty();
    let mut attributes = AttributeMask::default();
    let mut domains: Option<Vec<String>> = None;

    for raw in text.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let raw_lower = raw.to_ascii_lowercase();
        let raw_lower = raw_lower.as_str();

        if let Some(domain_value) = raw_lower.strip_prefix("domain=") {
            let parsed = split_domains(domain_value, '|');
            if parsed.is_empty() {
                return Err(ParseError::EmptyDomainList);
            }
            domains.get_or_insert_with(Vec::new).extend(parsed);
            continue;
        }

        if raw_lower == "match-case" {
            position |= PositionFlags::MATCH_CASE;
            continue;
        }

        let (negated, name) = match raw_lower.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, raw_lower),
        };

        match (name, negated) {
            ("third-party", false) | ("first-party", true) => {
                party |= PartyFlags::THIRD_PARTY;
                continue;
            }
            ("third-party", true) | ("first-party", false) => {
                party |= PartyFlags::FIRST_PARTY;
                continue;
            }
            _ => {}
        }

        if let Some(kind) = ResourceType::from_option(name) {
            if !ResourceType::SUPPORTED.contains(kind) {
                return Err(ParseError::UnsupportedOption(name.to_string()));
            }
            if negated {
                attributes.exclude(kind);
            } else {
                attributes.include(kind);
            }
            continue;
        }

        if UNSUPPORTED_OPTIONS.contains(&name) {
            return Err(ParseError::UnsupportedOption(name.to_string()));
        }

        return Err(ParseError::UnknownOption(raw.to_string()));
    }

    Ok(NetworkFilter {
        exception: false,
        body: String::new(),
        position,
        party,
        attributes,
        domains,
    })
}
