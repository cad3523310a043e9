//! Core type definitions for adsieve
//!
//! Option flags, resource attributes and the request/verdict types shared by
//! the compiler, the matcher and the engine.

// =============================================================================
// Position Options
// =============================================================================

bitflags::bitflags! {
    /// Anchoring and case options of a network rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PositionFlags: u8 {
        /// Pattern starts with `|`
        const START = 1 << 0;
        /// Pattern starts with `||` (start of a subdomain label)
        const DOMAIN_START = 1 << 1;
        /// Pattern ends with `|`
        const END = 1 << 2;
        /// `$match-case`
        const MATCH_CASE = 1 << 3;
    }
}

// =============================================================================
// Party Options
// =============================================================================

bitflags::bitflags! {
    /// Party restriction of a network rule.
    ///
    /// Both bits may be set at storage level; such a rule never matches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PartyFlags: u8 {
        /// `$third-party`
        const THIRD_PARTY = 1 << 0;
        /// `$~third-party` / `$first-party`
        const FIRST_PARTY = 1 << 1;
    }
}

// =============================================================================
// Resource Types
// =============================================================================

bitflags::bitflags! {
    /// Resource kind bit mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceType: u16 {
        const SCRIPT = 1 << 0;
        const IMAGE = 1 << 1;
        const STYLESHEET = 1 << 2;
        const OBJECT = 1 << 3;
        const XBL = 1 << 4;
        const PING = 1 << 5;
        const XMLHTTPREQUEST = 1 << 6;
        const OBJECT_SUBREQUEST = 1 << 7;
        const DTD = 1 << 8;
        const SUBDOCUMENT = 1 << 9;
        const DOCUMENT = 1 << 10;
        const ELEMHIDE = 1 << 11;
        const OTHER = 1 << 12;

        /// Kinds a filter option may restrict a rule to.
        const SUPPORTED = Self::SCRIPT.bits()
            | Self::IMAGE.bits()
            | Self::STYLESHEET.bits()
            | Self::OBJECT_SUBREQUEST.bits()
            | Self::SUBDOCUMENT.bits()
            | Self::DOCUMENT.bits()
            | Self::ELEMHIDE.bits();
    }
}

impl ResourceType {
    /// Classify a response by its sniffed MIME type.
    ///
    /// Returns an empty mask when the type says nothing about the resource
    /// kind; such requests skip attribute checks entirely.
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime.starts_with("image/") {
            Self::IMAGE
        } else if mime.contains("javascript") || mime.contains("ecmascript") {
            Self::SCRIPT
        } else if mime == "application/x-shockwave-flash" || mime == "application/x-flv" {
            Self::OBJECT_SUBREQUEST
        } else if mime == "text/css" {
            Self::STYLESHEET
        } else {
            Self::empty()
        }
    }

    /// Map a filter option name to its kind.
    pub fn from_option(name: &str) -> Option<Self> {
        match name {
            "script" => Some(Self::SCRIPT),
            "image" => Some(Self::IMAGE),
            "stylesheet" => Some(Self::STYLESHEET),
            "object" => Some(Self::OBJECT),
            "xbl" => Some(Self::XBL),
            "ping" => Some(Self::PING),
            "xmlhttprequest" => Some(Self::XMLHTTPREQUEST),
            "object-subrequest" => Some(Self::OBJECT_SUBREQUEST),
            "dtd" => Some(Self::DTD),
            "subdocument" => Some(Self::SUBDOCUMENT),
            "document" => Some(Self::DOCUMENT),
            "elemhide" => Some(Self::ELEMHIDE),
            "other" => Some(Self::OTHER),
            _ => None,
        }
    }
}

// =============================================================================
// Attribute Mask
// =============================================================================

/// Bit offset of the excluded kinds in the packed representation.
pub const INVERSE_SHIFT: u32 = 15;

// Forward and excluded halves must not overlap.
const _: () = assert!((ResourceType::all().bits() as u32) < (1 << INVERSE_SHIFT));

/// Resource restriction of a network rule: kinds the rule is limited to and
/// kinds it must never apply to (`$~kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttributeMask {
    include: ResourceType,
    exclude: ResourceType,
}

impl AttributeMask {
    pub fn new(include: ResourceType, exclude: ResourceType) -> Self {
        Self { include, exclude }
    }

    #[inline]
    pub fn included(&self) -> ResourceType {
        self.include
    }

    #[inline]
    pub fn excluded(&self) -> ResourceType {
        self.exclude
    }

    pub fn include(&mut self, kind: ResourceType) {
        self.include |= kind;
    }

    pub fn exclude(&mut self, kind: ResourceType) {
        self.exclude |= kind;
    }

    /// True when the rule carries no attribute restriction at all.
    pub fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Whether a request of kind `request` passes this mask.
    ///
    /// An empty request kind passes every mask. Otherwise the excluded half is
    /// checked first, then the included half if it is non-empty.
    pub fn admits(&self, request: ResourceType) -> bool {
        if request.is_empty() {
            return true;
        }
        if self.exclude.intersects(request) {
            return false;
        }
        self.include.is_empty() || self.include.intersects(request)
    }

    /// Pack into one integer: included kinds in the low bits, excluded kinds
    /// shifted by [`INVERSE_SHIFT`].
    pub fn to_packed(&self) -> u32 {
        (self.include.bits() as u32) | ((self.exclude.bits() as u32) << INVERSE_SHIFT)
    }

    pub fn from_packed(packed: u32) -> Self {
        let low_mask = (1u32 << INVERSE_SHIFT) - 1;
        Self {
            include: ResourceType::from_bits_truncate((packed & low_mask) as u16),
            exclude: ResourceType::from_bits_truncate((packed >> INVERSE_SHIFT) as u16),
        }
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Context for a request being matched.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Full request URL
    pub url: &'a str,
    /// Request hostname
    pub host: &'a str,
    /// Request base domain (registrable domain of `host`)
    pub base_domain: &'a str,
    /// Resource kind, empty when unknown
    pub resource: ResourceType,
    /// Whether the request leaves the top-level page's base domain
    pub is_third_party: bool,
}

// =============================================================================
// Match Result
// =============================================================================

/// Final decision for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// No block rule matched, or an exception matched
    Allow,
    /// A block rule matched and no exception did
    Block,
}

/// Which rule list a match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleList {
    Exception,
    Block,
}

/// Result of matching a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    /// The final decision for this request
    pub decision: MatchDecision,
    /// List and index of the rule that determined the decision
    pub rule: Option<(RuleList, usize)>,
}

impl Default for MatchResult {
    fn default() -> Self {
        Self {
            decision: MatchDecision::Allow,
            rule: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_content_types() {
        assert_eq!(ResourceType::from_content_type("image/gif"), ResourceType::IMAGE);
        assert_eq!(
            ResourceType::from_content_type("application/javascript; charset=utf-8"),
            ResourceType::SCRIPT
        );
        assert_eq!(ResourceType::from_content_type("text/css"), ResourceType::STYLESHEET);
        assert_eq!(
            ResourceType::from_content_type("application/x-shockwave-flash"),
            ResourceType::OBJECT_SUBREQUEST
        );
        assert!(ResourceType::from_content_type("text/html").is_empty());
    }

    #[test]
    fn packed_halves_do_not_overlap() {
        let all = ResourceType::all();
        let mask = AttributeMask::new(all, all);
        let packed = mask.to_packed();
        assert_eq!(packed & ((1 << INVERSE_SHIFT) - 1), all.bits() as u32);
        assert_eq!(packed >> INVERSE_SHIFT, all.bits() as u32);
        assert_eq!(AttributeMask::from_packed(packed), mask);

        // The highest kind must still sit below the shift.
        assert!(ResourceType::OTHER.bits() < (1 << INVERSE_SHIFT));
    }

    #[test]
    fn admits_checks_exclusions_before_inclusions() {
        let mut mask = AttributeMask::default();
        mask.include(ResourceType::IMAGE | ResourceType::SCRIPT);
        mask.exclude(ResourceType::SCRIPT);
        assert!(mask.admits(ResourceType::IMAGE));
        assert!(!mask.admits(ResourceType::SCRIPT));
        assert!(!mask.admits(ResourceType::STYLESHEET));
        assert!(mask.admits(ResourceType::empty()));
    }

    #[test]
    fn unrestricted_mask_admits_everything() {
        let mask = AttributeMask::default();
        assert!(mask.is_unrestricted());
        assert!(mask.admits(ResourceType::DOCUMENT));
        assert!(mask.admits(ResourceType::IMAGE));
    }
}
