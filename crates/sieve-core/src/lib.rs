//! adsieve Core Library
//!
//! This crate provides the request matching engine for the adsieve
//! filter-list blocker.
//!
//! # Architecture
//!
//! Filter lists are compiled (by `sieve-compiler`) into a [`RuleStore`]:
//! block rules, exception rules, domain-indexed element hiders and the
//! general selector buffer. The store is built once and only read after
//! that, so a [`Matcher`] borrows it without any locking.
//!
//! # Modules
//!
//! - `domain`: Public suffix rules, base domain extraction, suffix walking
//! - `url`: Host extraction without allocations
//! - `rules`: Compiled rule and store types
//! - `matcher`: Core request matching engine
//! - `types`: Shared type definitions

pub mod domain;
pub mod matcher;
pub mod rules;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use domain::{subdomain_suffixes, PublicSuffixList};
pub use matcher::Matcher;
pub use rules::{ElementHider, NetworkRule, RuleStore};
pub use types::{
    AttributeMask, MatchDecision, MatchResult, PartyFlags, PositionFlags, RequestContext,
    ResourceType, RuleList,
};
