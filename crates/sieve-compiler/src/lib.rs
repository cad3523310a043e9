//! adsieve Filter List Compiler
//!
//! This crate compiles EasyList-style filter lists into a
//! [`sieve_core::RuleStore`].

pub mod builder;
pub mod error;
pub mod parser;
pub mod pattern;

pub use builder::{add_line, compile_filter_list, compile_filter_list_bytes, CompileStats, LineOutcome};
pub use error::ParseError;
pub use parser::{parse_line, Filter, NetworkFilter};
pub use pattern::filter_to_regex;
