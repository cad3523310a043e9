//! Filter engine for the adsieve blocker
//!
//! Ties the compiled rules to the outside world:
//! - `config`: JSON configuration
//! - `engine`: request decisions and per-host stylesheets
//! - `stylesheet`: stylesheet rendering and the on-disk cache
//! - `user_style`: the user's own stylesheet
//! - `watch`: file watch that keeps generated sheets in step with it

pub mod config;
pub mod engine;
pub mod error;
pub mod stylesheet;
pub mod user_style;
pub mod watch;

pub use config::Config;
pub use engine::Engine;
pub use error::EngineError;
pub use stylesheet::{read_hiding_selectors, render_stylesheet, split_selectors};
pub use user_style::UserStylesheet;

pub use sieve_compiler::CompileStats;
pub use sieve_core::{MatchDecision, PublicSuffixList, RequestContext, ResourceType};
