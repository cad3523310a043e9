use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why an engine could not be started. The browser keeps running without
/// filtering when any of these occur.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("adblocker is disabled")]
    Disabled,

    #[error("filter list not found: {}: {source}", path.display())]
    FilterListUnreadable { path: PathBuf, source: io::Error },

    #[error("cannot prepare stylesheet cache {}: {source}", path.display())]
    CacheDir { path: PathBuf, source: io::Error },

    #[error("cannot read public suffix list {}: {source}", path.display())]
    PublicSuffixList { path: PathBuf, source: io::Error },

    #[error("configuration error: {0}")]
    Config(String),
}
