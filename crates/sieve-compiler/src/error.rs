use thiserror::Error;

/// Why a filter line was dropped. Never fatal to a list load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("not supported: adblock option '{0}'")]
    UnsupportedOption(String),

    #[error("unsupported filter syntax '{0}'")]
    UnsupportedSyntax(String),

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("empty domain list")]
    EmptyDomainList,
}
