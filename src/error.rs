//! Error types for configuration, rule compilation and hook I/O.
//!
//! Evaluating a command never fails; these errors only surface while
//! building a guard or talking to the host.

/// Errors raised outside the decision path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read hook input: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid hook input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("rule `{rule}` has an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule `{0}` has no patterns")]
    EmptyRule(String),

    #[error("unknown output format `{0}` (expected `block` or `claude-code`)")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
