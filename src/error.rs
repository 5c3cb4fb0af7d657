use thiserror::Error;

/// Result alias for `graphdelta`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by ingestion, configuration and ranking primitives.
///
/// Nothing inside the delta / grow / select / evaluate pipeline fails:
/// degenerate inputs degrade to fewer or empty results instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// A line of graph input could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending record.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// The external ranking source failed or returned unusable data.
    #[error("ranking unavailable: {0}")]
    Ranking(String),

    /// A configuration or report document could not be (de)serialized.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
