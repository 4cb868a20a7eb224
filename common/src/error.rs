use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Exchange API error: {0}")]
    ExchangeError(#[from] FetchError),

    #[error("Parsing error: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Analysis error: {0}")]
    AnalysisError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Failure of a single exchange lookup.
///
/// Every kind is recoverable at the aggregation level: the symbol is retried
/// on the fallback exchange and dropped only when both exchanges fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The pair is delisted or was never listed.
    #[error("pair not found: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Timeouts, connection failures and 5xx responses.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Body could not be decoded or a required field was missing or non-numeric.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "not_found",
            FetchError::RateLimited(_) => "rate_limited",
            FetchError::Transient(_) => "transient",
            FetchError::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                404 => FetchError::NotFound(err.to_string()),
                418 | 429 => FetchError::RateLimited(err.to_string()),
                _ => FetchError::Transient(err.to_string()),
            }
        } else {
            // timeouts, refused connections, dropped bodies
            FetchError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}
