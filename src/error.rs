use thiserror::Error;

/// Failure of a single HTTP GET, before any retry policy is applied
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or body read failure
    #[error("request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("server returned HTTP {0}")]
    Status(u16),
}

impl TransportError {
    /// Only transport-level failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Request(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("network error fetching {url} (after {attempts} attempt(s)): {source}")]
    Network {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The server answered, but not with a success status; never retried
    #[error("{url} answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("caption XML could not be parsed: {0}")]
    Parse(String),

    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
