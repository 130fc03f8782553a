use std::io;

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme: {0} (only http and https are accepted)")]
    UnsupportedScheme(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("batch too large: {count} urls (max {max})")]
    BatchTooLarge { count: usize, max: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ScanError {
    /// Input errors are the only ones allowed out of the scoring core.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ScanError::InvalidUrl(_) | ScanError::UnsupportedScheme(_))
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::Timeout
        } else if err.is_connect() {
            ScanError::Network(err.to_string())
        } else if err.is_status() {
            ScanError::Http(err.to_string())
        } else if err.is_decode() {
            ScanError::Parse(err.to_string())
        } else {
            ScanError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Parse(err.to_string())
    }
}
