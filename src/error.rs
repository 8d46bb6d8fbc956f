use std::time::Duration;

/// Result type for indexer operations
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Error types for indexer operations
#[derive(thiserror::Error, Debug)]
pub enum IndexerError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("Transcript service error: {0}")]
    Transcript(String),

    #[error("Upstream call timed out after {0:?}")]
    Timeout(Duration),
}

impl IndexerError {
    /// Whether a retry of the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            IndexerError::Timeout(_) | IndexerError::RateLimited(_) | IndexerError::Transcript(_) => true,
            IndexerError::Http(e) => !e.is_decode() && !e.is_builder(),
            IndexerError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(IndexerError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(IndexerError::UpstreamStatus { status: 429, body: String::new() }.is_transient());
        assert!(IndexerError::UpstreamStatus { status: 503, body: String::new() }.is_transient());
        assert!(!IndexerError::UpstreamStatus { status: 403, body: String::new() }.is_transient());
        assert!(!IndexerError::Config("bad".to_string()).is_transient());
        assert!(!IndexerError::MissingCredential("YOUTUBE_API_KEY".to_string()).is_transient());
    }
}
