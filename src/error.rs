use thiserror::Error;

#[derive(Error, Debug)]
pub enum SrtError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat completion API error: {0}")]
    Api(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl SrtError {
    /// Transport and API failures are worth another attempt; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api(_))
    }
}

pub type Result<T> = std::result::Result<T, SrtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SrtError::Api("429 Too Many Requests".to_string()).is_retryable());
        assert!(!SrtError::Translation("bad".to_string()).is_retryable());
        assert!(!SrtError::Config("missing key".to_string()).is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!SrtError::from(io).is_retryable());
    }
}
