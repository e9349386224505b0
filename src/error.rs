// ⚠️ Error taxonomy for the ingestion pipeline
// Network, malformed response, storage, parse mismatch. None of these reach the display path.

use thiserror::Error;

/// Errors produced while fetching, parsing, enriching or persisting the dataset.
#[derive(Debug, Error)]
pub enum SkyError {
    /// HTTP transport failure (DNS, TLS, timeout, connection reset).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response arrived but its body is empty or not the expected shape.
    #[error("malformed response from {origin}: {message}")]
    MalformedResponse { origin: String, message: String },

    /// Local key-value storage could not be opened, read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Tabular data could not be mapped onto planet records.
    #[error("parse mismatch: {0}")]
    ParseMismatch(String),

    /// Persisted blob could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for SkyError {
    fn from(err: rusqlite::Error) -> Self {
        SkyError::StorageUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for SkyError {
    fn from(err: std::io::Error) -> Self {
        SkyError::StorageUnavailable(err.to_string())
    }
}

impl From<csv::Error> for SkyError {
    fn from(err: csv::Error) -> Self {
        SkyError::ParseMismatch(err.to_string())
    }
}

impl From<figment::Error> for SkyError {
    fn from(err: figment::Error) -> Self {
        SkyError::Config(err.to_string())
    }
}

pub type SkyResult<T> = Result<T, SkyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_storage_unavailable() {
        let err: SkyError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, SkyError::StorageUnavailable(_)));

        let err: SkyError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked").into();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_api_error_message() {
        let err = SkyError::Api {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (404): not found");
    }
}
