use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing a client or preparing a request.
///
/// Failures of an individual risk check are never reported through this
/// type; they are folded into [`crate::outcome::DecisionOutcome`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The trust-anchor bundle could not be read.
    #[error("Failed to read CA bundle {}: {source}", path.display())]
    TrustAnchorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The trust-anchor bundle did not contain usable certificates.
    #[error("Invalid CA bundle {}: {reason}", path.display())]
    TrustAnchorInvalid { path: PathBuf, reason: String },

    /// The underlying HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// An endpoint override is not a usable URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A field value has no form representation.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Error with context chain for better debugging.
    #[error("{context}: {source}")]
    WithContext {
        #[source]
        source: Box<ClientError>,
        context: String,
    },
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `ClientError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, ClientError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, ClientError> {
    fn context(self, context: impl Into<String>) -> Result<T, ClientError> {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

impl<T> ResultExt<T> for Result<T, reqwest::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, ClientError> {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(ClientError::Http(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| ClientError::WithContext {
            source: Box::new(ClientError::Http(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_message() {
        let result: Result<(), ClientError> =
            Err(ClientError::InvalidEndpoint("ftp://nope".to_string()));
        let err = result.context("Loading endpoint override").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Loading endpoint override: Invalid endpoint: ftp://nope"
        );
    }

    #[test]
    fn test_with_context_is_lazy_on_ok() {
        let result: Result<u8, ClientError> = Ok(1);
        let value = result
            .with_context(|| panic!("context must not be evaluated"))
            .unwrap();
        assert_eq!(value, 1);
    }
}
