//! Error types for regsync-image

use thiserror::Error;

/// Result type alias using regsync-image's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing image references or talking to a registry
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed image reference
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// HTTP transport failure
    #[error("Failed to reach registry at {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Registry answered with a non-success status
    #[error("Registry returned {status} for {url}: {body}")]
    RegistryStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// Token cannot be sent as an Authorization header
    #[error("Registry token for {registry} is not a valid header value")]
    InvalidToken { registry: String },

    /// Registry URL could not be built or joined
    #[error("Invalid registry URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create an HTTP transport error
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }
}
