//! Error types for reference resolution and registry operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Image reference failed the registry reference grammar
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    /// Digest malformed or not encodable as a tag
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),
    /// Repository override failed the repository grammar
    #[error("Invalid repository override: {0}")]
    InvalidOverride(String),
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),
    /// Network related errors
    #[error("Network error: {0}")]
    Network(String),
    /// Unexpected registry response
    #[error("Registry error: {0}")]
    Registry(String),
    /// Configuration or keychain errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// True for failures detected locally, before any registry round trip.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RegistryError::InvalidReference(_)
                | RegistryError::InvalidDigest(_)
                | RegistryError::InvalidOverride(_)
        )
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Registry(format!("Malformed JSON: {}", err))
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        handlers::NetworkErrorHandler::handle_network_error(&err, "registry request")
    }
}

impl From<url::ParseError> for RegistryError {
    fn from(err: url::ParseError) -> Self {
        RegistryError::Registry(format!("Invalid URL: {}", err))
    }
}
