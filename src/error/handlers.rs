//! Standardized mapping from HTTP and transport failures to `RegistryError`

use crate::error::RegistryError;
use reqwest::StatusCode;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Handle registry-related HTTP errors
    pub fn handle_registry_error(
        status: StatusCode,
        error_text: &str,
        operation: &str,
    ) -> RegistryError {
        let detail = |message: String| with_body(message, error_text);
        match status.as_u16() {
            401 => RegistryError::Auth(detail(format!(
                "Unauthorized to perform {} operation",
                operation
            ))),
            403 => RegistryError::Auth(detail(format!(
                "Forbidden: insufficient permissions for {}",
                operation
            ))),
            404 => RegistryError::NotFound(detail(operation.to_string())),
            405 => RegistryError::Registry(detail(format!("Registry does not allow {}", operation))),
            429 => RegistryError::Registry(detail(format!("Rate limited during {}", operation))),
            500 => RegistryError::Registry(detail(format!("Registry server error during {}", operation))),
            502 | 503 => RegistryError::Registry(detail(format!("Registry unavailable for {}", operation))),
            _ => RegistryError::Registry(detail(format!("{} failed (status {})", operation, status))),
        }
    }

    /// Handle authentication-related HTTP errors
    pub fn handle_auth_error(status: StatusCode, error_text: &str) -> RegistryError {
        let error_msg = match status.as_u16() {
            400 => "Invalid token request parameters".to_string(),
            401 => "Invalid credentials provided".to_string(),
            403 => "Access denied - insufficient permissions".to_string(),
            404 => "Authentication endpoint not found".to_string(),
            _ => with_body(format!("Authentication failed (status {})", status), error_text),
        };

        RegistryError::Auth(error_msg)
    }
}

/// Append the response body to `message` when there is one
fn with_body(message: String, body: &str) -> String {
    match body.trim() {
        "" => message,
        body => format!("{}: {}", message, body),
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Network(format!("{} timed out: {}", context, error))
        } else if error.is_connect() {
            RegistryError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("dns") {
            RegistryError::Network(format!("DNS resolution error for {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            RegistryError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else if error.is_decode() {
            RegistryError::Registry(format!("Malformed response during {}: {}", context, error))
        } else {
            RegistryError::Network(format!("{} network error: {}", context, error))
        }
    }
}
