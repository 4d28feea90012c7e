use thiserror::Error;

/// Crate-wide error type covering every failure a client call can surface.
///
/// HTTP failures are normalized into this taxonomy by the transport layer;
/// resource clients and the auth session pass them through untouched so
/// callers always match on one shape.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request rejected by the server with a field-level or payload-level
    /// message (4xx other than 401/403/404), or rejected locally before any
    /// request was issued.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        code: Option<String>,
    },

    /// Session invalid or expired (401).
    #[error("Unauthorized: {message}")]
    Auth { message: String },

    /// Insufficient role for the operation (403).
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Resource not found (404).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {method} {path}")]
    Timeout { method: String, path: String },

    /// No response at all (connection refused, DNS failure, broken socket).
    #[error("Network error: {method} {path}")]
    Network {
        method: String,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// The server answered 5xx.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response body could not be decoded into the expected shape.
    #[error("Invalid response body from {path}")]
    Decode {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Cache bookkeeping failed (serialization of a cached value).
    #[error("Cache operation failed: {message}")]
    Cache { message: String },

    /// Configuration error with key information.
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures.
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    /// Human-readable message suitable for a user-facing notification.
    ///
    /// Server-supplied messages are preserved verbatim; transport-level
    /// failures collapse to a generic description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::Auth { message }
            | ApiError::Forbidden { message }
            | ApiError::Server { message, .. } => message.clone(),
            ApiError::NotFound { resource } => format!("{resource} was not found"),
            ApiError::Timeout { .. } | ApiError::Network { .. } => {
                "The server could not be reached. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for failures where a retry of a read cannot make things worse.
    pub fn is_retryable_read(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout { .. } | ApiError::Network { .. } | ApiError::Server { .. }
        )
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Internal { source: error }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| format!("{field}: {m}"))
                        .unwrap_or_else(|| format!("{field}: invalid value"))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::Validation {
            message,
            code: None,
        }
    }
}

/// Type alias for Result with ApiError to simplify function signatures
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_preserves_server_text() {
        let err = ApiError::Validation {
            message: "amount must be positive".into(),
            code: Some("INVALID_AMOUNT".into()),
        };
        assert_eq!(err.user_message(), "amount must be positive");
    }

    #[test]
    fn test_user_message_generic_for_network() {
        let err = ApiError::Timeout {
            method: "GET".into(),
            path: "/stats".into(),
        };
        assert!(err.user_message().contains("could not be reached"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            ApiError::Server {
                status: 502,
                message: "bad gateway".into()
            }
            .is_retryable_read()
        );
        assert!(
            !ApiError::Auth {
                message: "expired".into()
            }
            .is_retryable_read()
        );
    }

    #[test]
    fn test_from_validation_errors_joins_fields() {
        use validator::Validate;

        #[derive(Validate)]
        struct Input {
            #[validate(length(min = 3, message = "too short"))]
            name: String,
        }

        let input = Input { name: "ab".into() };
        let err: ApiError = input.validate().unwrap_err().into();
        match err {
            ApiError::Validation { message, .. } => {
                assert!(message.contains("name"));
                assert!(message.contains("too short"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }
}
