//! Error types for the Redmine client.
//!
//! # Design
//! A status code that differs from the one an endpoint documents is not an
//! error here: it travels back to the caller inside `ApiResponse`. Errors are
//! reserved for exchanges that failed outright (transport), payloads that could
//! not be encoded, and response bodies that did not match the expected shape.
//! `UnexpectedStatus` and `NoResponse` only appear when a caller opts into
//! `ApiResponse::into_result`.

/// Failure to complete an HTTP exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS, timeout or protocol failure reported by ureq.
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// The status line arrived but the body could not be read in full.
    #[error("reading response body failed (HTTP {status}): {source}")]
    Body {
        status: u16,
        #[source]
        source: ureq::Error,
    },

    /// Failure reported by a custom transport.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Status received before the failure, if the exchange got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Body { status, .. } => Some(*status),
            TransportError::Http(_) | TransportError::Other(_) => None,
        }
    }
}

/// Errors carried by an `ApiResponse`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport failure")]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed")]
    Serialization(#[source] serde_json::Error),

    /// The response body did not match the expected JSON shape.
    #[error("deserialization failed (HTTP {status})")]
    Deserialization {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with a status other than the documented one.
    #[error("unexpected HTTP status {status} (expected {expected}){}", format_errors(.errors))]
    UnexpectedStatus {
        status: u16,
        expected: u16,
        /// Validation messages from a Redmine `{"errors":[...]}` body.
        errors: Vec<String>,
    },

    /// No response was received and no other failure was recorded.
    #[error("no response received")]
    NoResponse,
}

fn format_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", errors.join("; "))
    }
}

/// Invalid or missing transport configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_lists_server_messages() {
        let err = ApiError::UnexpectedStatus {
            status: 422,
            expected: 201,
            errors: vec!["Text cannot be blank".to_string(), "Title is invalid".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unexpected HTTP status 422 (expected 201): Text cannot be blank; Title is invalid"
        );
    }

    #[test]
    fn unexpected_status_without_messages() {
        let err = ApiError::UnexpectedStatus {
            status: 404,
            expected: 200,
            errors: Vec::new(),
        };
        assert_eq!(err.to_string(), "unexpected HTTP status 404 (expected 200)");
    }

    #[test]
    fn transport_errors_convert_into_api_errors() {
        let err: ApiError = TransportError::Other("connection refused".to_string()).into();
        assert!(matches!(err, ApiError::Transport(TransportError::Other(_))));
    }

    #[test]
    fn only_body_failures_carry_a_status() {
        let body = TransportError::Body {
            status: 200,
            source: ureq::Error::BodyExceedsLimit(16),
        };
        assert_eq!(body.status(), Some(200));
        assert!(body.to_string().starts_with("reading response body failed (HTTP 200)"));
        assert_eq!(TransportError::Other("refused".to_string()).status(), None);
    }
}
