//! Error types surfaced by the API client.
//!
//! Every failure of a request collapses into [`ApiError`], whose `Display`
//! output is the message a user may see. Technical detail is kept in the
//! variant fields and in the logs, never in the message itself.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Message shown for any failure where the request never produced a response.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error, please check your connection and try again.";

/// Message shown when a response body cannot be decoded into the expected shape.
pub const DECODE_ERROR_MESSAGE: &str = "Unexpected response from server.";

/// Message shown when the session was rejected by the backend.
pub const UNAUTHORIZED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Normalized error returned by every client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached the server or the response could not be read.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network {
        /// Transport error text, for diagnostics only.
        detail: String,
    },
    /// The backend rejected the session (401/403 on a non-auth endpoint).
    ///
    /// Local session state has already been cleared when this is returned.
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized {
        /// HTTP status returned by the backend.
        status: u16,
    },
    /// Any other non-2xx response.
    #[error("{message}")]
    Http {
        /// HTTP status returned by the backend.
        status: u16,
        /// Message extracted from the response.
        message: String,
    },
    /// A successful response did not match the expected shape.
    #[error("{}", DECODE_ERROR_MESSAGE)]
    Decode {
        /// Decoder error text, for diagnostics only.
        detail: String,
    },
    /// A request body could not be serialized.
    #[error("request could not be encoded")]
    Encode {
        /// Encoder error text, for diagnostics only.
        detail: String,
    },
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub(crate) fn network(err: &reqwest::Error) -> Self {
        Self::Network {
            detail: err.to_string(),
        }
    }

    pub(crate) fn decode(err: &serde_json::Error) -> Self {
        Self::Decode {
            detail: err.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// User-facing message for this error.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status carried by the error, when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status } | Self::Http { status, .. } => Some(*status),
            Self::Network { .. }
            | Self::Decode { .. }
            | Self::Encode { .. }
            | Self::Validation(_) => None,
        }
    }

    /// Whether the caller should send the user back to the login view.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Errors raised by session persistence backends.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Filesystem operation on the session slot failed.
    #[error("session storage {operation} failed for {}", path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path of the session slot.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Persisted data could not be parsed.
    #[error("persisted session at {} is malformed", path.display())]
    Corrupt {
        /// Path of the session slot.
        path: PathBuf,
        /// Source decode error.
        source: serde_json::Error,
    },
    /// Session could not be serialized.
    #[error("session could not be serialized")]
    Encode {
        /// Source encode error.
        source: serde_json::Error,
    },
}

/// Errors raised while building client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Base URL was not an absolute http(s) URL.
    #[error("invalid base URL '{value}': {reason}")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Timeout value was not a positive integer number of seconds.
    #[error("invalid HTTP timeout '{value}'")]
    InvalidTimeout {
        /// Offending value.
        value: String,
    },
    /// Session mode was not recognised.
    #[error("invalid session mode '{value}' (expected 'durable' or 'ephemeral')")]
    InvalidSessionMode {
        /// Offending value.
        value: String,
    },
    /// Request identifier contained characters not allowed in a header.
    #[error("request identifier contains invalid characters")]
    InvalidRequestId,
    /// No location could be derived for the durable session file.
    #[error("no session file location available; set DDI_SESSION_FILE")]
    SessionPathUnavailable,
    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// Source reqwest error.
        source: reqwest::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_hides_transport_detail() {
        let err = ApiError::Network {
            detail: "tcp connect error: Connection refused (os error 111)".to_string(),
        };
        assert_eq!(err.message(), NETWORK_ERROR_MESSAGE);
        assert!(err.status().is_none());
    }

    #[test]
    fn http_error_displays_extracted_message() {
        let err = ApiError::Http {
            status: 422,
            message: "store_id and date required".to_string(),
        };
        assert_eq!(err.to_string(), "store_id and date required");
        assert_eq!(err.status(), Some(422));
        assert!(!err.requires_login());
    }

    #[test]
    fn unauthorized_requires_login() {
        let err = ApiError::Unauthorized { status: 403 };
        assert!(err.requires_login());
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.message(), UNAUTHORIZED_MESSAGE);
    }

    #[test]
    fn decode_error_is_generic() {
        let err = ApiError::Decode {
            detail: "missing field `forecast_value`".to_string(),
        };
        assert_eq!(err.message(), DECODE_ERROR_MESSAGE);
    }
}
