// ── Core error types ──
//
// User-facing errors from elka-core. Messages from the server are carried
// through verbatim so pages and commands can show them as-is.
// The `From<elka_api::Error>` impl sorts transport-layer errors into
// the variants front-ends branch on (exit codes, banners, session reset).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Auth errors ──────────────────────────────────────────────────
    /// No access token for an endpoint that needs one.
    #[error("Authentication required")]
    AuthRequired,

    /// Login, OAuth, or token refresh failed.
    #[error("{message}")]
    AuthenticationFailed { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("{reason}")]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Server errors ────────────────────────────────────────────────
    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { message: String, status: Option<u16> },

    /// The server answered 2xx but the body was not what we need.
    #[error("{message}")]
    InvalidResponse { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Session storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The page issuing the request was left before it finished.
    #[error("Request cancelled")]
    Cancelled,
}

impl CoreError {
    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Status 401, or a message mentioning `401` / `Unauthorized`.
    pub fn is_unauthorized(&self) -> bool {
        if self.status() == Some(401) {
            return true;
        }
        let message = self.to_string();
        message.contains("401") || message.contains("Unauthorized")
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<elka_api::Error> for CoreError {
    fn from(err: elka_api::Error) -> Self {
        match err {
            elka_api::Error::AuthRequired => CoreError::AuthRequired,
            elka_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            elka_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            elka_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            elka_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            elka_api::Error::InvalidResponse { message } => CoreError::InvalidResponse { message },
            elka_api::Error::Deserialization { message, body: _ } => CoreError::InvalidResponse {
                message: format!("Deserialization error: {message}"),
            },
            e @ (elka_api::Error::OAuthProvider { .. } | elka_api::Error::MissingCode) => {
                CoreError::AuthenticationFailed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_keep_message_and_status() {
        let err: CoreError = elka_api::Error::Http {
            status: 403,
            message: "Not enough permissions".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Not enough permissions");
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn unauthorized_detection_matches_message() {
        let err = CoreError::Api {
            message: "Unauthorized".into(),
            status: None,
        };
        assert!(err.is_unauthorized());
        assert!(
            CoreError::Api {
                message: "x".into(),
                status: Some(401)
            }
            .is_unauthorized()
        );
    }

    #[test]
    fn oauth_errors_become_auth_failures() {
        let err: CoreError = elka_api::Error::OAuthProvider {
            error: "access_denied".into(),
        }
        .into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(err.to_string(), "Yandex OAuth error: access_denied");
    }
}
