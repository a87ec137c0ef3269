use thiserror::Error;

/// Top-level error type for the `elka-api` crate.
///
/// Every failure carries a human-readable message; `elka-core` surfaces
/// these unchanged to the page or command that triggered the call.
#[derive(Debug, Error)]
pub enum Error {
    // ── Preconditions ───────────────────────────────────────────────
    /// An authenticated endpoint was called without an access token.
    /// No request is sent.
    #[error("Authentication required")]
    AuthRequired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, reset, ...).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP status ─────────────────────────────────────────────────
    /// Non-success status. `message` is extracted from the error body when
    /// possible, otherwise `HTTP error! status: N`.
    #[error("{message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// A success response was missing fields the caller requires
    /// (tokens, profile, ...).
    #[error("{message}")]
    InvalidResponse { message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── OAuth ───────────────────────────────────────────────────────
    /// The OAuth provider redirected back with an `error` parameter.
    #[error("Yandex OAuth error: {error}")]
    OAuthProvider { error: String },

    /// The OAuth redirect carried neither a code nor an error.
    #[error("No authorization code found")]
    MissingCode,
}

impl Error {
    /// HTTP status code, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected the credentials.
    ///
    /// Matches a 401 status or a message mentioning `401` / `Unauthorized`,
    /// the latter because some endpoints only report it in the body text.
    pub fn is_unauthorized(&self) -> bool {
        if self.status() == Some(401) {
            return true;
        }
        let message = self.to_string();
        message.contains("401") || message.contains("Unauthorized")
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` for connection-level failures (no response at all).
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_by_status() {
        let err = Error::Http {
            status: 401,
            message: "Could not validate credentials".into(),
        };
        assert!(err.is_unauthorized());
    }

    #[test]
    fn unauthorized_by_message() {
        let err = Error::InvalidResponse {
            message: "Unauthorized".into(),
        };
        assert!(err.is_unauthorized());

        let err = Error::Http {
            status: 500,
            message: "upstream said 401".into(),
        };
        assert!(err.is_unauthorized());
    }

    #[test]
    fn other_errors_are_not_unauthorized() {
        let err = Error::Http {
            status: 403,
            message: "Not enough permissions".into(),
        };
        assert!(!err.is_unauthorized());
        assert!(!Error::AuthRequired.is_unauthorized());
    }

    #[test]
    fn http_error_displays_message_only() {
        let err = Error::Http {
            status: 422,
            message: "bad email".into(),
        };
        assert_eq!(err.to_string(), "bad email");
        assert!(!err.is_not_found());
    }
}
