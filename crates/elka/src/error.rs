//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use elka_config::ConfigError;
use elka_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the server: {reason}")]
    #[diagnostic(
        code(elka::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Override the address with --base-url, or set base_url in your profile."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("TLS setup failed: {reason}")]
    #[diagnostic(
        code(elka::tls_error),
        help("Use --insecure (-k) to skip verification, or configure ca_cert in your profile.")
    )]
    Tls { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication required")]
    #[diagnostic(
        code(elka::auth_required),
        help("Sign in first with: elka auth login (or elka auth oauth-url for Yandex)")
    )]
    AuthRequired,

    #[error("{message}")]
    #[diagnostic(code(elka::auth_failed))]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(elka::not_found),
        help("Run: elka {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(elka::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(elka::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(elka::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: elka config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{message}")]
    #[diagnostic(code(elka::config), help("Config file: {path}"))]
    Config { message: String, path: String },

    #[error("{message}")]
    #[diagnostic(code(elka::session_storage))]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(elka::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(elka::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── IO ────────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthRequired | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Api { status, .. } => match status {
                Some(401) => exit_code::AUTH,
                Some(403) => exit_code::PERMISSION,
                Some(404) => exit_code::NOT_FOUND,
                Some(409) => exit_code::CONFLICT,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }

    /// Turn a 404 from a lookup into a `NotFound` naming what was looked up.
    pub fn or_not_found(err: CoreError, resource_type: &str, identifier: &str) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                resource_type: resource_type.into(),
                identifier: identifier.into(),
                list_command: format!("{resource_type}s list"),
            }
        } else {
            err.into()
        }
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthRequired => Self::AuthRequired,
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::ConnectionFailed { reason } => {
                if reason.starts_with("TLS") {
                    Self::Tls { reason }
                } else {
                    Self::ConnectionFailed { reason }
                }
            }
            CoreError::Timeout => Self::Timeout,
            CoreError::Api { message, status } => Self::Api { message, status },
            CoreError::InvalidResponse { message } => Self::Api {
                message,
                status: None,
            },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Storage { message } => Self::Storage { message },
            CoreError::Config { message } => Self::Config {
                message,
                path: elka_config::config_path().display().to_string(),
            },
            CoreError::Cancelled => Self::Api {
                message: "Request cancelled".into(),
                status: None,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => {
                let cfg = elka_config::load_config_or_default();
                let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
                names.sort();
                Self::ProfileNotFound {
                    name,
                    available: if names.is_empty() {
                        "(none)".into()
                    } else {
                        names.join(", ")
                    },
                }
            }
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
                path: elka_config::config_path().display().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_picks_exit_code() {
        let err = CliError::from(CoreError::Api {
            message: "Not enough permissions".into(),
            status: Some(403),
        });
        assert_eq!(err.exit_code(), exit_code::PERMISSION);
        assert_eq!(err.to_string(), "Not enough permissions");
    }

    #[test]
    fn lookup_404_names_the_resource() {
        let err = CliError::or_not_found(
            CoreError::Api {
                message: "Device not found".into(),
                status: Some(404),
            },
            "device",
            "SN-9",
        );
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "device 'SN-9' not found");
    }

    #[test]
    fn auth_required_exits_with_auth_code() {
        assert_eq!(CliError::from(CoreError::AuthRequired).exit_code(), exit_code::AUTH);
    }
}
