// ── Runtime client configuration ──
//
// These types describe *where* the device service lives and how to reach
// it. They never touch disk; the CLI/TUI builds a `ClientConfig` from the
// loaded profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use elka_api::transport::{TlsMode, TransportConfig};

pub const DEFAULT_BASE_URL: &str = "https://elkarobotics.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const YANDEX_AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";
pub const YANDEX_CLIENT_ID: &str = "303d7df8e9d74b39961e89aa60fb4fae";
pub const YANDEX_REDIRECT_URI: &str = "https://elkarobotics.com/auth/yandex/callback";
pub const YANDEX_SCOPES: &[&str] = &["login:email", "login:info", "iot:view"];

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (development servers).
    DangerAcceptInvalid,
}

/// Yandex OAuth client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub authorize_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorize_url: YANDEX_AUTHORIZE_URL.into(),
            client_id: YANDEX_CLIENT_ID.into(),
            redirect_uri: YANDEX_REDIRECT_URI.into(),
            scopes: YANDEX_SCOPES.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// Configuration for talking to one device service deployment.
///
/// Built by CLI/TUI, passed to `Hub` -- core never reads config files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin (e.g., `https://elkarobotics.com`).
    pub base_url: String,
    /// Path prefix for the versioned API.
    pub api_prefix: String,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub oauth: OAuthConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_prefix: elka_api::DEFAULT_API_PREFIX.into(),
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            oauth: OAuthConfig::default(),
        }
    }
}

impl ClientConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: Some(self.timeout),
        }
    }
}
