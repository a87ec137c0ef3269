//! Shared configuration for the elka CLI and TUI.
//!
//! TOML profiles loaded with figment (defaults, then file, then `ELKA_`
//! environment), session storage backends (file, keyring, memory), and
//! translation to `elka_core::ClientConfig`. Both binaries depend on this
//! crate; the CLI adds `GlobalOpts`-aware overrides on top.

mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use elka_core::config::{DEFAULT_BASE_URL, OAuthConfig};
use elka_core::{ClientConfig, KeyValueStore, MemoryStore, TlsVerification};

pub use store::{FileStore, KeyringStore};

pub const DEFAULT_PROFILE: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Where a profile keeps its session tokens.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// JSON file in the platform data directory.
    #[default]
    File,
    /// System keyring.
    Keyring,
    /// Process memory only; every run starts logged out.
    Memory,
}

/// A named server profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Server origin (e.g., "https://elkarobotics.com").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Versioned API path prefix.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    #[serde(default)]
    pub session_backend: SessionBackend,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Yandex OAuth client id override.
    pub yandex_client_id: Option<String>,

    /// Yandex OAuth redirect URI override.
    pub yandex_redirect_uri: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            session_backend: SessionBackend::default(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            yandex_client_id: None,
            yandex_redirect_uri: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_api_prefix() -> String {
    ClientConfig::default().api_prefix
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "elkarobotics", "elka")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("elka");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for session files and logs.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// Session file for a profile.
pub fn session_path(profile_name: &str) -> PathBuf {
    data_dir().join(format!("session-{profile_name}.json"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file + environment.
///
/// Environment keys nest with a double underscore:
/// `ELKA_DEFAULTS__TIMEOUT=5`, `ELKA_PROFILES__DEV__BASE_URL=...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ELKA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Pick the profile to use: the explicit name, else the configured
/// default, else "default". The "default" profile exists implicitly.
pub fn resolve_profile(cfg: &Config, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
    let name = name
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.into());

    match cfg.profiles.get(&name) {
        Some(profile) => Ok((name, profile.clone())),
        None if name == DEFAULT_PROFILE => Ok((name, Profile::default())),
        None => Err(ConfigError::UnknownProfile { name }),
    }
}

/// Build a `ClientConfig` from a profile, with `Defaults` filling gaps.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let base_url = profile.base_url.trim_end_matches('/');
    match base_url.split_once("://") {
        Some(("http" | "https", host)) if !host.is_empty() => {}
        _ => {
            return Err(ConfigError::Validation {
                field: "base_url".into(),
                reason: format!("expected an http(s) URL, got '{}'", profile.base_url),
            });
        }
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut oauth = OAuthConfig::default();
    if let Some(ref id) = profile.yandex_client_id {
        oauth.client_id.clone_from(id);
    }
    if let Some(ref uri) = profile.yandex_redirect_uri {
        oauth.redirect_uri.clone_from(uri);
    }

    Ok(ClientConfig {
        base_url: base_url.to_owned(),
        api_prefix: profile.api_prefix.clone(),
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        oauth,
    })
}

/// Open the session store a profile asks for.
pub fn session_store(
    profile: &Profile,
    profile_name: &str,
) -> Result<Arc<dyn KeyValueStore>, ConfigError> {
    Ok(match profile.session_backend {
        SessionBackend::File => Arc::new(FileStore::open(session_path(profile_name))?),
        SessionBackend::Keyring => Arc::new(KeyringStore::new(profile_name)),
        SessionBackend::Memory => Arc::new(MemoryStore::new()),
    })
}
