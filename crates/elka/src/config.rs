//! CLI configuration: thin wrapper around `elka_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--profile, --base-url, --timeout, --insecure).

use elka_config::{Config, Profile};
use elka_core::{ClientConfig, Hub};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile in effect for this invocation, flags applied.
#[derive(Debug)]
pub struct Resolved {
    pub name: String,
    pub profile: Profile,
    pub client: ClientConfig,
}

/// Apply CLI flag overrides on top of a stored profile.
///
/// Flags take priority over profile values; `--insecure` only ever
/// loosens verification.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.base_url {
        profile.base_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    profile
}

pub fn resolve_with(cfg: &Config, global: &GlobalOpts) -> Result<Resolved, CliError> {
    let (name, profile) = elka_config::resolve_profile(cfg, global.profile.as_deref())?;
    let profile = apply_overrides(profile, global);
    let client = elka_config::profile_to_client_config(&profile, &cfg.defaults)?;
    Ok(Resolved {
        name,
        profile,
        client,
    })
}

pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = elka_config::load_config()?;
    resolve_with(&cfg, global)
}

/// Resolve the profile and open its session store.
pub fn build_hub(global: &GlobalOpts) -> Result<Hub, CliError> {
    let resolved = resolve(global)?;
    tracing::debug!(
        profile = %resolved.name,
        base_url = %resolved.client.base_url,
        backend = %resolved.profile.session_backend,
        "resolved profile"
    );
    let store = elka_config::session_store(&resolved.profile, &resolved.name)?;
    Ok(Hub::new(resolved.client, store)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["elka"];
        argv.extend_from_slice(args);
        argv.push("logs");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_profile() {
        let g = global(&["--base-url", "http://localhost:8000", "--timeout", "5", "-k"]);
        let resolved = resolve_with(&Config::default(), &g).unwrap();
        assert_eq!(resolved.name, "default");
        assert_eq!(resolved.client.base_url, "http://localhost:8000");
        assert_eq!(resolved.client.timeout, std::time::Duration::from_secs(5));
        assert_eq!(
            resolved.client.tls,
            elka_core::TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let g = global(&["--profile", "staging"]);
        let err = resolve_with(&Config::default(), &g).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref name, .. } if name == "staging"));
    }
}
