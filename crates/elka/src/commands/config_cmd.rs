//! Config subcommand handlers.

use dialoguer::{Input, Select};

use elka_config::{Config, DEFAULT_PROFILE, Profile, SessionBackend};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::{CliError, prompt_err};
use crate::output;

const PROFILE_KEYS: &str = "base_url, api_prefix, session_backend, insecure, timeout, ca_cert, \
                            yandex_client_id, yandex_redirect_uri, defaults.output, \
                            defaults.timeout, defaults.insecure";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display as TOML, sorted by profile name.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "base_url = \"{}\"", p.base_url);
        let _ = writeln!(out, "api_prefix = \"{}\"", p.api_prefix);
        let _ = writeln!(out, "session_backend = \"{}\"", p.session_backend);
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref id) = p.yandex_client_id {
            let _ = writeln!(out, "yandex_client_id = \"{id}\"");
        }
        if let Some(ref uri) = p.yandex_redirect_uri {
            let _ = writeln!(out, "yandex_redirect_uri = \"{uri}\"");
        }
    }

    out
}

fn parse<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `key = value` to the named profile (created when missing) or to
/// `[defaults]` for `defaults.*` keys.
pub(crate) fn apply_setting(
    cfg: &mut Config,
    profile_name: &str,
    key: &str,
    value: &str,
) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "defaults.output" => {
            if !matches!(value, "table" | "json" | "json_compact" | "json-compact" | "yaml" | "plain") {
                return Err(CliError::Validation {
                    field: "defaults.output".into(),
                    reason: "must be table, json, json-compact, yaml or plain".into(),
                });
            }
            cfg.defaults.output = value.into();
            return Ok(());
        }
        "defaults.timeout" => {
            cfg.defaults.timeout = parse("timeout", value, "a number (seconds)")?;
            return Ok(());
        }
        "defaults.insecure" => {
            cfg.defaults.insecure = parse("insecure", value, "'true' or 'false'")?;
            return Ok(());
        }
        _ => {}
    }

    let profile = cfg.profiles.entry(profile_name.to_owned()).or_default();
    match key.replace('-', "_").as_str() {
        "base_url" => profile.base_url = value.trim_end_matches('/').into(),
        "api_prefix" => profile.api_prefix = value.into(),
        "session_backend" => {
            profile.session_backend =
                parse::<SessionBackend>("session_backend", value, "'file', 'keyring' or 'memory'")?;
        }
        "insecure" => profile.insecure = Some(parse("insecure", value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse("timeout", value, "a number (seconds)")?),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "yandex_client_id" => profile.yandex_client_id = Some(value.into()),
        "yandex_redirect_uri" => profile.yandex_redirect_uri = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {PROFILE_KEYS}"),
            });
        }
    }
    Ok(())
}

fn available(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = elka_config::config_path();
            eprintln!("elka configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(DEFAULT_PROFILE.into())
                .interact_text()
                .map_err(prompt_err)?;

            let base_url: String = Input::new()
                .with_prompt("Server URL")
                .default(Profile::default().base_url)
                .interact_text()
                .map_err(prompt_err)?;

            let backends = &[
                "Session file in the data directory",
                "System keyring",
                "Memory only (sign in every run)",
            ];
            let session_backend = match Select::new()
                .with_prompt("Where to keep the session tokens?")
                .items(backends)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => SessionBackend::File,
                1 => SessionBackend::Keyring,
                _ => SessionBackend::Memory,
            };

            let mut cfg = elka_config::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    base_url: base_url.trim_end_matches('/').into(),
                    session_backend,
                    ..Profile::default()
                },
            );
            cfg.default_profile = Some(profile_name.clone());
            elka_config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Sign in: elka auth login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = elka_config::load_config()?;
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = elka_config::load_config()?;
            let profile_name = global
                .profile
                .clone()
                .or_else(|| cfg.default_profile.clone())
                .unwrap_or_else(|| DEFAULT_PROFILE.into());

            apply_setting(&mut cfg, &profile_name, &key, &value)?;
            elka_config::save_config(&cfg)?;
            output::success(global, &format!("Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = elka_config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or(DEFAULT_PROFILE);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: elka config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = elka_config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            elka_config::save_config(&cfg)?;
            output::success(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path { session } => {
            let path = if session {
                let cfg = elka_config::load_config()?;
                let (name, _) = elka_config::resolve_profile(&cfg, global.profile.as_deref())?;
                elka_config::session_path(&name)
            } else {
                elka_config::config_path()
            };
            println!("{}", path.display());
            Ok(())
        }
    }
}
