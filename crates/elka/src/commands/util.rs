//! Shared helpers for command handlers.

use std::io::IsTerminal;

use dialoguer::{Confirm, Input};

use crate::error::{CliError, prompt_err};

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Use the flag value when given, otherwise ask for it.
pub fn value_or_prompt(value: Option<String>, label: &str) -> Result<String, CliError> {
    if let Some(v) = value {
        return Ok(v);
    }
    ensure_interactive(label)?;
    Input::new()
        .with_prompt(label)
        .interact_text()
        .map_err(prompt_err)
}

/// Like [`value_or_prompt`], with a pre-filled default.
pub fn value_or_prompt_default(
    value: Option<String>,
    label: &str,
    default: &str,
) -> Result<String, CliError> {
    if let Some(v) = value {
        return Ok(v);
    }
    ensure_interactive(label)?;
    Input::new()
        .with_prompt(label)
        .default(default.to_owned())
        .interact_text()
        .map_err(prompt_err)
}

/// Read a secret from `env_var` when named, otherwise prompt without echo.
pub fn secret(prompt: &str, env_var: Option<&str>) -> Result<String, CliError> {
    if let Some(var) = env_var {
        return std::env::var(var).map_err(|_| CliError::Validation {
            field: "password-env".into(),
            reason: format!("environment variable {var} is not set"),
        });
    }
    ensure_interactive(prompt)?;
    rpassword::prompt_password(format!("{prompt}: ")).map_err(prompt_err)
}

fn ensure_interactive(label: &str) -> Result<(), CliError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: label.to_lowercase(),
            reason: "missing, and stdin is not a terminal to prompt for it".into(),
        })
    }
}
