//! Auth command handlers: sign-in, registration, Yandex OAuth, profile.

use elka_core::models::{ProfileUpdate, UserProfile};
use elka_core::pages::{LOGIN_FAILED, PROFILE_MISSING, REGISTER_FAILED};
use elka_core::{CoreError, Hub, SessionCheck};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

/// Server message when there is one, else the page's generic text.
fn with_fallback(err: CoreError, fallback: &str) -> CliError {
    if err.to_string().trim().is_empty() {
        CliError::AuthFailed {
            message: fallback.into(),
        }
    } else {
        err.into()
    }
}

pub(crate) fn profile_detail(p: &UserProfile) -> String {
    let mut lines = vec![
        "My Profile".to_owned(),
        format!("Name:     {}", if p.name.is_empty() { "-" } else { &p.name }),
        format!("Email:    {}", p.email),
        format!("Role:     {}", p.role_label()),
    ];
    if p.is_admin() {
        lines.push("Admin:    yes".into());
    }
    lines.push(format!(
        "Yandex:   {}",
        if p.has_yandex() { "linked" } else { "not linked" }
    ));
    if let Some(ref created) = p.created_at {
        lines.push(format!("Joined:   {}", output::timestamp(Some(created))));
    }
    lines.join("\n")
}

/// The cached profile, fetched once if missing.
pub(crate) async fn current_profile(hub: &Hub) -> Result<UserProfile, CliError> {
    match hub.auth().revalidate().await {
        SessionCheck::Cached(p) | SessionCheck::Fetched(p) => Ok(p),
        SessionCheck::Anonymous => Err(CliError::AuthRequired),
        SessionCheck::Cleared => Err(CliError::AuthFailed {
            message: "Session expired. Please sign in again.".into(),
        }),
        SessionCheck::Kept(e) => {
            tracing::debug!("profile fetch failed: {e}");
            Err(CliError::AuthFailed {
                message: PROFILE_MISSING.into(),
            })
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(hub: &Hub, args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login {
            email,
            password_env,
        } => {
            let email = util::value_or_prompt(email, "Email")?;
            let password = util::secret("Password", password_env.as_deref())?;

            let pb = output::spinner(global, "Signing in...");
            let result = hub.auth().login(&email, &password).await;
            pb.finish_and_clear();

            let outcome = result.map_err(|e| with_fallback(e, LOGIN_FAILED))?;
            let who = if outcome.profile.name.is_empty() {
                &outcome.profile.email
            } else {
                &outcome.profile.name
            };
            output::success(global, &format!("Signed in as {who}"));
            Ok(())
        }

        AuthCommand::Register {
            email,
            name,
            password_env,
        } => {
            let email = util::value_or_prompt(email, "Email")?;
            let name = util::value_or_prompt(name, "Name")?;
            let password = util::secret("Password", password_env.as_deref())?;

            let profile = hub
                .auth()
                .register(&email, &name, &password)
                .await
                .map_err(|e| with_fallback(e, REGISTER_FAILED))?;
            let who = if profile.name.is_empty() {
                &name
            } else {
                &profile.name
            };
            output::success(
                global,
                &format!("Registration successful for {who}! You can now log in."),
            );
            Ok(())
        }

        AuthCommand::Logout { remote } => {
            if remote {
                let outcome = hub.auth().logout_remote().await;
                if let Some(e) = outcome.remote_error {
                    output::warning(
                        global,
                        &format!("server logout failed ({e}); local session cleared"),
                    );
                }
            } else {
                hub.auth().logout()?;
            }
            output::success(global, "Signed out.");
            Ok(())
        }

        AuthCommand::Profile { refresh } => {
            let profile = if refresh {
                if !hub.session().is_logged_in() {
                    return Err(CliError::AuthRequired);
                }
                hub.auth().reload_profile().await?
            } else {
                current_profile(hub).await?
            };
            let out = output::render_single(&global.output, &profile, profile_detail, |p| {
                p.email.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::OauthUrl => {
            let url = hub.auth().yandex_authorize_url()?;
            output::print_output(url.as_str(), false);
            Ok(())
        }

        AuthCommand::OauthCallback { url } => {
            let pb = output::spinner(global, "Processing Yandex Sign-In...");
            let result = hub.auth().complete_yandex(&url).await;
            pb.finish_and_clear();

            let outcome = result?;
            output::success(
                global,
                &format!("Signed in with Yandex as {}", outcome.profile.email),
            );
            Ok(())
        }

        AuthCommand::Refresh => {
            hub.auth().refresh().await?;
            output::success(global, "Tokens refreshed.");
            Ok(())
        }

        AuthCommand::Passwd => {
            let current = util::secret("Current password", None)?;
            let new = util::secret("New password", None)?;
            let again = util::secret("Repeat new password", None)?;
            if new != again {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "passwords do not match".into(),
                });
            }
            let message = hub.auth().change_password(&current, &new).await?;
            output::success(global, &message);
            Ok(())
        }

        AuthCommand::UpdateProfile { name, avatar_url } => {
            if name.is_none() && avatar_url.is_none() {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: "nothing to update; pass --name or --avatar-url".into(),
                });
            }
            let profile = hub
                .auth()
                .update_profile(&ProfileUpdate { name, avatar_url })
                .await?;
            let out = output::render_single(&global.output, &profile, profile_detail, |p| {
                p.email.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::UnlinkYandex => {
            if !util::confirm("Unlink your Yandex account?", global.yes, "unlink-yandex")? {
                return Ok(());
            }
            let message = hub.unlink_yandex().await?;
            let message = match message.as_str() {
                "" | "OK" => "Yandex account unlinked.",
                other => other,
            };
            output::success(global, message);
            Ok(())
        }
    }
}
