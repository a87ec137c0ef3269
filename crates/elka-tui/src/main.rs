//! `elka-tui`: terminal client for Elka smart window controllers.
//!
//! Every page of the web client has a screen here, addressed by the same
//! paths (`/devices`, `/devices/:id/logs`, ...). Number keys follow the
//! header navigation; `:` opens any path, which is also how a Yandex
//! sign-in redirect is pasted back in.
//!
//! Logs go to a file (default `$TMPDIR/elka-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod bridge;
mod component;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use elka_core::Hub;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

/// Terminal client for Elka smart window controllers.
#[derive(Parser, Debug)]
#[command(name = "elka-tui", version, about)]
struct Cli {
    /// Page to open first (e.g. /devices, /devices/SN-1)
    #[arg(default_value = "/")]
    path: String,

    /// Profile from the config file
    #[arg(short, long, env = "ELKA_PROFILE")]
    profile: Option<String>,

    /// Server origin, overriding the profile
    #[arg(short = 'u', long, env = "ELKA_BASE_URL")]
    base_url: Option<String>,

    /// Log file path
    #[arg(long, default_value_os_t = std::env::temp_dir().join("elka-tui.log"))]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Hold the guard until exit so the writer flushes.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("elka_tui={level},elka_core={level}")));

    let dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("elka-tui.log"));

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();
    guard
}

/// Config file and profile, then CLI overrides.
fn build_hub(cli: &Cli) -> Result<Hub> {
    let cfg = elka_config::load_config()?;
    let (name, mut profile) = elka_config::resolve_profile(&cfg, cli.profile.as_deref())?;
    if let Some(ref url) = cli.base_url {
        profile.base_url.clone_from(url);
    }
    let client = elka_config::profile_to_client_config(&profile, &cfg.defaults)?;
    info!(profile = %name, base_url = %client.base_url, "resolved profile");
    let store = elka_config::session_store(&profile, &name)?;
    Ok(Hub::new(client, store)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Before the terminal changes mode, so a panic restores it.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let hub = build_hub(&cli)?;
    info!(path = %cli.path, "starting elka-tui");

    let mut app = App::new(hub, &cli.path);
    app.run().await
}
