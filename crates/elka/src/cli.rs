//! Clap derive structures for the `elka` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// elka -- manage Elka smart-window controllers from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "elka",
    version,
    about = "Manage Elka smart-window devices from the command line",
    long_about = "Command-line client for the Elka device service.\n\n\
        Sign in with a password or a Yandex account, browse and edit devices,\n\
        configure their MQTT brokers, and read command and event logs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "ELKA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server origin (overrides profile), e.g. https://elkarobotics.com
    #[arg(long, short = 'u', env = "ELKA_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ELKA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "ELKA_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ELKA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, sign out, and manage your account
    #[command(alias = "a")]
    Auth(AuthArgs),

    /// Browse, create, and configure devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show recent log entries across all devices
    Logs,

    /// List registered users (admin only)
    Users(PageArgs),

    /// Open a page by its path, e.g. /devices/SN-1/logs
    Open {
        /// Page path (query string allowed for /auth/yandex/callback)
        path: String,
    },

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// `skip`/`limit` style paging.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Number of records to skip
    #[arg(long, default_value = "0")]
    pub skip: u64,

    /// Max records to return
    #[arg(long, short = 'l', default_value = "100")]
    pub limit: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(long, short = 'e')]
        email: Option<String>,

        /// Read the password from this environment variable instead of prompting
        #[arg(long, value_name = "VAR")]
        password_env: Option<String>,
    },

    /// Create a new account (does not sign in)
    Register {
        #[arg(long, short = 'e')]
        email: Option<String>,

        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Read the password from this environment variable instead of prompting
        #[arg(long, value_name = "VAR")]
        password_env: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout {
        /// Also revoke the session on the server
        #[arg(long)]
        remote: bool,
    },

    /// Show the signed-in user's profile
    #[command(alias = "whoami")]
    Profile {
        /// Fetch from the server instead of the cached copy
        #[arg(long)]
        refresh: bool,
    },

    /// Print the Yandex sign-in URL
    OauthUrl,

    /// Finish Yandex sign-in with the URL the browser was redirected to
    OauthCallback {
        /// Full callback URL or its query string
        url: String,
    },

    /// Exchange the refresh token for a new token pair
    Refresh,

    /// Change the account password
    Passwd,

    /// Update profile fields
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Detach the linked Yandex account
    UnlinkYandex,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

/// Sortable columns of the device table.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortColumn {
    Id,
    Name,
    SerialNumber,
    Status,
    LastSeen,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// List only devices linked to your account
    #[arg(long)]
    pub mine: bool,

    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: u64,

    /// Rows per page (10, 20 or 50)
    #[arg(long, short = 'r', default_value = "20")]
    pub rows: u64,

    /// Sort column
    #[arg(long, short = 's', default_value = "name")]
    pub sort: SortColumn,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    /// Filter by name
    #[arg(long)]
    pub name: Option<String>,

    /// Filter by owner id
    #[arg(long)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Show device details
    Get {
        /// Device ID or serial number
        device: String,
    },

    /// Create a device (prompts for missing fields)
    Create {
        #[arg(long, short = 'n')]
        name: Option<String>,

        #[arg(long)]
        serial: Option<String>,

        /// Room the device belongs to
        #[arg(long)]
        room: Option<String>,
    },

    /// Update device fields
    Update {
        device: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        serial: Option<String>,

        #[arg(long)]
        room: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a device
    #[command(alias = "rm")]
    Delete { device: String },

    /// Show or set MQTT broker settings
    Mqtt {
        device: String,

        /// Broker address, e.g. mqtt://broker.local:1883
        #[arg(long)]
        broker: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// Read the broker password from this environment variable
        #[arg(long, value_name = "VAR")]
        password_env: Option<String>,
    },

    /// Import devices from the linked Yandex smart home
    Sync,

    /// Search your devices by name or owner
    Query {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        user_id: Option<i64>,
    },

    /// Show command and event history for a device
    Logs { device: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value
    Set {
        /// Config key (e.g., "profiles.home.base_url", "defaults.timeout")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file location
    Path {
        /// Print the session file location instead
        #[arg(long)]
        session: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
