//! Everything that changes app state travels as an [`Action`].
//!
//! Screens ask for network work with [`Request`]; the bridge runs it and
//! the result comes back as a [`Completion`] stamped with the page that
//! asked, so answers for a page that is gone are dropped.

use elka_core::models::{
    Device, DeviceCreate, DeviceList, LogEntry, MqttSettings, UserProfile,
};
use elka_core::{
    AuthOutcome, CoreError, DeviceLogs, DeviceRow, FetchTicket, Route, SessionCheck, TableQuery,
    TableSource,
};
use serde_json::Value;

#[derive(Debug)]
pub enum Action {
    // ── Lifecycle ───────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),
    Paste(String),

    // ── Navigation ──────────────────────────────────────────────────
    /// Go to a page inside the app.
    Navigate(Route),
    /// Go to a typed or pasted path. Keeps the query string, which the
    /// Yandex callback page needs.
    Open(String),
    GoBack,
    ToggleHelp,
    OpenGoto,

    // ── Session ─────────────────────────────────────────────────────
    SignOut,
    /// A page signed the user in; refresh the header and move on.
    SignedIn(Route),
    /// Startup check of a stored session.
    SessionChecked(SessionCheck),

    // ── Network ─────────────────────────────────────────────────────
    Request(Request),
    Completed(FetchTicket, Completion),
}

/// Network work a page asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    DevicePage {
        ticket: FetchTicket,
        source: TableSource,
        query: TableQuery,
    },
    Device(String),
    SaveMqtt {
        id: String,
        settings: MqttSettings,
    },
    UnlinkYandex,
    SyncYandex,
    CreateDevice(DeviceCreate),
    DeviceLogs(String),
    Logs,
    Login {
        email: String,
        password: String,
    },
    Register {
        email: String,
        name: String,
        password: String,
    },
    YandexCallback(String),
    ReloadProfile,
}

impl Request {
    /// Name for logs. Credentials never reach the log file.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DevicePage { .. } => "device_page",
            Self::Device(_) => "device",
            Self::SaveMqtt { .. } => "save_mqtt",
            Self::UnlinkYandex => "unlink_yandex",
            Self::SyncYandex => "sync_yandex",
            Self::CreateDevice(_) => "create_device",
            Self::DeviceLogs(_) => "device_logs",
            Self::Logs => "logs",
            Self::Login { .. } => "login",
            Self::Register { .. } => "register",
            Self::YandexCallback(_) => "yandex_callback",
            Self::ReloadProfile => "reload_profile",
        }
    }
}

/// The answer to a [`Request`].
#[derive(Debug)]
pub enum Completion {
    DevicePage(FetchTicket, Result<DeviceList<DeviceRow>, CoreError>),
    Device(Result<Device, CoreError>),
    MqttSaved(Result<Device, CoreError>),
    Unlinked(Result<String, CoreError>),
    Synced(Result<Value, CoreError>),
    DeviceCreated(Result<Device, CoreError>),
    DeviceLogs(Result<DeviceLogs, CoreError>),
    Logs(Result<Vec<LogEntry>, CoreError>),
    SignedIn(Result<AuthOutcome, CoreError>),
    Registered(Result<UserProfile, CoreError>),
    Profile(Result<UserProfile, CoreError>),
}
