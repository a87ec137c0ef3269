//! Client-side logic between `elka-api` and the front-ends (CLI / TUI).
//!
//! - **[`Hub`]**: facade wiring the API client to the session store; every
//!   page operation goes through it.
//! - **[`SessionManager`]**: tokens and cached profile over an injectable
//!   [`KeyValueStore`]. Implements [`elka_api::TokenSource`].
//! - **[`AuthService`]**: password login, registration, Yandex OAuth,
//!   logout, revalidation, and token refresh. Flows return the [`Route`]
//!   to show next instead of navigating.
//! - **View models** ([`listing`], [`pages`]): device table paging and
//!   sorting, detail/create/logs/profile page state, and the
//!   [`FetchTracker`] / [`ViewScope`] guards for async completions.

pub mod auth;
pub mod config;
pub mod error;
pub mod hub;
pub mod listing;
pub mod oauth;
pub mod pages;
pub mod route;
pub mod session;
pub mod storage;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{AuthOutcome, AuthService, LogoutOutcome, SessionCheck};
pub use config::{ClientConfig, OAuthConfig, TlsVerification};
pub use error::CoreError;
pub use hub::Hub;
pub use listing::{
    ClickOrigin, DeviceRow, DeviceTable, FetchTicket, FetchTracker, Loadable, TableQuery,
    TableSource, ViewScope,
};
pub use pages::{Banner, CreateDeviceForm, DeviceDetail, DeviceLogs, Header, MqttForm, ProfileView};
pub use route::Route;
pub use session::SessionManager;
pub use storage::{KeyValueStore, MemoryStore};

// Wire types front-ends use directly.
pub use elka_api::models;
