// elka-api: async client for the Elka smart-window device service

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod transport;
pub mod users;

pub use client::{
    Anonymous, ApiClient, DEFAULT_API_PREFIX, RequestOptions, StaticToken, TokenSource,
};
pub use devices::normalize_user_devices;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
