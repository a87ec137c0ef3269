//! Page implementations. Each route maps to one top-level Component.

pub mod callback;
pub mod create;
pub mod detail;
pub mod device_logs;
pub mod devices;
pub mod home;
pub mod login;
pub mod logs;
pub mod not_found;
pub mod profile;
pub mod register;

use elka_core::{Hub, Route};

use crate::component::Component;

/// Build the page for `route`.
///
/// `raw` is the address as typed or pasted; only the Yandex callback
/// page reads it, for the query string the route drops.
pub fn create_screen(route: &Route, raw: &str, hub: &Hub) -> Box<dyn Component> {
    match route {
        Route::Home => Box::new(home::HomeScreen::new(hub.header())),
        Route::Login => Box::new(login::LoginScreen::new(
            hub.auth()
                .yandex_authorize_url()
                .ok()
                .map(|url| url.to_string()),
        )),
        Route::Register => Box::new(register::RegisterScreen::new()),
        Route::Profile => Box::new(profile::ProfileScreen::new(
            hub.profile_view().map_err(|e| e.to_string()),
        )),
        Route::Devices => Box::new(devices::DevicesScreen::new(hub.header().logged_in)),
        Route::DeviceCreate => Box::new(create::CreateScreen::new()),
        Route::DeviceDetail(id) => Box::new(detail::DetailScreen::new(id.clone())),
        Route::DeviceLogs(id) => Box::new(device_logs::DeviceLogsScreen::new(id.clone())),
        Route::Logs => Box::new(logs::LogsScreen::new()),
        Route::YandexCallback => Box::new(callback::CallbackScreen::new(raw)),
        Route::NotFound(path) => Box::new(not_found::NotFoundScreen::new(path.clone())),
    }
}
