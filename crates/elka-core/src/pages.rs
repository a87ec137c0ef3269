// ── Page models ──
//
// State and transitions for the detail, create, logs, profile, and
// header views. Front-ends own input and rendering; these types own
// what may happen next and which message is shown.

use elka_api::ApiClient;
use elka_api::models::{
    Device, DeviceCommand, DeviceCreate, DeviceEvent, DeviceUpdate, MqttSettings, UserProfile,
};

use crate::error::CoreError;
use crate::listing::Loadable;
use crate::route::Route;
use crate::session::SessionManager;

pub const DEFAULT_ROOM: &str = "main";
pub const PROFILE_MISSING: &str = "User profile not found. Please ensure you are logged in.";
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
pub const REGISTER_FAILED: &str = "Registration failed. Please try again.";
pub const YANDEX_FAILED: &str = "Yandex OAuth failed. Please try again.";
pub const SYNC_FAILED: &str =
    "Failed to sync devices. Ensure you are logged in and have linked your Yandex account.";

/// The error's own message, or `fallback` when it has none.
pub fn message_or(err: &CoreError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_owned()
    } else {
        message
    }
}

/// Device count from a sync response: `{devices: [...]}`, `{count: N}`,
/// or a bare array.
pub fn synced_count(payload: &serde_json::Value) -> usize {
    if let Some(arr) = payload.as_array() {
        return arr.len();
    }
    if let Some(arr) = payload.get("devices").and_then(serde_json::Value::as_array) {
        return arr.len();
    }
    payload
        .get("count")
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

/// A success or error message shown above a page's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(String),
    Error(String),
}

impl Banner {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

// ── Device detail ────────────────────────────────────────────────────

/// Editable copy of a device's MQTT settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MqttForm {
    pub broker_address: String,
    pub username: String,
    pub password: String,
}

impl From<Option<&MqttSettings>> for MqttForm {
    fn from(settings: Option<&MqttSettings>) -> Self {
        settings.map_or_else(Self::default, |s| Self {
            broker_address: s.broker_address.clone(),
            username: s.username.clone(),
            password: s.password.clone(),
        })
    }
}

impl MqttForm {
    pub fn to_settings(&self) -> MqttSettings {
        MqttSettings {
            broker_address: self.broker_address.trim().to_owned(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// The device detail page: loaded device, MQTT form, and the two
/// mutating actions (save settings, unlink). While an action is in
/// flight the page is busy and both controls are disabled.
#[derive(Debug, Clone)]
pub struct DeviceDetail {
    pub id: String,
    pub device: Loadable<Device>,
    pub form: MqttForm,
    busy: bool,
    banner: Option<Banner>,
}

impl DeviceDetail {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            device: Loadable::Loading,
            form: MqttForm::default(),
            busy: false,
            banner: None,
        }
    }

    /// Apply the initial fetch.
    pub fn load(&mut self, result: Result<Device, CoreError>) {
        if let Ok(ref device) = result {
            self.form = MqttForm::from(device.mqtt_settings.as_ref());
        }
        self.device = Loadable::from_result(result);
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn controls_enabled(&self) -> bool {
        !self.busy && self.device.loaded().is_some()
    }

    /// Start saving; returns the update to send, or `None` if the page
    /// cannot act right now.
    pub fn begin_save(&mut self) -> Option<DeviceUpdate> {
        if !self.controls_enabled() {
            return None;
        }
        self.busy = true;
        self.banner = None;
        Some(DeviceUpdate::mqtt(self.form.to_settings()))
    }

    pub fn finish_save(&mut self, result: Result<Device, CoreError>) {
        self.busy = false;
        match result {
            Ok(device) => {
                self.form = MqttForm::from(device.mqtt_settings.as_ref());
                self.device = Loadable::Loaded(device);
                self.banner = Some(Banner::Success("MQTT settings saved.".into()));
            }
            Err(e) => {
                self.banner = Some(Banner::Error(format!("Failed to save MQTT settings: {e}")));
            }
        }
    }

    /// Start unlinking; `false` if the page cannot act right now.
    pub fn begin_unlink(&mut self) -> bool {
        if !self.controls_enabled() {
            return false;
        }
        self.busy = true;
        self.banner = None;
        true
    }

    pub fn finish_unlink(&mut self, result: Result<String, CoreError>) {
        self.busy = false;
        self.banner = Some(match result {
            Ok(message) if message.is_empty() || message == "OK" => {
                Banner::Success("Device unlinked.".into())
            }
            Ok(message) => Banner::Success(message),
            Err(e) => Banner::Error(format!("Failed to unlink device: {e}")),
        });
    }
}

// ── Create form ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CreateDeviceForm {
    pub name: String,
    pub serial_number: String,
    pub room: String,
    busy: bool,
    error: Option<String>,
}

impl Default for CreateDeviceForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            serial_number: String::new(),
            room: DEFAULT_ROOM.into(),
            busy: false,
            error: None,
        }
    }
}

impl CreateDeviceForm {
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Name and serial number are required; an empty room becomes "main".
    pub fn validate(&self) -> Result<DeviceCreate, CoreError> {
        let name = self.name.trim();
        let serial_number = self.serial_number.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Device name is required".into(),
            });
        }
        if serial_number.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "Serial number is required".into(),
            });
        }
        let room = match self.room.trim() {
            "" => DEFAULT_ROOM,
            room => room,
        };
        Ok(DeviceCreate {
            name: name.to_owned(),
            serial_number: serial_number.to_owned(),
            room: room.to_owned(),
        })
    }

    /// Validate and mark busy. Validation errors are shown on the form.
    pub fn begin_submit(&mut self) -> Option<DeviceCreate> {
        if self.busy {
            return None;
        }
        match self.validate() {
            Ok(body) => {
                self.busy = true;
                self.error = None;
                Some(body)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// On success the page moves to the device list.
    pub fn finish_submit(&mut self, result: Result<Device, CoreError>) -> Option<Route> {
        self.busy = false;
        match result {
            Ok(_) => Some(Route::Devices),
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

// ── Logs ─────────────────────────────────────────────────────────────

/// Both halves of a device's log page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceLogs {
    pub commands: Vec<DeviceCommand>,
    pub events: Vec<DeviceEvent>,
}

impl DeviceLogs {
    /// Fetch commands and events together; either failing fails the page.
    pub async fn fetch(api: &ApiClient, device_id: &str) -> Result<Self, CoreError> {
        let (commands, events) = futures::future::try_join(
            api.device_commands(device_id),
            api.device_events(device_id),
        )
        .await?;
        Ok(Self { commands, events })
    }
}

// ── Profile ──────────────────────────────────────────────────────────

/// What the profile page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
    pub yandex_linked: bool,
}

impl From<&UserProfile> for ProfileView {
    fn from(p: &UserProfile) -> Self {
        Self {
            name: p.name.clone(),
            email: p.email.clone(),
            role: p.role_label().to_owned(),
            is_admin: p.is_admin(),
            yandex_linked: p.has_yandex(),
        }
    }
}

impl ProfileView {
    /// Read from the session cache only; no request is made.
    pub fn from_session(session: &SessionManager) -> Result<Self, CoreError> {
        session
            .cached_profile()
            .map(|p| Self::from(&p))
            .ok_or_else(|| CoreError::InvalidResponse {
                message: PROFILE_MISSING.into(),
            })
    }
}

// ── Header ───────────────────────────────────────────────────────────

/// Navigation and auth state shown on every page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub logged_in: bool,
    pub is_admin: bool,
    pub display_name: Option<String>,
}

impl Header {
    pub fn from_session(session: &SessionManager) -> Self {
        if !session.is_logged_in() {
            return Self::default();
        }
        let profile = session.cached_profile();
        Self {
            logged_in: true,
            is_admin: profile.as_ref().is_some_and(UserProfile::is_admin),
            display_name: profile.map(|p| if p.name.is_empty() { p.email } else { p.name }),
        }
    }

    /// Navigation entries as `(label, route)`.
    pub fn nav(&self) -> Vec<(&'static str, Route)> {
        let mut items = vec![("Home", Route::Home), ("Devices", Route::Devices)];
        if self.logged_in {
            items.push(("Logs", Route::Logs));
            items.push(("My Profile", Route::Profile));
        } else {
            items.push(("Sign In", Route::Login));
            items.push(("Sign Up", Route::Register));
        }
        items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStore;

    fn device(mqtt: Option<serde_json::Value>) -> Device {
        let mut raw = json!({"id": 1, "name": "Bedroom", "serial_number": "SN-1"});
        if let Some(m) = mqtt {
            raw["mqtt_settings"] = m;
        }
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn detail_form_starts_from_device_settings() {
        let mut page = DeviceDetail::new("SN-1");
        assert!(!page.controls_enabled());
        page.load(Ok(device(Some(
            json!({"broker_address": "mqtt://b:1883", "username": "u", "password": "p"}),
        ))));
        assert_eq!(page.form.broker_address, "mqtt://b:1883");
        assert!(page.controls_enabled());
    }

    #[test]
    fn save_is_exclusive_and_reports() {
        let mut page = DeviceDetail::new("SN-1");
        page.load(Ok(device(None)));
        page.form.broker_address = " mqtt://new:1883 ".into();

        let update = page.begin_save().unwrap();
        assert_eq!(
            update.mqtt_settings.unwrap().broker_address,
            "mqtt://new:1883"
        );
        assert!(page.is_busy());
        assert!(page.begin_save().is_none());
        assert!(!page.begin_unlink());

        page.finish_save(Err(CoreError::Api {
            message: "Not enough permissions".into(),
            status: Some(403),
        }));
        assert!(!page.is_busy());
        assert_eq!(
            page.banner(),
            Some(&Banner::Error(
                "Failed to save MQTT settings: Not enough permissions".into()
            ))
        );

        assert!(page.begin_unlink());
        page.finish_unlink(Ok("OK".into()));
        assert_eq!(page.banner(), Some(&Banner::Success("Device unlinked.".into())));
    }

    #[test]
    fn create_form_requires_name_and_serial() {
        let mut form = CreateDeviceForm::default();
        assert_eq!(form.room, "main");
        assert!(form.begin_submit().is_none());
        assert_eq!(
            form.error(),
            Some("Validation failed: Device name is required")
        );

        form.name = "Kitchen".into();
        form.serial_number = "SN-9".into();
        form.room.clear();
        let body = form.begin_submit().unwrap();
        assert_eq!(body.room, "main");
        assert!(form.is_busy());

        let next = form.finish_submit(Ok(device(None)));
        assert_eq!(next, Some(Route::Devices));
    }

    #[test]
    fn profile_view_defaults_role() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store);
        assert_eq!(
            ProfileView::from_session(&session).unwrap_err().to_string(),
            PROFILE_MISSING
        );

        let profile: UserProfile =
            serde_json::from_value(json!({"id": 1, "email": "a@b.c", "name": "Ann"})).unwrap();
        session.save_tokens("a", "r").unwrap();
        session.set_cached_profile(&profile).unwrap();
        let view = ProfileView::from_session(&session).unwrap();
        assert_eq!(view.role, "User");
        assert!(!view.yandex_linked);
    }

    #[test]
    fn header_reflects_session() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store);
        let header = Header::from_session(&session);
        assert!(!header.logged_in);
        assert!(header.nav().iter().any(|(_, r)| *r == Route::Login));

        session.save_tokens("a", "r").unwrap();
        let profile: UserProfile = serde_json::from_value(
            json!({"id": 1, "email": "root@b.c", "name": "", "is_admin": true}),
        )
        .unwrap();
        session.set_cached_profile(&profile).unwrap();

        let header = Header::from_session(&session);
        assert!(header.logged_in && header.is_admin);
        assert_eq!(header.display_name.as_deref(), Some("root@b.c"));
        assert!(header.nav().iter().any(|(_, r)| *r == Route::Profile));
    }

    #[test]
    fn sync_count_shapes() {
        assert_eq!(synced_count(&json!([1, 2])), 2);
        assert_eq!(synced_count(&json!({"devices": [{}, {}, {}]})), 3);
        assert_eq!(synced_count(&json!({"count": 4})), 4);
        assert_eq!(synced_count(&json!({"status": "ok"})), 0);
    }

    #[test]
    fn empty_messages_fall_back() {
        let silent = CoreError::Api {
            message: String::new(),
            status: Some(500),
        };
        assert_eq!(message_or(&silent, LOGIN_FAILED), LOGIN_FAILED);
        let loud = CoreError::Api {
            message: "Incorrect email or password".into(),
            status: Some(401),
        };
        assert_eq!(message_or(&loud, LOGIN_FAILED), "Incorrect email or password");
    }
}
