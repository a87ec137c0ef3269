// Wire types for the device service REST API.
//
// Field names follow the server's JSON (snake_case). Most fields are
// optional because the server omits them freely; unknown profile fields
// are kept in `extra` so a cached profile round-trips losslessly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};

// ── Auth ─────────────────────────────────────────────────────────────

/// Login / refresh response. Both tokens are optional on the wire so
/// that a malformed response can be detected instead of failing to parse.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A complete access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenResponse {
    /// Both tokens, or `None` if either is missing or empty.
    pub fn into_pair(self) -> Option<TokenPair> {
        match (self.access_token, self.refresh_token) {
            (Some(access_token), Some(refresh_token))
                if !access_token.is_empty() && !refresh_token.is_empty() =>
            {
                Some(TokenPair {
                    access_token,
                    refresh_token,
                })
            }
            _ => None,
        }
    }
}

/// Response of the Yandex OAuth code exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthExchangeResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password: &'a str,
}

/// Partial profile update (`PATCH /auth/profile`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Generic `{ "message": "..." }` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Message {
    #[serde(default)]
    pub message: String,
}

// ── Users ────────────────────────────────────────────────────────────

/// A user profile as returned by `/auth/profile`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yandex_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Admin flag as the UI understands it.
    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(false) || self.is_superuser
    }

    /// Role label, defaulting to "User".
    pub fn role_label(&self) -> &str {
        self.role.as_deref().unwrap_or("User")
    }

    /// Whether a Yandex account is linked.
    pub fn has_yandex(&self) -> bool {
        self.yandex_id.is_some()
    }
}

// ── Devices ──────────────────────────────────────────────────────────

/// MQTT broker settings attached to a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MqttSettings {
    #[serde(default)]
    pub broker_address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// A device as returned by the `/devices` endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub custom_data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqtt_settings: Option<MqttSettings>,
}

impl Device {
    /// Owner label: email, then name, then "N/A".
    pub fn owner_label(&self) -> &str {
        self.owner
            .as_ref()
            .map(|o| {
                if o.email.is_empty() {
                    o.name.as_str()
                } else {
                    o.email.as_str()
                }
            })
            .filter(|s| !s.is_empty())
            .unwrap_or("N/A")
    }
}

/// Body for `POST /devices/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCreate {
    pub name: String,
    pub serial_number: String,
    pub room: String,
}

/// Body for `PUT /devices/{id}`. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mqtt_settings: Option<MqttSettings>,
}

impl DeviceUpdate {
    /// An update that only replaces the MQTT settings.
    pub fn mqtt(settings: MqttSettings) -> Self {
        Self {
            mqtt_settings: Some(settings),
            ..Self::default()
        }
    }
}

/// Filter body for `POST /user/devices/query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// A flat device list with a total count.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceList<T> {
    pub devices: Vec<T>,
    pub total: u64,
}

impl<T> Default for DeviceList<T> {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            total: 0,
        }
    }
}

// ── User device payload (smart-home provider shape) ─────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusInfo {
    #[serde(default)]
    pub reportable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub hw_version: String,
    #[serde(default)]
    pub sw_version: String,
}

/// A device in the nested `GET /user/devices` payload.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserDevice {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub room: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default)]
    pub status_info: StatusInfo,
    #[serde(default)]
    pub custom_data: Map<String, Value>,
    #[serde(default)]
    pub capabilities: Vec<Value>,
    #[serde(default)]
    pub properties: Vec<Value>,
    #[serde(default)]
    pub device_info: DeviceInfo,
}

// ── Logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceCommand {
    pub id: i64,
    #[serde(default)]
    pub command_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceEvent {
    pub id: i64,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandsResponse {
    #[serde(default)]
    pub commands: Vec<DeviceCommand>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<DeviceEvent>,
}

/// One line of the global log view.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl LogEntry {
    /// Device name, falling back to the raw device id.
    pub fn device_label(&self) -> String {
        if let Some(name) = self.device_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        match &self.device_id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

// ── Listing parameters ───────────────────────────────────────────────

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Sortable device fields accepted by `GET /devices/`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviceSortField {
    Id,
    #[default]
    Name,
    SerialNumber,
    Status,
    LastSeen,
    UserId,
    CreatedAt,
    UpdatedAt,
}

/// Query parameters for `GET /devices/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDevicesParams {
    pub skip: u64,
    pub limit: Option<u64>,
    pub name: Option<String>,
    pub user_id: Option<i64>,
    pub sort_field: Option<DeviceSortField>,
    pub sort_direction: Option<SortDirection>,
}

impl ListDevicesParams {
    /// Query pairs with unset parameters omitted.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut q = vec![("skip".to_owned(), self.skip.to_string())];
        if let Some(limit) = self.limit {
            q.push(("limit".into(), limit.to_string()));
        }
        if let Some(ref name) = self.name {
            q.push(("name".into(), name.clone()));
        }
        if let Some(user_id) = self.user_id {
            q.push(("user_id".into(), user_id.to_string()));
        }
        if let Some(field) = self.sort_field {
            q.push(("sort_field".into(), field.to_string()));
        }
        if let Some(direction) = self.sort_direction {
            q.push(("sort_direction".into(), direction.to_string()));
        }
        q
    }
}

/// `skip`/`limit` pagination for endpoints without sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

impl Pagination {
    pub fn to_query(self) -> Vec<(String, String)> {
        vec![
            ("skip".into(), self.skip.to_string()),
            ("limit".into(), self.limit.to_string()),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn token_pair_requires_both_tokens() {
        let full: TokenResponse =
            serde_json::from_value(json!({"access_token": "a", "refresh_token": "r"})).unwrap();
        assert_eq!(
            full.into_pair(),
            Some(TokenPair {
                access_token: "a".into(),
                refresh_token: "r".into()
            })
        );

        let partial: TokenResponse =
            serde_json::from_value(json!({"access_token": "a", "token_type": "bearer"})).unwrap();
        assert_eq!(partial.into_pair(), None);

        let empty: TokenResponse =
            serde_json::from_value(json!({"access_token": "", "refresh_token": "r"})).unwrap();
        assert_eq!(empty.into_pair(), None);
    }

    #[test]
    fn profile_keeps_unknown_fields() {
        let raw = json!({
            "id": 7,
            "email": "ann@example.com",
            "name": "Ann",
            "is_superuser": false,
            "yandex_oauth_token_expires_at": null,
            "theme": "dark"
        });
        let profile: UserProfile = serde_json::from_value(raw).unwrap();
        assert_eq!(profile.role_label(), "User");
        assert!(!profile.is_admin());
        assert_eq!(profile.extra.get("theme"), Some(&json!("dark")));

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["theme"], json!("dark"));
    }

    #[test]
    fn admin_flag_from_either_field() {
        let mut profile: UserProfile =
            serde_json::from_value(json!({"id": 1, "email": "a@b.c", "is_admin": true})).unwrap();
        assert!(profile.is_admin());
        profile.is_admin = None;
        profile.is_superuser = true;
        assert!(profile.is_admin());
    }

    #[test]
    fn device_owner_label_falls_back() {
        let mut device: Device = serde_json::from_value(json!({
            "id": 1,
            "name": "Bedroom",
            "serial_number": "SN-1",
            "type": "devices.types.openable.curtain"
        }))
        .unwrap();
        assert_eq!(device.owner_label(), "N/A");
        assert_eq!(
            device.device_type.as_deref(),
            Some("devices.types.openable.curtain")
        );

        device.owner = Some(
            serde_json::from_value(json!({"id": 2, "email": "", "name": "Bob"})).unwrap(),
        );
        assert_eq!(device.owner_label(), "Bob");
    }

    #[test]
    fn list_params_omit_unset_fields() {
        let params = ListDevicesParams {
            skip: 40,
            limit: Some(20),
            sort_field: Some(DeviceSortField::SerialNumber),
            sort_direction: Some(SortDirection::Desc),
            ..ListDevicesParams::default()
        };
        assert_eq!(
            params.to_query(),
            vec![
                ("skip".to_owned(), "40".to_owned()),
                ("limit".to_owned(), "20".to_owned()),
                ("sort_field".to_owned(), "serial_number".to_owned()),
                ("sort_direction".to_owned(), "desc".to_owned()),
            ]
        );
    }

    #[test]
    fn device_update_sends_only_set_fields() {
        let update = DeviceUpdate::mqtt(MqttSettings {
            broker_address: "mqtt://broker:1883".into(),
            username: "u".into(),
            password: "p".into(),
        });
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(
            body,
            json!({"mqtt_settings": {"broker_address": "mqtt://broker:1883", "username": "u", "password": "p"}})
        );
    }

    #[test]
    fn log_entry_label_prefers_name() {
        let entry: LogEntry =
            serde_json::from_value(json!({"device_id": 12, "message": "opened"})).unwrap();
        assert_eq!(entry.device_label(), "12");
        let entry: LogEntry = serde_json::from_value(
            json!({"device_id": 12, "device_name": "Kitchen", "message": "opened"}),
        )
        .unwrap();
        assert_eq!(entry.device_label(), "Kitchen");
    }
}
