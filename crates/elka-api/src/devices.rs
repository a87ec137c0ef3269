// Device, user-device, and log endpoints.

use serde_json::Value;
use tracing::warn;

use crate::client::{ApiClient, RequestOptions};
use crate::models::{
    CommandsResponse, Device, DeviceCommand, DeviceCreate, DeviceEvent, DeviceList, DeviceQuery,
    DeviceUpdate, EventsResponse, ListDevicesParams, LogEntry, Message, Pagination, UserDevice,
};
use crate::Error;

fn device_path(id: &str) -> String {
    format!("/devices/{id}")
}

impl ApiClient {
    // ── Devices ──────────────────────────────────────────────────────

    /// `GET /devices/{id}` (public).
    pub async fn get_device(&self, id: &str) -> Result<Device, Error> {
        self.get(&device_path(id), Vec::new(), false).await
    }

    /// `GET /devices/` with paging, filtering, and sorting (public).
    pub async fn list_devices(
        &self,
        params: &ListDevicesParams,
    ) -> Result<DeviceList<Device>, Error> {
        self.get("/devices/", params.to_query(), false).await
    }

    /// `POST /devices/`
    pub async fn create_device(&self, device: &DeviceCreate) -> Result<Device, Error> {
        self.post("/devices/", device, true).await
    }

    /// `PUT /devices/{id}`
    pub async fn update_device(&self, id: &str, update: &DeviceUpdate) -> Result<Device, Error> {
        self.put(&device_path(id), update, true).await
    }

    /// `DELETE /devices/{id}`. The server answers 204.
    pub async fn delete_device(&self, id: &str) -> Result<(), Error> {
        self.delete(&device_path(id), true).await
    }

    // ── User devices ─────────────────────────────────────────────────

    /// `GET /user/devices`, flattened into a [`DeviceList`].
    ///
    /// The server only returns the current page, so `total` is the page
    /// length rather than the full count.
    pub async fn user_devices(&self, page: Pagination) -> Result<DeviceList<UserDevice>, Error> {
        let opts = RequestOptions::get().query(page.to_query());
        let raw: Option<Value> = self.fetch("/user/devices", opts, true).await?;
        Ok(normalize_user_devices(raw.unwrap_or(Value::Null)))
    }

    /// `POST /user/devices/query`
    pub async fn query_user_devices(
        &self,
        query: &DeviceQuery,
    ) -> Result<DeviceList<Device>, Error> {
        self.post("/user/devices/query", query, true).await
    }

    /// `POST /auth/profile/yandex-iot/sync-devices`. Returns the synced
    /// devices as the server reports them.
    pub async fn sync_yandex_devices(&self) -> Result<Value, Error> {
        let opts = RequestOptions::with_method(reqwest::Method::POST);
        let body: Option<Value> = self
            .fetch("/auth/profile/yandex-iot/sync-devices", opts, true)
            .await?;
        Ok(body.unwrap_or(Value::Null))
    }

    /// `POST /user/unlink`: detach the Yandex account.
    pub async fn unlink_yandex(&self) -> Result<Message, Error> {
        let opts = RequestOptions::with_method(reqwest::Method::POST);
        let body: Option<Message> = self.fetch("/user/unlink", opts, true).await?;
        Ok(body.unwrap_or_default())
    }

    // ── Logs ─────────────────────────────────────────────────────────

    /// `GET /devices/{id}/commands`
    pub async fn device_commands(&self, id: &str) -> Result<Vec<DeviceCommand>, Error> {
        let path = format!("{}/commands", device_path(id));
        let resp: CommandsResponse = self.get(&path, Vec::new(), true).await?;
        Ok(resp.commands)
    }

    /// `GET /devices/{id}/events`
    pub async fn device_events(&self, id: &str) -> Result<Vec<DeviceEvent>, Error> {
        let path = format!("{}/events", device_path(id));
        let resp: EventsResponse = self.get(&path, Vec::new(), true).await?;
        Ok(resp.events)
    }

    /// `GET /logs`
    pub async fn logs(&self) -> Result<Vec<LogEntry>, Error> {
        self.get("/logs", Vec::new(), true).await
    }
}

/// Flatten the nested `{ payload: { devices: [...] } }` response.
///
/// Any other shape yields an empty list. Entries that do not parse are
/// skipped.
pub fn normalize_user_devices(raw: Value) -> DeviceList<UserDevice> {
    let Some(Value::Array(items)) = raw
        .get("payload")
        .and_then(|p| p.get("devices"))
        .cloned()
    else {
        return DeviceList::default();
    };

    let devices: Vec<UserDevice> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(device) => Some(device),
            Err(e) => {
                warn!("skipping malformed user device: {e}");
                None
            }
        })
        .collect();

    let total = u64::try_from(devices.len()).unwrap_or(u64::MAX);
    DeviceList { devices, total }
}
