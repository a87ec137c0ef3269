// ── Hub ──
//
// Single entry point for front-ends: wires the API client to the session
// store and exposes the operations pages need. Cheap to clone.

use std::sync::Arc;

use elka_api::models::{
    Device, DeviceCreate, DeviceList, DeviceQuery, DeviceUpdate, ListDevicesParams, LogEntry,
    MqttSettings, Pagination, UserDevice, UserProfile,
};
use elka_api::{ApiClient, TokenSource};
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthService;
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::listing::{DeviceRow, TableQuery, TableSource, rows_from};
use crate::pages::{DeviceLogs, Header, ProfileView};
use crate::session::SessionManager;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

#[derive(Debug)]
struct HubInner {
    config: ClientConfig,
    api: ApiClient,
    session: SessionManager,
    auth: AuthService,
}

impl Hub {
    /// Build the HTTP client and session layer. Does not touch the network.
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, CoreError> {
        let session = SessionManager::new(store);
        let tokens: Arc<dyn TokenSource> = Arc::new(session.clone());
        let api = ApiClient::new(
            &config.base_url,
            &config.api_prefix,
            &config.transport(),
            tokens,
        )?;
        let auth = AuthService::new(api.clone(), session.clone(), config.oauth.clone());
        debug!(base_url = %config.base_url, "hub ready");

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                api,
                session,
                auth,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn header(&self) -> Header {
        Header::from_session(&self.inner.session)
    }

    pub fn profile_view(&self) -> Result<ProfileView, CoreError> {
        ProfileView::from_session(&self.inner.session)
    }

    pub fn cached_profile(&self) -> Option<UserProfile> {
        self.inner.session.cached_profile()
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn device(&self, id: &str) -> Result<Device, CoreError> {
        Ok(self.inner.api.get_device(id).await?)
    }

    pub async fn list_devices(
        &self,
        params: &ListDevicesParams,
    ) -> Result<DeviceList<Device>, CoreError> {
        Ok(self.inner.api.list_devices(params).await?)
    }

    pub async fn my_devices(&self, page: Pagination) -> Result<DeviceList<UserDevice>, CoreError> {
        Ok(self.inner.api.user_devices(page).await?)
    }

    /// One page of the device table, as rows.
    pub async fn table_page(
        &self,
        source: TableSource,
        query: TableQuery,
    ) -> Result<DeviceList<DeviceRow>, CoreError> {
        match source {
            TableSource::All => Ok(rows_from(&self.list_devices(&query.to_params()).await?)),
            TableSource::Mine => Ok(rows_from(&self.my_devices(query.pagination()).await?)),
        }
    }

    pub async fn query_devices(&self, query: &DeviceQuery) -> Result<DeviceList<Device>, CoreError> {
        Ok(self.inner.api.query_user_devices(query).await?)
    }

    pub async fn create_device(&self, device: &DeviceCreate) -> Result<Device, CoreError> {
        Ok(self.inner.api.create_device(device).await?)
    }

    pub async fn update_device(&self, id: &str, update: &DeviceUpdate) -> Result<Device, CoreError> {
        Ok(self.inner.api.update_device(id, update).await?)
    }

    pub async fn update_mqtt(&self, id: &str, settings: MqttSettings) -> Result<Device, CoreError> {
        self.update_device(id, &DeviceUpdate::mqtt(settings)).await
    }

    pub async fn delete_device(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.inner.api.delete_device(id).await?)
    }

    /// Detach the Yandex account; returns the server's message.
    pub async fn unlink_yandex(&self) -> Result<String, CoreError> {
        Ok(self.inner.api.unlink_yandex().await?.message)
    }

    pub async fn sync_yandex_devices(&self) -> Result<Value, CoreError> {
        Ok(self.inner.api.sync_yandex_devices().await?)
    }

    // ── Logs & admin ─────────────────────────────────────────────────

    pub async fn device_logs(&self, id: &str) -> Result<DeviceLogs, CoreError> {
        DeviceLogs::fetch(&self.inner.api, id).await
    }

    pub async fn logs(&self) -> Result<Vec<LogEntry>, CoreError> {
        Ok(self.inner.api.logs().await?)
    }

    pub async fn admin_users(&self, page: Pagination) -> Result<Vec<UserProfile>, CoreError> {
        Ok(self.inner.api.admin_list_users(page).await?)
    }
}
