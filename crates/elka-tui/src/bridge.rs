//! Runs page requests against the [`Hub`] in background tasks.
//!
//! Each request runs inside the asking page's [`ViewScope`]. Leaving the
//! page abandons the work; anything that still finishes is stamped with
//! the page's ticket so the app can drop it.

use elka_core::{FetchTicket, Hub, ViewScope};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::action::{Action, Completion, Request};

pub fn spawn_request(
    hub: Hub,
    scope: ViewScope,
    page: FetchTicket,
    request: Request,
    action_tx: UnboundedSender<Action>,
) {
    tokio::spawn(async move {
        let Some(completion) = scope.run(perform(&hub, request)).await else {
            debug!("page left before its request finished");
            return;
        };
        let _ = action_tx.send(Action::Completed(page, completion));
    });
}

/// Check a stored session without tying it to a page.
pub fn spawn_session_check(hub: Hub, scope: ViewScope, action_tx: UnboundedSender<Action>) {
    tokio::spawn(async move {
        if let Some(check) = scope.run(hub.auth().revalidate()).await {
            let _ = action_tx.send(Action::SessionChecked(check));
        }
    });
}

async fn perform(hub: &Hub, request: Request) -> Completion {
    debug!(request = request.label(), "performing request");
    match request {
        Request::DevicePage {
            ticket,
            source,
            query,
        } => Completion::DevicePage(ticket, hub.table_page(source, query).await),
        Request::Device(id) => Completion::Device(hub.device(&id).await),
        Request::SaveMqtt { id, settings } => {
            Completion::MqttSaved(hub.update_mqtt(&id, settings).await)
        }
        Request::UnlinkYandex => Completion::Unlinked(hub.unlink_yandex().await),
        Request::SyncYandex => Completion::Synced(hub.sync_yandex_devices().await),
        Request::CreateDevice(body) => Completion::DeviceCreated(hub.create_device(&body).await),
        Request::DeviceLogs(id) => Completion::DeviceLogs(hub.device_logs(&id).await),
        Request::Logs => Completion::Logs(hub.logs().await),
        Request::Login { email, password } => {
            Completion::SignedIn(hub.auth().login(&email, &password).await)
        }
        Request::Register {
            email,
            name,
            password,
        } => Completion::Registered(hub.auth().register(&email, &name, &password).await),
        Request::YandexCallback(raw) => Completion::SignedIn(hub.auth().complete_yandex(&raw).await),
        Request::ReloadProfile => Completion::Profile(hub.auth().reload_profile().await),
    }
}
