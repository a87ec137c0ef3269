#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use elka_api::models::{
    DeviceCreate, DeviceSortField, DeviceUpdate, ListDevicesParams, MqttSettings, Pagination,
    SortDirection,
};
use elka_api::{Anonymous, ApiClient, Error, RequestOptions, StaticToken, TokenSource};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(tokens: Arc<dyn TokenSource>) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client =
        ApiClient::from_reqwest(&server.uri(), "/api/v1", reqwest::Client::new(), tokens).unwrap();
    (server, client)
}

async fn setup() -> (MockServer, ApiClient) {
    setup_with(Arc::new(StaticToken(SecretString::from("tok-123")))).await
}

async fn setup_anonymous() -> (MockServer, ApiClient) {
    setup_with(Arc::new(Anonymous)).await
}

fn device_json(id: i64, serial: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Window {id}"),
        "serial_number": serial,
        "room": "main",
        "status": "online",
        "user_id": 7,
        "owner": {"id": 7, "email": "ann@example.com", "name": "Ann"},
        "custom_data": {}
    })
}

// ── Wrapper behaviour ───────────────────────────────────────────────

#[tokio::test]
async fn test_auth_required_without_token_sends_nothing() {
    let (server, client) = setup_anonymous().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.get_profile().await;
    assert!(matches!(result, Err(Error::AuthRequired)), "got: {result:?}");
    assert_eq!(result.unwrap_err().to_string(), "Authentication required");
}

#[tokio::test]
async fn test_bearer_and_json_headers_are_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/profile"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 7, "email": "ann@example.com", "name": "Ann"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let profile = client.get_profile().await.unwrap();
    assert_eq!(profile.name, "Ann");
}

#[tokio::test]
async fn test_public_endpoint_omits_authorization() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/SN-1"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/SN-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json(1, "SN-1")))
        .mount(&server)
        .await;

    let device = client.get_device("SN-1").await.unwrap();
    assert_eq!(device.serial_number, "SN-1");
    assert_eq!(device.owner_label(), "ann@example.com");
}

#[tokio::test]
async fn test_caller_headers_override_defaults() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/echo"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let opts = RequestOptions::with_method(reqwest::Method::POST)
        .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    let body: Option<Value> = client.fetch("/echo", opts, false).await.unwrap();
    assert_eq!(body, Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_no_content_yields_none() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/devices/SN-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body: Option<Value> = client
        .fetch("/devices/SN-1", RequestOptions::delete(), true)
        .await
        .unwrap();
    assert!(body.is_none());
    client.delete_device("SN-1").await.unwrap();
}

#[tokio::test]
async fn test_error_uses_first_detail_message() {
    let (server, client) = setup_anonymous().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"}]
        })))
        .mount(&server)
        .await;

    let err = client.login("nope", "pw").await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "value is not a valid email address");
}

#[tokio::test]
async fn test_error_with_unparsable_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/logs"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = client.logs().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 502");
}

#[tokio::test]
async fn test_error_with_string_detail() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Device not found"})))
        .mount(&server)
        .await;

    let err = client.get_device("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Device not found");
}

#[tokio::test]
async fn test_unauthorized_status_is_detected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/profile"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(&server)
        .await;

    let err = client.get_profile().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client =
        ApiClient::from_reqwest(&uri, "/api/v1", reqwest::Client::new(), Arc::new(Anonymous))
            .unwrap();
    let err = client.get_device("SN-1").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_connection());
}

// ── Device endpoints ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_sends_paging_and_sort() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "20"))
        .and(query_param("sort_field", "name"))
        .and(query_param("sort_direction", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [device_json(21, "SN-21"), device_json(22, "SN-22")],
            "total": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = ListDevicesParams {
        skip: 20,
        limit: Some(20),
        sort_field: Some(DeviceSortField::Name),
        sort_direction: Some(SortDirection::Desc),
        ..ListDevicesParams::default()
    };
    let list = client.list_devices(&params).await.unwrap();
    assert_eq!(list.total, 42);
    assert_eq!(list.devices.len(), 2);
}

#[tokio::test]
async fn test_create_device_posts_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/"))
        .and(body_json(json!({"name": "Window 5", "serial_number": "SN-5", "room": "main"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(device_json(5, "SN-5")))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_device(&DeviceCreate {
            name: "Window 5".into(),
            serial_number: "SN-5".into(),
            room: "main".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.id, 5);
}

#[tokio::test]
async fn test_update_device_sends_mqtt_settings() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/SN-1"))
        .and(body_json(json!({"mqtt_settings": {
            "broker_address": "mqtt://10.0.0.2:1883", "username": "elka", "password": "s3cret"
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json(1, "SN-1")))
        .expect(1)
        .mount(&server)
        .await;

    let update = DeviceUpdate::mqtt(MqttSettings {
        broker_address: "mqtt://10.0.0.2:1883".into(),
        username: "elka".into(),
        password: "s3cret".into(),
    });
    client.update_device("SN-1", &update).await.unwrap();
}

#[tokio::test]
async fn test_user_devices_are_normalized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/devices"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "r-1",
            "payload": {"user_id": "7", "devices": [
                {"id": "1", "name": "Kitchen", "room": "main", "type": "devices.types.openable.curtain"}
            ]}
        })))
        .mount(&server)
        .await;

    let list = client.user_devices(Pagination::default()).await.unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.devices[0].id, "1");
}

#[tokio::test]
async fn test_device_logs_endpoints() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/devices/SN-1/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"commands": [
            {"id": 1, "command_type": "open", "status": "completed",
             "created_at": "2024-05-01T10:00:00Z", "completed_at": "2024-05-01T10:00:02Z"}
        ]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/SN-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"events": [
            {"id": 9, "event_type": "state", "message": "opened", "created_at": "2024-05-01T10:00:02Z"}
        ]})))
        .mount(&server)
        .await;

    let commands = client.device_commands("SN-1").await.unwrap();
    let events = client.device_events("SN-1").await.unwrap();
    assert_eq!(commands[0].command_type, "open");
    assert!(commands[0].completed_at.is_some());
    assert_eq!(events[0].message, "opened");
}

// ── Auth endpoints ──────────────────────────────────────────────────

#[tokio::test]
async fn test_yandex_callback_uses_absolute_path() {
    let (server, client) = setup_anonymous().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/auth/yandex/callback"))
        .and(body_json(json!({"code": "abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a",
            "refresh_token": "r",
            "user_profile": {"id": 7, "email": "ann@example.com", "name": "Ann"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.yandex_callback("abc").await.unwrap();
    assert_eq!(resp.access_token.as_deref(), Some("a"));
    assert_eq!(resp.user_profile.unwrap().id, 7);
}

#[tokio::test]
async fn test_yandex_callback_error_message() {
    let (server, client) = setup_anonymous().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/auth/yandex/callback"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid code"})))
        .mount(&server)
        .await;

    let err = client.yandex_callback("stale").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid code");
}

#[tokio::test]
async fn test_refresh_posts_refresh_token() {
    let (server, client) = setup_anonymous().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({"refresh_token": "r-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a-2", "refresh_token": "r-2", "token_type": "bearer"
        })))
        .mount(&server)
        .await;

    let pair = client.refresh("r-1").await.unwrap().into_pair().unwrap();
    assert_eq!(pair.access_token, "a-2");
    assert_eq!(pair.refresh_token, "r-2");
}

#[tokio::test]
async fn test_admin_users_accepts_plain_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/admin/users/"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "email": "root@example.com", "name": "Root", "is_superuser": true}
        ])))
        .mount(&server)
        .await;

    let users = client
        .admin_list_users(Pagination { skip: 0, limit: 50 })
        .await
        .unwrap();
    assert!(users[0].is_admin());
}
