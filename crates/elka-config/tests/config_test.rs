#![allow(clippy::unwrap_used)]
// File-backed config and session storage tests.

use std::collections::HashMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use elka_config::{
    Config, FileStore, Profile, SessionBackend, load_config_from, resolve_profile, save_config_to,
};
use elka_core::session::{ACCESS_TOKEN_KEY, USER_PROFILE_KEY};
use elka_core::{KeyValueStore, SessionManager};

#[test]
fn file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let store = FileStore::open(&path).unwrap();
    store.set(ACCESS_TOKEN_KEY, "a-1").unwrap();
    store.set("refreshToken", "r-1").unwrap();
    drop(store);

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a-1"));
    reopened.remove(ACCESS_TOKEN_KEY).unwrap();
    drop(reopened);

    let again = FileStore::open(&path).unwrap();
    assert_eq!(again.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(again.get("refreshToken").unwrap().as_deref(), Some("r-1"));
}

#[test]
fn corrupt_session_file_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
}

#[test]
fn session_manager_over_file_store_clears_everything() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let session = SessionManager::new(Arc::new(FileStore::open(&path).unwrap()));

    session.save_tokens("a", "r").unwrap();
    assert!(session.is_logged_in());
    session.clear().unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert_eq!(raw.trim(), "{}");
    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get(USER_PROFILE_KEY).unwrap(), None);
}

#[test]
fn failed_write_keeps_memory_in_step_with_disk() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("sub");
    let path = sub.join("session.json");

    let store = FileStore::open(&path).unwrap();
    store.set(ACCESS_TOKEN_KEY, "a-1").unwrap();

    // The directory turns into a plain file, so the next write cannot land.
    std::fs::remove_dir_all(&sub).unwrap();
    std::fs::write(&sub, "blocker").unwrap();

    assert!(store.remove(ACCESS_TOKEN_KEY).is_err());
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a-1"));
    assert!(store.set(USER_PROFILE_KEY, "{}").is_err());
    assert_eq!(store.get(USER_PROFILE_KEY).unwrap(), None);
}

#[cfg(unix)]
#[test]
fn session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let store = FileStore::open(&path).unwrap();
    store.set(ACCESS_TOKEN_KEY, "a-1").unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "session.json")
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}

#[test]
fn config_roundtrips_through_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut profiles = HashMap::new();
    profiles.insert(
        "dev".to_owned(),
        Profile {
            base_url: "http://localhost:8000".into(),
            session_backend: SessionBackend::Memory,
            timeout: Some(5),
            ..Profile::default()
        },
    );
    let cfg = Config {
        default_profile: Some("dev".into()),
        profiles,
        ..Config::default()
    };
    save_config_to(&cfg, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (name, profile) = resolve_profile(&loaded, None).unwrap();
    assert_eq!(name, "dev");
    assert_eq!(profile.base_url, "http://localhost:8000");
    assert_eq!(profile.session_backend, SessionBackend::Memory);
    assert_eq!(profile.api_prefix, "/api/v1");
}

#[test]
fn env_overrides_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            default_profile = "default"

            [defaults]
            timeout = 10

            [profiles.default]
            base_url = "https://file.example.com"
            "#,
        )?;
        jail.set_env("ELKA_DEFAULTS__TIMEOUT", "3");
        jail.set_env("ELKA_PROFILES__DEFAULT__BASE_URL", "https://env.example.com");

        let path = jail.directory().join("config.toml");
        let cfg = load_config_from(&path).map_err(|e| e.to_string())?;
        assert_eq!(cfg.defaults.timeout, 3);
        assert_eq!(
            cfg.profiles["default"].base_url,
            "https://env.example.com"
        );
        Ok(())
    });
}
