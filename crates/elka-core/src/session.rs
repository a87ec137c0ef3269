// ── Session manager ──
//
// Tokens and the cached profile live in an injected `KeyValueStore` under
// fixed keys. Reads never fail: storage errors are logged and read as
// "absent", which at worst logs the user out.

use std::sync::Arc;

use elka_api::TokenSource;
use elka_api::models::{TokenPair, UserProfile};
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::storage::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_PROFILE_KEY: &str = "userProfile";

/// Reads and writes the persisted session.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!("failed to read {key} from session store: {e}");
                None
            }
        }
    }

    // ── Tokens ───────────────────────────────────────────────────────

    pub fn save_tokens(&self, access: &str, refresh: &str) -> Result<(), CoreError> {
        self.store.set(ACCESS_TOKEN_KEY, access)?;
        self.store.set(REFRESH_TOKEN_KEY, refresh)?;
        debug!("tokens saved");
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Logged in iff an access token is stored.
    pub fn is_logged_in(&self) -> bool {
        self.access_token().is_some()
    }

    // ── Profile ──────────────────────────────────────────────────────

    /// The cached profile. Missing or corrupt data reads as `None`.
    pub fn cached_profile(&self) -> Option<UserProfile> {
        let raw = self.read(USER_PROFILE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("ignoring corrupt cached profile: {e}");
                None
            }
        }
    }

    pub fn set_cached_profile(&self, profile: &UserProfile) -> Result<(), CoreError> {
        let raw = serde_json::to_string(profile).map_err(|e| CoreError::Storage {
            message: format!("failed to encode profile: {e}"),
        })?;
        self.store.set(USER_PROFILE_KEY, &raw)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Write tokens and profile together; on any failure the session is
    /// cleared so no half-written session survives.
    pub fn establish(&self, tokens: &TokenPair, profile: &UserProfile) -> Result<(), CoreError> {
        let result = self
            .save_tokens(&tokens.access_token, &tokens.refresh_token)
            .and_then(|()| self.set_cached_profile(profile));
        if result.is_err() {
            let _ = self.clear();
        }
        result
    }

    /// Remove all session keys. Every key is attempted; the first error
    /// is returned.
    pub fn clear(&self) -> Result<(), CoreError> {
        let mut first_err = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_PROFILE_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!("failed to remove {key}: {e}");
                first_err.get_or_insert(e);
            }
        }
        debug!("session cleared");
        first_err.map_or(Ok(()), Err)
    }
}

impl TokenSource for SessionManager {
    fn access_token(&self) -> Option<SecretString> {
        SessionManager::access_token(self).map(SecretString::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStore;

    fn profile() -> UserProfile {
        serde_json::from_value(json!({"id": 7, "email": "ann@example.com", "name": "Ann"}))
            .unwrap()
    }

    fn session() -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store.clone());
        (store, session)
    }

    #[test]
    fn tokens_roundtrip_and_login_flag() {
        let (_, session) = session();
        assert!(!session.is_logged_in());
        session.save_tokens("a", "r").unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.access_token().as_deref(), Some("a"));
        assert_eq!(session.refresh_token().as_deref(), Some("r"));
    }

    #[test]
    fn clear_removes_all_keys() {
        let (store, session) = session();
        session
            .establish(
                &TokenPair {
                    access_token: "a".into(),
                    refresh_token: "r".into(),
                },
                &profile(),
            )
            .unwrap();
        assert_eq!(session.cached_profile(), Some(profile()));

        session.clear().unwrap();
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_PROFILE_KEY] {
            assert_eq!(store.get(key).unwrap(), None, "{key} should be gone");
        }
        assert!(!session.is_logged_in());
    }

    #[test]
    fn corrupt_profile_reads_as_none() {
        let (store, session) = session();
        store.set(USER_PROFILE_KEY, "{not json").unwrap();
        assert_eq!(session.cached_profile(), None);
    }

    #[test]
    fn token_source_exposes_access_token() {
        use secrecy::ExposeSecret;

        let (_, session) = session();
        assert!(TokenSource::access_token(&session).is_none());
        session.save_tokens("a", "r").unwrap();
        let token = TokenSource::access_token(&session).unwrap();
        assert_eq!(token.expose_secret(), "a");
    }
}
