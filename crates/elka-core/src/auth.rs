// ── Authentication flows ──
//
// Password login, registration, Yandex OAuth completion, logout, session
// revalidation, and token refresh. Flows return where the user should go
// next; they never navigate on their own.

use std::sync::Arc;

use elka_api::models::{ProfileUpdate, TokenPair, UserProfile};
use elka_api::{ApiClient, StaticToken};
use secrecy::SecretString;
use tracing::{info, warn};
use url::Url;

use crate::config::OAuthConfig;
use crate::error::CoreError;
use crate::oauth;
use crate::route::Route;
use crate::session::SessionManager;

pub const LOGIN_INVALID_RESPONSE: &str = "Login failed: Invalid response from server.";
pub const LOGIN_PROFILE_FAILED: &str =
    "Login succeeded but failed to fetch profile. Please try again.";
pub const YANDEX_INVALID_RESPONSE: &str = "Yandex OAuth failed: Invalid response from server.";

/// Result of a completed sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub profile: UserProfile,
    pub next: Route,
}

/// Result of a logout. The local session is always gone.
#[derive(Debug)]
pub struct LogoutOutcome {
    /// Failure of the server-side logout call, if one was attempted.
    pub remote_error: Option<CoreError>,
    pub next: Route,
}

/// What [`AuthService::revalidate`] found.
#[derive(Debug)]
pub enum SessionCheck {
    /// No access token stored.
    Anonymous,
    /// Logged in and a profile is already cached; nothing fetched.
    Cached(UserProfile),
    /// Profile fetched and cached.
    Fetched(UserProfile),
    /// The server rejected the token; the session was cleared.
    Cleared,
    /// Fetching failed for another reason; the session is untouched.
    Kept(CoreError),
}

/// Runs auth flows against the API and records the results in the session.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionManager,
    oauth: OAuthConfig,
}

impl AuthService {
    pub fn new(api: ApiClient, session: SessionManager, oauth: OAuthConfig) -> Self {
        Self {
            api,
            session,
            oauth,
        }
    }

    // ── Password auth ────────────────────────────────────────────────

    /// Log in with email and password.
    ///
    /// The profile is fetched with the new token before anything is
    /// stored, so a login dropped mid-flight leaves the session as it was.
    /// A failed profile fetch clears the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, CoreError> {
        info!("attempting login for {email}");
        let tokens = self.api.login(email, password).await?;
        let Some(pair) = tokens.into_pair() else {
            warn!("login response missing tokens");
            return Err(CoreError::InvalidResponse {
                message: LOGIN_INVALID_RESPONSE.into(),
            });
        };

        let fresh = StaticToken(SecretString::from(pair.access_token.clone()));
        let profile = match self.api.with_tokens(Arc::new(fresh)).get_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("failed to fetch profile after login: {e}");
                let _ = self.session.clear();
                return Err(CoreError::AuthenticationFailed {
                    message: LOGIN_PROFILE_FAILED.into(),
                });
            }
        };
        self.session.establish(&pair, &profile)?;

        info!("logged in as {}", profile.email);
        Ok(AuthOutcome {
            profile,
            next: Route::Home,
        })
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<UserProfile, CoreError> {
        info!("attempting registration for {email}");
        Ok(self.api.register(email, name, password).await?)
    }

    // ── Yandex OAuth ─────────────────────────────────────────────────

    pub fn yandex_authorize_url(&self) -> Result<Url, CoreError> {
        oauth::authorize_url(&self.oauth)
    }

    /// Finish the OAuth flow from the redirect URL (or its query string).
    ///
    /// A provider `error` or a missing code fails before any request.
    pub async fn complete_yandex(&self, callback: &str) -> Result<AuthOutcome, CoreError> {
        let code = oauth::callback_code(callback)?;
        self.exchange_yandex_code(&code).await
    }

    /// Trade an authorization code for a session. Any failure clears
    /// whatever session state existed.
    pub async fn exchange_yandex_code(&self, code: &str) -> Result<AuthOutcome, CoreError> {
        let result = self.try_exchange(code).await;
        if let Err(ref e) = result {
            warn!("Yandex OAuth callback failed: {e}");
            let _ = self.session.clear();
        }
        result
    }

    async fn try_exchange(&self, code: &str) -> Result<AuthOutcome, CoreError> {
        let resp = self.api.yandex_callback(code).await?;
        let invalid = || CoreError::InvalidResponse {
            message: YANDEX_INVALID_RESPONSE.into(),
        };

        let (Some(access_token), Some(refresh_token), Some(profile)) =
            (resp.access_token, resp.refresh_token, resp.user_profile)
        else {
            return Err(invalid());
        };
        if access_token.is_empty() || refresh_token.is_empty() {
            return Err(invalid());
        }

        let tokens = TokenPair {
            access_token,
            refresh_token,
        };
        self.session.establish(&tokens, &profile)?;

        info!("Yandex OAuth successful for {}", profile.email);
        Ok(AuthOutcome {
            profile,
            next: Route::Home,
        })
    }

    // ── Logout ───────────────────────────────────────────────────────

    /// Clear the local session.
    pub fn logout(&self) -> Result<Route, CoreError> {
        self.session.clear()?;
        info!("logged out");
        Ok(Route::Login)
    }

    /// Tell the server, then clear locally regardless of the answer.
    pub async fn logout_remote(&self) -> LogoutOutcome {
        let remote_error = if self.session.is_logged_in() {
            self.api.logout().await.err().map(CoreError::from)
        } else {
            None
        };
        if let Some(ref e) = remote_error {
            warn!("server logout failed: {e}");
        }
        if let Err(e) = self.session.clear() {
            warn!("failed to clear session: {e}");
        }
        info!("logged out");
        LogoutOutcome {
            remote_error,
            next: Route::Login,
        }
    }

    // ── Session maintenance ──────────────────────────────────────────

    /// Make sure a logged-in session has a cached profile.
    ///
    /// Fetches at most once. A 401-like failure clears the session; any
    /// other failure leaves it alone.
    pub async fn revalidate(&self) -> SessionCheck {
        if !self.session.is_logged_in() {
            return SessionCheck::Anonymous;
        }
        if let Some(profile) = self.session.cached_profile() {
            return SessionCheck::Cached(profile);
        }

        match self.api.get_profile().await.map_err(CoreError::from) {
            Ok(profile) => {
                if let Err(e) = self.session.set_cached_profile(&profile) {
                    warn!("failed to cache profile: {e}");
                }
                SessionCheck::Fetched(profile)
            }
            Err(e) if e.is_unauthorized() => {
                info!("stored token rejected, clearing session");
                let _ = self.session.clear();
                SessionCheck::Cleared
            }
            Err(e) => {
                warn!("failed to fetch user profile: {e}");
                SessionCheck::Kept(e)
            }
        }
    }

    /// Fetch the profile even when one is cached, and re-cache it.
    /// A 401-like failure clears the session.
    pub async fn reload_profile(&self) -> Result<UserProfile, CoreError> {
        match self.api.get_profile().await.map_err(CoreError::from) {
            Ok(profile) => {
                self.session.set_cached_profile(&profile)?;
                Ok(profile)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    info!("stored token rejected, clearing session");
                    let _ = self.session.clear();
                }
                Err(e)
            }
        }
    }

    /// Swap the stored refresh token for a new token pair. The cached
    /// profile is kept. A rejected refresh token clears the session.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(CoreError::AuthRequired);
        };

        let resp = match self.api.refresh(&refresh_token).await {
            Ok(resp) => resp,
            Err(e) => {
                let e = CoreError::from(e);
                if e.is_unauthorized() {
                    let _ = self.session.clear();
                }
                return Err(e);
            }
        };
        let pair = resp.into_pair().ok_or_else(|| CoreError::InvalidResponse {
            message: "Token refresh failed: Invalid response from server.".into(),
        })?;
        self.session
            .save_tokens(&pair.access_token, &pair.refresh_token)?;
        info!("tokens refreshed");
        Ok(())
    }

    // ── Profile ──────────────────────────────────────────────────────

    /// Update the profile on the server and re-cache it.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, CoreError> {
        let profile = self.api.update_profile(update).await?;
        self.session.set_cached_profile(&profile)?;
        Ok(profile)
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<String, CoreError> {
        let ack = self.api.change_password(current, new).await?;
        Ok(ack
            .map(|m| m.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Password updated".into()))
    }
}
