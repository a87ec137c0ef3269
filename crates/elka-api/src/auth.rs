// Authentication and profile endpoints.

use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, RequestOptions};
use crate::models::{
    LoginRequest, Message, OAuthExchangeResponse, PasswordChange, ProfileUpdate, RegisterRequest,
    TokenResponse, UserProfile,
};
use crate::Error;

/// Path of the OAuth code exchange, outside the versioned API prefix.
pub const YANDEX_CALLBACK_PATH: &str = "/api/v1.0/auth/yandex/callback";

/// Longest raw error body surfaced verbatim by the OAuth exchange.
const RAW_ERROR_LIMIT: usize = 200;

impl ApiClient {
    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, Error> {
        self.post("/auth/login", &LoginRequest { email, password }, false)
            .await
    }

    /// `POST /auth/register`. Returns the created profile.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<UserProfile, Error> {
        let body = RegisterRequest {
            email,
            name,
            password,
        };
        self.post("/auth/register", &body, false).await
    }

    /// `GET /auth/profile`
    pub async fn get_profile(&self) -> Result<UserProfile, Error> {
        self.get("/auth/profile", Vec::new(), true).await
    }

    /// `PATCH /auth/profile`
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, Error> {
        self.patch("/auth/profile", update, true).await
    }

    /// `PUT /auth/profile/password`
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<Option<Message>, Error> {
        let body = PasswordChange {
            current_password,
            new_password,
        };
        self.fetch("/auth/profile/password", RequestOptions::put(&body)?, true)
            .await
    }

    /// `POST /auth/refresh`
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let body = serde_json::json!({ "refresh_token": refresh_token });
        self.post("/auth/refresh", &body, false).await
    }

    /// `POST /auth/logout`. Any response body is ignored.
    pub async fn logout(&self) -> Result<(), Error> {
        let opts = RequestOptions::with_method(reqwest::Method::POST);
        self.fetch::<Value>("/auth/logout", opts, true).await?;
        Ok(())
    }

    /// `POST /api/v1.0/auth/yandex/callback`
    ///
    /// Error bodies are read differently from the rest of the API: `message`,
    /// then a string `detail`, then the raw body if short, then
    /// `Yandex OAuth failed with status: N`.
    pub async fn yandex_callback(&self, code: &str) -> Result<OAuthExchangeResponse, Error> {
        let url = self.absolute_url(YANDEX_CALLBACK_PATH)?;
        let opts = RequestOptions::post(&serde_json::json!({ "code": code }))?;
        let resp = self.send(url, opts, false).await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(status = status.as_u16(), "yandex callback responded");

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: oauth_error_message(status.as_u16(), &text),
            });
        }

        serde_json::from_str(&text).map_err(|_| Error::InvalidResponse {
            message: "Yandex OAuth failed: Invalid response from server.".into(),
        })
    }
}

fn oauth_error_message(status: u16, raw: &str) -> String {
    let fallback = format!("Yandex OAuth failed with status: {status}");
    match serde_json::from_str::<Value>(raw) {
        Ok(body) => ["message", "detail"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map_or(fallback, str::to_owned),
        Err(_) if !raw.is_empty() && raw.chars().count() < RAW_ERROR_LIMIT => raw.to_owned(),
        Err(_) => fallback,
    }
}
