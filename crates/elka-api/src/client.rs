// Async HTTP wrapper for the Elka device service.
//
// Base path: {base_url}{api_prefix}, prefix `/api/v1` by default.
// Auth: `Authorization: Bearer <access token>` on endpoints that need it.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;

/// Default path prefix joined between the base URL and every endpoint.
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

// ── Token source ─────────────────────────────────────────────────────

/// Where the client reads the current access token from.
///
/// The client never stores tokens itself; the session layer owns them.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Option<SecretString>;
}

/// A token source that never has a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn access_token(&self) -> Option<SecretString> {
        None
    }
}

/// A fixed token, handy for one-shot scripts and tests.
pub struct StaticToken(pub SecretString);

impl TokenSource for StaticToken {
    fn access_token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

// ── Request options ──────────────────────────────────────────────────

/// Per-request options for [`ApiClient::fetch`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers; these override the JSON defaults on conflict.
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            query: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self, Error> {
        Self::with_method(Method::POST).json(body)
    }

    pub fn put<B: Serialize>(body: &B) -> Result<Self, Error> {
        Self::with_method(Method::PUT).json(body)
    }

    pub fn patch<B: Serialize>(body: &B) -> Result<Self, Error> {
        Self::with_method(Method::PATCH).json(body)
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Set the JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::InvalidResponse {
            message: format!("failed to encode request body: {e}"),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

// ── Error body shape ─────────────────────────────────────────────────

/// Extract a human-readable message from an error body.
///
/// Order: `detail[0].msg`, `message`, a plain-string `detail`, then the
/// generic `HTTP error! status: N`.
pub(crate) fn error_message(status: u16, raw: &str) -> String {
    let fallback = || format!("HTTP error! status: {status}");
    let Ok(body) = serde_json::from_str::<Value>(raw) else {
        return fallback();
    };

    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    non_empty(body.pointer("/detail/0/msg"))
        .or_else(|| non_empty(body.get("message")))
        .or_else(|| non_empty(body.get("detail")))
        .unwrap_or_else(fallback)
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the device service REST API.
///
/// Cheap to clone; all clones share the connection pool and token source.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_prefix: String,
    tokens: Arc<dyn TokenSource>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_prefix", &self.api_prefix)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client with its own connection pool.
    pub fn new(
        base_url: &str,
        api_prefix: &str,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, api_prefix, http, tokens)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        base_url: &str,
        api_prefix: &str,
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)?;
        let path = base_url.path().trim_end_matches('/').to_owned();
        base_url.set_path(&path);

        let api_prefix = normalize_prefix(api_prefix);

        Ok(Self {
            http,
            base_url,
            api_prefix,
            tokens,
        })
    }

    /// Same connection pool and base URL, different token source.
    pub fn with_tokens(&self, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            tokens,
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base_url}{api_prefix}{endpoint}`.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        self.absolute_url(&format!("{}{endpoint}", self.api_prefix))
    }

    /// `{base_url}{path}`, bypassing the API prefix.
    pub fn absolute_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Core request ─────────────────────────────────────────────────

    /// Send a request to `endpoint` under the API prefix.
    ///
    /// Returns `Ok(None)` for `204 No Content`. With `requires_auth` and no
    /// access token, fails with [`Error::AuthRequired`] without sending.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        requires_auth: bool,
    ) -> Result<Option<T>, Error> {
        let url = self.endpoint_url(endpoint)?;
        self.fetch_url(url, options, requires_auth).await
    }

    /// Like [`fetch`](Self::fetch), with a fully built URL.
    pub async fn fetch_url<T: DeserializeOwned>(
        &self,
        url: Url,
        options: RequestOptions,
        requires_auth: bool,
    ) -> Result<Option<T>, Error> {
        let resp = self.send(url, options, requires_auth).await?;
        self.handle_response(resp).await
    }

    /// Send and return the raw response, after the auth check and headers.
    pub(crate) async fn send(
        &self,
        url: Url,
        options: RequestOptions,
        requires_auth: bool,
    ) -> Result<reqwest::Response, Error> {
        let headers = self.build_headers(options.headers, requires_auth)?;

        debug!("{} {url}", options.method);

        let mut req = self.http.request(options.method, url).headers(headers);
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(body) = options.body {
            req = req.json(&body);
        }

        Ok(req.send().await?)
    }

    fn build_headers(&self, extra: HeaderMap, requires_auth: bool) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in &extra {
            headers.insert(name.clone(), value.clone());
        }

        if requires_auth {
            let Some(token) = self.tokens.access_token() else {
                warn!("authenticated request attempted without a token");
                return Err(Error::AuthRequired);
            };
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::InvalidResponse {
                    message: format!("invalid access token header value: {e}"),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
        requires_auth: bool,
    ) -> Result<T, Error> {
        let opts = RequestOptions::get().query(query);
        require_body(self.fetch(endpoint, opts, requires_auth).await?)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        requires_auth: bool,
    ) -> Result<T, Error> {
        let opts = RequestOptions::post(body)?;
        require_body(self.fetch(endpoint, opts, requires_auth).await?)
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        requires_auth: bool,
    ) -> Result<T, Error> {
        let opts = RequestOptions::put(body)?;
        require_body(self.fetch(endpoint, opts, requires_auth).await?)
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        requires_auth: bool,
    ) -> Result<T, Error> {
        let opts = RequestOptions::patch(body)?;
        require_body(self.fetch(endpoint, opts, requires_auth).await?)
    }

    pub(crate) async fn delete(&self, endpoint: &str, requires_auth: bool) -> Result<(), Error> {
        self.fetch::<Value>(endpoint, RequestOptions::delete(), requires_auth)
            .await?;
        Ok(())
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<Option<T>, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map(Some).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &raw);
        debug!(status = status.as_u16(), "request failed: {message}");
        Error::Http {
            status: status.as_u16(),
            message,
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Turn an empty (204) response into an error for calls that need a body.
fn require_body<T>(body: Option<T>) -> Result<T, Error> {
    body.ok_or_else(|| Error::InvalidResponse {
        message: "Empty response from server".into(),
    })
}
