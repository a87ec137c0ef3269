// ── Yandex OAuth helpers ──
//
// Pure URL work: building the provider's authorize URL and reading the
// `code` / `error` parameters of the redirect back to us. The code
// exchange itself lives in `auth`.

use url::Url;
use url::form_urlencoded;

use crate::config::OAuthConfig;
use crate::error::CoreError;

/// Outcome of reading the provider redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackParams {
    Code(String),
    Error(String),
    Missing,
}

/// The provider URL a user must visit to grant access.
pub fn authorize_url(config: &OAuthConfig) -> Result<Url, CoreError> {
    let mut url = Url::parse(&config.authorize_url).map_err(|e| CoreError::Config {
        message: format!("invalid OAuth authorize URL: {e}"),
    })?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scopes.join(" "));
    Ok(url)
}

/// Read `code` and `error` from a full redirect URL, a path with a query,
/// or a bare query string. `error` wins over `code`.
pub fn read_callback(input: &str) -> CallbackParams {
    let input = input.trim();
    let query = match Url::parse(input) {
        Ok(url) => url.query().unwrap_or_default().to_owned(),
        Err(_) => match input.split_once('?') {
            Some((_, q)) => q.to_owned(),
            None => input.to_owned(),
        },
    };
    let query = query.split('#').next().unwrap_or_default();

    let mut code = None;
    let mut error = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "error" if !value.is_empty() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (error, code) {
        (Some(error), _) => CallbackParams::Error(error),
        (None, Some(code)) => CallbackParams::Code(code),
        (None, None) => CallbackParams::Missing,
    }
}

/// The authorization code, or the error the redirect reports.
pub fn callback_code(input: &str) -> Result<String, CoreError> {
    match read_callback(input) {
        CallbackParams::Code(code) => Ok(code),
        CallbackParams::Error(error) => Err(elka_api::Error::OAuthProvider { error }.into()),
        CallbackParams::Missing => Err(elka_api::Error::MissingCode.into()),
    }
}
