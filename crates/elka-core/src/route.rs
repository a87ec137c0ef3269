// ── Routes ──
//
// Every page of the client has a path. Front-ends navigate by `Route`
// and can parse user-typed paths back into one.

use std::fmt;

/// A page of the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Home,
    Login,
    Register,
    Profile,
    Devices,
    DeviceCreate,
    DeviceDetail(String),
    DeviceLogs(String),
    Logs,
    YandexCallback,
    NotFound(String),
}

impl Route {
    /// Parse a path (query string and fragment are ignored).
    ///
    /// `/devices/create` wins over `/devices/:id`; anything unknown is
    /// `NotFound`.
    pub fn parse(input: &str) -> Self {
        let path = input
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let trimmed = path.trim_matches('/');
        let segments: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        match segments.as_slice() {
            [] => Self::Home,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["profile"] => Self::Profile,
            ["devices"] => Self::Devices,
            ["devices", "create"] => Self::DeviceCreate,
            ["devices", id] if !id.is_empty() => Self::DeviceDetail((*id).to_owned()),
            ["devices", id, "logs"] if !id.is_empty() => Self::DeviceLogs((*id).to_owned()),
            ["logs"] => Self::Logs,
            ["auth", "yandex", "callback"] => Self::YandexCallback,
            _ => Self::NotFound(path.to_owned()),
        }
    }

    /// Short page title for headers and tabs.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Profile => "Profile",
            Self::Devices => "Devices",
            Self::DeviceCreate => "New Device",
            Self::DeviceDetail(_) => "Device",
            Self::DeviceLogs(_) => "Device Logs",
            Self::Logs => "Logs",
            Self::YandexCallback => "Yandex Sign-in",
            Self::NotFound(_) => "Not Found",
        }
    }

    /// Pages whose data needs a logged-in session.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Self::Profile | Self::DeviceCreate | Self::DeviceLogs(_) | Self::Logs
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Login => f.write_str("/login"),
            Self::Register => f.write_str("/register"),
            Self::Profile => f.write_str("/profile"),
            Self::Devices => f.write_str("/devices"),
            Self::DeviceCreate => f.write_str("/devices/create"),
            Self::DeviceDetail(id) => write!(f, "/devices/{id}"),
            Self::DeviceLogs(id) => write!(f, "/devices/{id}/logs"),
            Self::Logs => f.write_str("/logs"),
            Self::YandexCallback => f.write_str("/auth/yandex/callback"),
            Self::NotFound(path) => f.write_str(path),
        }
    }
}

impl From<&str> for Route {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_wins_over_detail() {
        assert_eq!(Route::parse("/devices/create"), Route::DeviceCreate);
        assert_eq!(
            Route::parse("/devices/SN-42"),
            Route::DeviceDetail("SN-42".into())
        );
        assert_eq!(
            Route::parse("/devices/SN-42/logs"),
            Route::DeviceLogs("SN-42".into())
        );
    }

    #[test]
    fn display_roundtrips() {
        for route in [
            Route::Home,
            Route::Login,
            Route::Register,
            Route::Profile,
            Route::Devices,
            Route::DeviceCreate,
            Route::DeviceDetail("7".into()),
            Route::DeviceLogs("7".into()),
            Route::Logs,
            Route::YandexCallback,
        ] {
            assert_eq!(Route::parse(&route.to_string()), route);
        }
    }

    #[test]
    fn query_and_trailing_slash_are_ignored() {
        assert_eq!(
            Route::parse("/auth/yandex/callback?code=abc"),
            Route::YandexCallback
        );
        assert_eq!(Route::parse("/devices/"), Route::Devices);
        assert_eq!(Route::parse(""), Route::Home);
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(
            Route::parse("/admin/secret"),
            Route::NotFound("/admin/secret".into())
        );
        assert_eq!(
            Route::parse("/devices/1/logs/extra"),
            Route::NotFound("/devices/1/logs/extra".into())
        );
    }
}
