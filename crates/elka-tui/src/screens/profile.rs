//! "My Profile": the cached profile, with an explicit reload.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use elka_core::ProfileView;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::{theme, widgets};

pub struct ProfileScreen {
    profile: Result<ProfileView, String>,
    reloading: bool,
}

impl ProfileScreen {
    /// `profile` comes from the session cache; no request is made.
    pub fn new(profile: Result<ProfileView, String>) -> Self {
        Self {
            profile,
            reloading: false,
        }
    }
}

fn field(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<8}"), theme::muted()),
        Span::styled(value, theme::text()),
    ])
}

impl Component for ProfileScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('r') && !self.reloading {
            self.reloading = true;
            return Ok(Some(Action::Request(Request::ReloadProfile)));
        }
        Ok(None)
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        if let Completion::Profile(result) = completion {
            self.reloading = false;
            self.profile = result
                .map(|p| ProfileView::from(&p))
                .map_err(|e| e.to_string());
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "My Profile");
        let mut lines = vec![Line::from("")];
        match self.profile {
            Ok(ref p) => {
                lines.push(Line::from(Span::styled("  Info", theme::title())));
                lines.push(field("Name:", p.name.clone()));
                lines.push(field("Email:", p.email.clone()));
                lines.push(field("Role:", p.role.clone()));
                if p.is_admin {
                    lines.push(field("Admin:", "yes".into()));
                }
                lines.push(field(
                    "Yandex:",
                    if p.yandex_linked { "linked" } else { "not linked" }.into(),
                ));
            }
            Err(ref message) => lines.push(widgets::error_line(message)),
        }
        lines.push(Line::from(""));
        if self.reloading {
            lines.push(Line::from(Span::styled("  Reloading...", theme::muted())));
        } else {
            lines.push(widgets::hints(&[("r", "reload from server")]));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn id(&self) -> &str {
        "profile"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use elka_core::CoreError;
    use elka_core::models::UserProfile;
    use elka_core::pages::PROFILE_MISSING;

    use super::*;
    use crate::widgets::testing::render_to_string;

    fn ann() -> UserProfile {
        serde_json::from_value(serde_json::json!({
            "id": 7, "email": "ann@example.com", "name": "Ann", "is_superuser": true
        }))
        .unwrap()
    }

    #[test]
    fn renders_cached_profile_with_default_role() {
        let screen = ProfileScreen::new(Ok(ProfileView::from(&ann())));
        let out = render_to_string(60, 12, |f| screen.render(f, f.area()));
        assert!(out.contains("ann@example.com"));
        assert!(out.contains("User"));
        assert!(out.contains("Admin:"));
    }

    #[test]
    fn missing_profile_shows_message() {
        let screen = ProfileScreen::new(Err(PROFILE_MISSING.into()));
        let out = render_to_string(80, 8, |f| screen.render(f, f.area()));
        assert!(out.contains("User profile not found"));
    }

    #[test]
    fn reload_requests_once_and_applies_result() {
        let mut screen = ProfileScreen::new(Err(PROFILE_MISSING.into()));
        let key = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        assert!(matches!(
            screen.handle_key_event(key).unwrap(),
            Some(Action::Request(Request::ReloadProfile))
        ));
        assert!(screen.handle_key_event(key).unwrap().is_none());

        screen.complete(Completion::Profile(Ok(ann()))).unwrap();
        assert_eq!(screen.profile.as_ref().unwrap().email, "ann@example.com");

        screen
            .complete(Completion::Profile(Err(CoreError::Timeout)))
            .unwrap();
        assert_eq!(screen.profile.as_ref().unwrap_err(), "Request timed out");
    }
}
