//! Sign-up page. A new account is not signed in.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use elka_core::pages::{REGISTER_FAILED, message_or};
use elka_core::{Banner, Route};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::widgets::{self, FIELD_HEIGHT, TextField};
use crate::theme;

pub struct RegisterScreen {
    fields: [TextField; 3],
    focus: usize,
    busy: bool,
    banner: Option<Banner>,
}

const EMAIL: usize = 0;
const NAME: usize = 1;
const PASSWORD: usize = 2;

impl RegisterScreen {
    pub fn new() -> Self {
        Self {
            fields: [
                TextField::new("Email Address"),
                TextField::new("Nickname"),
                TextField::new("Password").masked(),
            ],
            focus: EMAIL,
            busy: false,
            banner: None,
        }
    }

    fn submit(&mut self) -> Option<Action> {
        if self.busy {
            return None;
        }
        let [email, name, password] = &self.fields;
        let (email, name, password) = (
            email.value().trim().to_owned(),
            name.value().trim().to_owned(),
            password.value().to_owned(),
        );
        if email.is_empty() || name.is_empty() || password.is_empty() {
            self.banner = Some(Banner::Error("All fields are required.".into()));
            return None;
        }
        self.busy = true;
        self.banner = None;
        Some(Action::Request(Request::Register {
            email,
            name,
            password,
        }))
    }
}

impl Component for RegisterScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % self.fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
            }
            KeyCode::Enter if self.focus < PASSWORD => self.focus += 1,
            KeyCode::Enter => return Ok(self.submit()),
            KeyCode::Char('l') if ctrl => return Ok(Some(Action::Navigate(Route::Login))),
            _ => {
                if self.busy {
                    return Ok(None);
                }
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.handle_key(key);
                }
            }
        }
        Ok(None)
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<Action>> {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.insert_str(text);
        }
        Ok(None)
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        if let Completion::Registered(result) = completion {
            self.busy = false;
            self.banner = Some(match result {
                Ok(profile) => {
                    let who = if profile.name.is_empty() {
                        self.fields[NAME].value().trim().to_owned()
                    } else {
                        profile.name
                    };
                    for field in &mut self.fields {
                        field.clear();
                    }
                    self.focus = EMAIL;
                    Banner::Success(format!(
                        "Registration successful for {who}! You can now log in."
                    ))
                }
                Err(e) => Banner::Error(message_or(&e, REGISTER_FAILED)),
            });
        }
        Ok(None)
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Sign Up");
        let form = widgets::centered(inner, 64, 18);
        let [alert, email, name, password, button, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .areas(form);

        if let Some(ref banner) = self.banner {
            widgets::message(frame, alert, widgets::banner_line(banner));
        }
        for (i, area) in [email, name, password].into_iter().enumerate() {
            self.fields[i].render(frame, area, self.focus == i, !self.busy);
        }

        let (label, style) = if self.busy {
            ("Signing up...", theme::disabled())
        } else {
            ("[ Sign Up ]  Enter", theme::title())
        };
        frame.render_widget(Paragraph::new(Span::styled(label, style)), button);
        frame.render_widget(
            Paragraph::new(widgets::hints(&[
                ("Tab", "next field"),
                ("Ctrl+l", "sign in"),
                ("Esc", "back"),
            ])),
            footer,
        );
    }

    fn id(&self) -> &str {
        "register"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use elka_core::models::UserProfile;
    use pretty_assertions::assert_eq;

    use super::*;

    fn press(screen: &mut RegisterScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn fill(screen: &mut RegisterScreen, values: [&str; 3]) {
        for value in values {
            screen.handle_paste(value).unwrap();
            press(screen, KeyCode::Tab);
        }
        screen.focus = PASSWORD;
    }

    #[test]
    fn submits_all_three_fields() {
        let mut screen = RegisterScreen::new();
        fill(&mut screen, ["ann@example.com", "Ann", "s3cret"]);
        match press(&mut screen, KeyCode::Enter) {
            Some(Action::Request(Request::Register {
                email,
                name,
                password,
            })) => {
                assert_eq!(email, "ann@example.com");
                assert_eq!(name, "Ann");
                assert_eq!(password, "s3cret");
            }
            other => panic!("expected a register request, got {other:?}"),
        }
    }

    #[test]
    fn success_clears_the_form() {
        let mut screen = RegisterScreen::new();
        fill(&mut screen, ["ann@example.com", "Ann", "s3cret"]);
        press(&mut screen, KeyCode::Enter);

        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 7, "email": "ann@example.com", "name": "Ann"
        }))
        .unwrap();
        screen.complete(Completion::Registered(Ok(profile))).unwrap();

        assert_eq!(
            screen.banner,
            Some(Banner::Success(
                "Registration successful for Ann! You can now log in.".into()
            ))
        );
        assert!(screen.fields.iter().all(|f| f.value().is_empty()));
        assert!(!screen.busy);
    }
}
