//! Sign-in page: email/password form plus the Yandex entry point.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use elka_core::Route;
use elka_core::pages::{LOGIN_FAILED, message_or};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::widgets::{self, FIELD_HEIGHT, TextField};
use crate::theme;

pub struct LoginScreen {
    email: TextField,
    password: TextField,
    focus: usize,
    busy: bool,
    error: Option<String>,
    /// Where to send the user for Yandex sign-in.
    yandex_url: Option<String>,
}

impl LoginScreen {
    pub fn new(yandex_url: Option<String>) -> Self {
        Self {
            email: TextField::new("Email Address"),
            password: TextField::new("Password").masked(),
            focus: 0,
            busy: false,
            error: None,
            yandex_url,
        }
    }

    fn active(&mut self) -> &mut TextField {
        if self.focus == 0 {
            &mut self.email
        } else {
            &mut self.password
        }
    }

    fn submit(&mut self) -> Option<Action> {
        if self.busy {
            return None;
        }
        let email = self.email.value().trim().to_owned();
        let password = self.password.value().to_owned();
        if email.is_empty() || password.is_empty() {
            self.error = Some("Email and password are required.".into());
            return None;
        }
        self.busy = true;
        self.error = None;
        Some(Action::Request(Request::Login { email, password }))
    }
}

impl Component for LoginScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
                self.focus = 1 - self.focus;
            }
            KeyCode::Enter if self.focus == 0 => self.focus = 1,
            KeyCode::Enter => return Ok(self.submit()),
            KeyCode::Char('r') if ctrl => return Ok(Some(Action::Navigate(Route::Register))),
            // Yandex redirects to a browser URL; the user pastes it back.
            KeyCode::Char('y') if ctrl => return Ok(Some(Action::OpenGoto)),
            _ => {
                if !self.busy {
                    self.active().handle_key(key);
                }
            }
        }
        Ok(None)
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<Action>> {
        if !self.busy {
            self.active().insert_str(text);
        }
        Ok(None)
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        if let Completion::SignedIn(result) = completion {
            self.busy = false;
            match result {
                Ok(outcome) => return Ok(Some(Action::SignedIn(outcome.next))),
                Err(e) => self.error = Some(message_or(&e, LOGIN_FAILED)),
            }
        }
        Ok(None)
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Sign In");
        let form = widgets::centered(inner, 64, 18);
        let [alert, email, password, button, yandex, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Min(1),
        ])
        .areas(form);

        if let Some(ref error) = self.error {
            widgets::message(frame, alert, widgets::error_line(error));
        }
        self.email.render(frame, email, self.focus == 0, !self.busy);
        self.password.render(frame, password, self.focus == 1, !self.busy);

        let label = if self.busy { "Signing in..." } else { "[ Sign In ]  Enter" };
        let style = if self.busy { theme::disabled() } else { theme::title() };
        frame.render_widget(Paragraph::new(Span::styled(label, style)), button);

        let mut lines = vec![
            Line::from(Span::styled("OR  Sign In with Yandex", theme::text())),
        ];
        if let Some(ref url) = self.yandex_url {
            lines.push(Line::from(Span::styled(url.clone(), theme::muted())));
            lines.push(Line::from(Span::styled(
                "Open it in a browser, then paste the address you land on (Ctrl+y).",
                theme::muted(),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), yandex);

        frame.render_widget(
            Paragraph::new(widgets::hints(&[
                ("Tab", "next field"),
                ("Ctrl+r", "No account? Sign Up"),
                ("Esc", "back"),
            ])),
            footer,
        );
    }

    fn id(&self) -> &str {
        "login"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use elka_core::CoreError;
    use pretty_assertions::assert_eq;

    use super::*;

    fn press(screen: &mut LoginScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn type_text(screen: &mut LoginScreen, text: &str) {
        for c in text.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_moves_then_submits() {
        let mut screen = LoginScreen::new(None);
        type_text(&mut screen, "ann@example.com");
        assert!(press(&mut screen, KeyCode::Enter).is_none());
        type_text(&mut screen, "s3cret");

        let action = press(&mut screen, KeyCode::Enter);
        match action {
            Some(Action::Request(request)) => assert_eq!(
                request,
                Request::Login {
                    email: "ann@example.com".into(),
                    password: "s3cret".into(),
                }
            ),
            other => panic!("expected a login request, got {other:?}"),
        }
        // A second Enter while in flight does nothing.
        assert!(press(&mut screen, KeyCode::Enter).is_none());
    }

    #[test]
    fn empty_form_is_not_sent() {
        let mut screen = LoginScreen::new(None);
        press(&mut screen, KeyCode::Tab);
        assert!(press(&mut screen, KeyCode::Enter).is_none());
        assert_eq!(screen.error.as_deref(), Some("Email and password are required."));
    }

    #[test]
    fn failure_shows_server_message_and_unlocks() {
        let mut screen = LoginScreen::new(None);
        screen.busy = true;
        let next = screen
            .complete(Completion::SignedIn(Err(CoreError::AuthenticationFailed {
                message: "Incorrect email or password".into(),
            })))
            .unwrap();
        assert!(next.is_none());
        assert!(!screen.busy);
        assert_eq!(screen.error.as_deref(), Some("Incorrect email or password"));
    }
}
