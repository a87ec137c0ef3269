//! Finishes Yandex sign-in from a pasted redirect address.

use color_eyre::eyre::Result;
use elka_core::Route;
use elka_core::oauth::{CallbackParams, read_callback};
use elka_core::pages::{YANDEX_FAILED, message_or};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::{theme, widgets};

/// Roughly three seconds at the app tick rate.
pub const REDIRECT_TICKS: u32 = 12;

const NO_CODE: &str = "No authorization code found. Redirecting to login...";

#[derive(Debug, PartialEq, Eq)]
enum Phase {
    Processing,
    Failed(String),
    /// No code: counting ticks down to the login redirect.
    Redirecting { message: String, ticks_left: u32 },
}

pub struct CallbackScreen {
    raw: String,
    phase: Phase,
}

impl CallbackScreen {
    /// `raw` is the full redirect URL or its query string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            phase: Phase::Processing,
        }
    }
}

impl Component for CallbackScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        if read_callback(&self.raw) == CallbackParams::Missing {
            self.phase = Phase::Redirecting {
                message: NO_CODE.into(),
                ticks_left: REDIRECT_TICKS,
            };
            return Ok(());
        }
        // Provider errors are reported by the exchange itself.
        action_tx.send(Action::Request(Request::YandexCallback(self.raw.clone())))?;
        Ok(())
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if !matches!(action, Action::Tick) {
            return Ok(None);
        }
        if let Phase::Redirecting { ref mut ticks_left, .. } = self.phase {
            *ticks_left = ticks_left.saturating_sub(1);
            if *ticks_left == 0 {
                return Ok(Some(Action::Navigate(Route::Login)));
            }
        }
        Ok(None)
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        if let Completion::SignedIn(result) = completion {
            match result {
                Ok(outcome) => return Ok(Some(Action::SignedIn(outcome.next))),
                Err(e) => self.phase = Phase::Failed(message_or(&e, YANDEX_FAILED)),
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Yandex Sign-In");
        let body = widgets::centered(inner, 70, 5);
        let lines = match self.phase {
            Phase::Processing => vec![Line::from(Span::styled(
                "Processing Yandex Sign-In...",
                theme::title(),
            ))],
            Phase::Failed(ref message) => vec![
                widgets::error_line(message),
                Line::from(""),
                widgets::hints(&[("Esc", "back"), ("2", "devices")]),
            ],
            Phase::Redirecting { ref message, .. } => vec![widgets::error_line(message)],
        };
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), body);
    }

    fn id(&self) -> &str {
        "yandex-callback"
    }
}
