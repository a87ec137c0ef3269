//! Global activity log, newest first as the server sends it.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use elka_core::Loadable;
use elka_core::models::LogEntry;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::{theme, widgets};

pub struct LogsScreen {
    entries: Loadable<Vec<LogEntry>>,
    selected: usize,
}

impl LogsScreen {
    pub fn new() -> Self {
        Self {
            entries: Loadable::Loading,
            selected: 0,
        }
    }

    fn step(&mut self, delta: isize) {
        let len = self.entries.loaded().map_or(0, Vec::len);
        self.selected = self
            .selected
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
    }
}

impl Component for LogsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        action_tx.send(Action::Request(Request::Logs))?;
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.step(1),
            KeyCode::Char('k') | KeyCode::Up => self.step(-1),
            KeyCode::PageDown => self.step(10),
            KeyCode::PageUp => self.step(-10),
            KeyCode::Char('g') | KeyCode::Home => self.selected = 0,
            KeyCode::Char('G') | KeyCode::End => self.step(isize::MAX),
            KeyCode::Char('r') if !self.entries.is_loading() => {
                self.entries = Loadable::Loading;
                return Ok(Some(Action::Request(Request::Logs)));
            }
            _ => {}
        }
        Ok(None)
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        if let Completion::Logs(result) = completion {
            self.entries = Loadable::from_result(result);
            self.step(0);
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Logs");
        let [body, hints] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(inner);

        match self.entries {
            Loadable::Loading => widgets::message(
                frame,
                body,
                Line::from(Span::styled("  Loading logs...", theme::muted())),
            ),
            Loadable::Failed(ref error) => widgets::message(frame, body, widgets::error_line(error)),
            Loadable::Loaded(ref entries) if entries.is_empty() => widgets::message(
                frame,
                body,
                Line::from(Span::styled("  No log entries.", theme::muted())),
            ),
            Loadable::Loaded(ref entries) => {
                let header = Row::new(["Time", "Device", "Message"]).style(theme::table_header());
                let rows = entries.iter().map(|e| {
                    Row::new(vec![
                        Cell::from(widgets::stamp(e.timestamp)),
                        Cell::from(e.device_label()),
                        Cell::from(e.message.clone()),
                    ])
                    .style(theme::text())
                });
                let widths = [
                    Constraint::Length(19),
                    Constraint::Fill(1),
                    Constraint::Fill(3),
                ];
                let table = Table::new(rows, widths)
                    .header(header)
                    .row_highlight_style(theme::table_selected());
                let mut state = TableState::default().with_selected(Some(self.selected));
                frame.render_stateful_widget(table, body, &mut state);
            }
        }

        frame.render_widget(
            Paragraph::new(widgets::hints(&[("j/k", "scroll"), ("g/G", "top/bottom"), ("r", "reload")])),
            hints,
        );
    }

    fn id(&self) -> &str {
        "logs"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use elka_core::CoreError;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::widgets::testing::render_to_string;

    fn entries() -> Vec<LogEntry> {
        serde_json::from_value(serde_json::json!([
            {"device_id": 4, "message": "window opened"},
            {"device_name": "Bedroom", "message": "window closed"}
        ]))
        .unwrap()
    }

    fn press(screen: &mut LogsScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn shows_device_label_fallback() {
        let mut screen = LogsScreen::new();
        screen.complete(Completion::Logs(Ok(entries()))).unwrap();
        let out = render_to_string(90, 10, |f| screen.render(f, f.area()));
        assert!(out.contains("window opened"));
        assert!(out.contains("Bedroom"));
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut screen = LogsScreen::new();
        screen.complete(Completion::Logs(Ok(entries()))).unwrap();
        press(&mut screen, KeyCode::Char('G'));
        assert_eq!(screen.selected, 1);
        press(&mut screen, KeyCode::Char('k'));
        press(&mut screen, KeyCode::Char('k'));
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn error_then_reload() {
        let mut screen = LogsScreen::new();
        screen.complete(Completion::Logs(Err(CoreError::AuthRequired))).unwrap();
        let out = render_to_string(60, 6, |f| screen.render(f, f.area()));
        assert!(out.contains("Authentication required"));
        assert!(matches!(
            press(&mut screen, KeyCode::Char('r')),
            Some(Action::Request(Request::Logs))
        ));
    }
}
