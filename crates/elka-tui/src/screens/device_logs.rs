//! Command and event history of one device.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use elka_core::{DeviceLogs, Loadable, Route};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::{theme, widgets};

pub struct DeviceLogsScreen {
    id: String,
    logs: Loadable<DeviceLogs>,
}

impl DeviceLogsScreen {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            logs: Loadable::Loading,
        }
    }

    fn render_commands(logs: &DeviceLogs, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Commands ", theme::title()))
            .borders(Borders::TOP)
            .border_style(theme::border());
        if logs.commands.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No commands recorded.", theme::muted())).block(block),
                area,
            );
            return;
        }
        let header = Row::new(["Command Type", "Status", "Created At", "Completed At"])
            .style(theme::table_header());
        let rows = logs.commands.iter().map(|c| {
            Row::new(vec![
                Cell::from(c.command_type.clone()),
                Cell::from(c.status.clone()),
                Cell::from(widgets::stamp(c.created_at)),
                Cell::from(widgets::stamp(c.completed_at)),
            ])
            .style(theme::text())
        });
        let widths = [
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(19),
            Constraint::Length(19),
        ];
        frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
    }

    fn render_events(logs: &DeviceLogs, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Events ", theme::title()))
            .borders(Borders::TOP)
            .border_style(theme::border());
        if logs.events.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No events recorded.", theme::muted())).block(block),
                area,
            );
            return;
        }
        let header = Row::new(["Event Type", "Message", "Created At"]).style(theme::table_header());
        let rows = logs.events.iter().map(|e| {
            Row::new(vec![
                Cell::from(e.event_type.clone()),
                Cell::from(e.message.clone()),
                Cell::from(widgets::stamp(e.created_at)),
            ])
            .style(theme::text())
        });
        let widths = [
            Constraint::Fill(1),
            Constraint::Fill(3),
            Constraint::Length(19),
        ];
        frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
    }
}

impl Component for DeviceLogsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        action_tx.send(Action::Request(Request::DeviceLogs(self.id.clone())))?;
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('r') if !self.logs.is_loading() => {
                self.logs = Loadable::Loading;
                Some(Action::Request(Request::DeviceLogs(self.id.clone())))
            }
            KeyCode::Char('d') => Some(Action::Navigate(Route::DeviceDetail(self.id.clone()))),
            _ => None,
        };
        Ok(action)
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        if let Completion::DeviceLogs(result) = completion {
            self.logs = Loadable::from_result(result);
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, &format!("Logs for device {}", self.id));
        let [body, hints] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(inner);

        match self.logs {
            Loadable::Loading => widgets::message(
                frame,
                body,
                Line::from(Span::styled("  Loading logs...", theme::muted())),
            ),
            Loadable::Failed(ref error) => widgets::message(frame, body, widgets::error_line(error)),
            Loadable::Loaded(ref logs) => {
                let [commands, events] =
                    Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).areas(body);
                Self::render_commands(logs, frame, commands);
                Self::render_events(logs, frame, events);
            }
        }

        frame.render_widget(
            Paragraph::new(widgets::hints(&[("r", "reload"), ("d", "device")])),
            hints,
        );
    }

    fn id(&self) -> &str {
        "device-logs"
    }
}
