//! One device: facts, MQTT settings form, and the Yandex unlink action.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use elka_core::models::Device;
use elka_core::{DeviceDetail, Loadable, Route};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::widgets::{self, FIELD_HEIGHT, TextField};
use crate::theme;

pub struct DetailScreen {
    detail: DeviceDetail,
    /// Broker address, username, password; mirrored into `detail.form`.
    fields: [TextField; 3],
    focus: usize,
    editing: bool,
}

impl DetailScreen {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            detail: DeviceDetail::new(id),
            fields: [
                TextField::new("Broker Address"),
                TextField::new("Username"),
                TextField::new("Password").masked(),
            ],
            focus: 0,
            editing: false,
        }
    }

    fn pull_form(&mut self) {
        let form = &self.detail.form;
        let [broker, username, password] = &mut self.fields;
        broker.set_value(&form.broker_address);
        username.set_value(&form.username);
        password.set_value(&form.password);
    }

    fn push_form(&mut self) {
        let [broker, username, password] = &self.fields;
        self.detail.form.broker_address = broker.value().to_owned();
        self.detail.form.username = username.value().to_owned();
        self.detail.form.password = password.value().to_owned();
    }

    fn save(&mut self) -> Option<Action> {
        self.push_form();
        let settings = self.detail.begin_save()?.mqtt_settings?;
        self.editing = false;
        Some(Action::Request(Request::SaveMqtt {
            id: self.detail.id.clone(),
            settings,
        }))
    }

    fn edit_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                // Drop unsaved edits.
                self.editing = false;
                self.pull_form();
            }
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % self.fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
            }
            KeyCode::Enter => return self.save(),
            _ => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.handle_key(key);
                }
            }
        }
        None
    }

    fn facts(device: &Device) -> Vec<Line<'static>> {
        let row = |label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {label:<14}"), theme::muted()),
                Span::styled(value, theme::text()),
            ])
        };
        let or_dash = |v: Option<&str>| v.filter(|s| !s.is_empty()).unwrap_or("-").to_owned();
        vec![
            row("Name:", device.name.clone()),
            row("Serial Number:", device.serial_number.clone()),
            row("Status:", or_dash(device.status.as_deref())),
            row("Room:", or_dash(device.room.as_deref())),
            row("Type:", or_dash(device.device_type.as_deref())),
            row(
                "Owner:",
                or_dash(device.owner.as_ref().map(|o| o.email.as_str())),
            ),
            row("Last Seen:", widgets::stamp(device.last_seen)),
        ]
    }
}

impl Component for DetailScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        action_tx.send(Action::Request(Request::Device(self.detail.id.clone())))?;
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.editing {
            return Ok(self.edit_key(key));
        }
        let action = match key.code {
            KeyCode::Char('e') if self.detail.controls_enabled() => {
                self.editing = true;
                self.focus = 0;
                None
            }
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('u') => self
                .detail
                .begin_unlink()
                .then_some(Action::Request(Request::UnlinkYandex)),
            KeyCode::Char('l') => Some(Action::Navigate(Route::DeviceLogs(self.detail.id.clone()))),
            _ => None,
        };
        Ok(action)
    }

    fn handle_paste(&mut self, text: &str) -> Result<Option<Action>> {
        if self.editing {
            if let Some(field) = self.fields.get_mut(self.focus) {
                field.insert_str(text);
            }
        }
        Ok(None)
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        match completion {
            Completion::Device(result) => {
                self.detail.load(result);
                self.pull_form();
            }
            Completion::MqttSaved(result) => {
                self.detail.finish_save(result);
                self.pull_form();
            }
            Completion::Unlinked(result) => self.detail.finish_unlink(result),
            _ => {}
        }
        Ok(None)
    }

    fn captures_input(&self) -> bool {
        self.editing
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, &format!("Device {}", self.detail.id));
        let device = match self.detail.device {
            Loadable::Loading => {
                widgets::message(
                    frame,
                    inner,
                    Line::from(Span::styled("  Loading device...", theme::muted())),
                );
                return;
            }
            Loadable::Failed(ref error) => {
                widgets::message(frame, inner, widgets::error_line(error));
                return;
            }
            Loadable::Loaded(ref device) => device,
        };

        let [alert, facts, heading, broker, username, password, hints] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Min(1),
        ])
        .areas(inner);

        if self.detail.is_busy() {
            widgets::message(
                frame,
                alert,
                Line::from(Span::styled(" Working...", theme::warning())),
            );
        } else if let Some(banner) = self.detail.banner() {
            widgets::message(frame, alert, widgets::banner_line(banner));
        }

        frame.render_widget(Paragraph::new(Self::facts(device)), facts);
        frame.render_widget(
            Paragraph::new(Span::styled("  MQTT Settings", theme::title())),
            heading,
        );
        let enabled = self.editing && self.detail.controls_enabled();
        for (i, area) in [broker, username, password].into_iter().enumerate() {
            let active = self.editing && self.focus == i;
            self.fields[i].render(frame, area, active, enabled);
        }

        let keys: &[(&'static str, &'static str)] = if self.editing {
            &[("Tab", "next field"), ("Enter", "save"), ("Esc", "cancel")]
        } else {
            &[
                ("e", "edit"),
                ("s", "save settings"),
                ("u", "unlink Yandex"),
                ("l", "view logs"),
            ]
        };
        frame.render_widget(Paragraph::new(widgets::hints(keys)), hints);
    }

    fn id(&self) -> &str {
        "device-detail"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use elka_core::{Banner, CoreError};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::widgets::testing::render_to_string;

    fn press(screen: &mut DetailScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn device() -> Device {
        serde_json::from_value(serde_json::json!({
            "id": 1, "name": "Bedroom", "serial_number": "SN-1", "room": "main",
            "mqtt_settings": {"broker_address": "mqtt://b:1883", "username": "u", "password": "p"}
        }))
        .unwrap()
    }

    fn loaded() -> DetailScreen {
        let mut screen = DetailScreen::new("SN-1");
        screen.complete(Completion::Device(Ok(device()))).unwrap();
        screen
    }

    #[test]
    fn init_fetches_the_device() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut screen = DetailScreen::new("SN-1");
        screen.init(tx).unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(Action::Request(Request::Device(ref id))) if id == "SN-1"
        ));
    }

    #[test]
    fn loaded_settings_fill_the_form() {
        let screen = loaded();
        assert_eq!(screen.fields[0].value(), "mqtt://b:1883");
        let out = render_to_string(80, 30, |f| screen.render(f, f.area()));
        assert!(out.contains("Bedroom"));
        assert!(out.contains("MQTT Settings"));
    }

    #[test]
    fn edit_then_save_sends_trimmed_settings() {
        let mut screen = loaded();
        assert!(!screen.captures_input());
        press(&mut screen, KeyCode::Char('e'));
        assert!(screen.captures_input());

        screen.fields[0].set_value(" mqtt://new:1883 ");
        match press(&mut screen, KeyCode::Enter) {
            Some(Action::Request(Request::SaveMqtt { id, settings })) => {
                assert_eq!(id, "SN-1");
                assert_eq!(settings.broker_address, "mqtt://new:1883");
            }
            other => panic!("expected a save request, got {other:?}"),
        }
        assert!(!screen.captures_input());
        // Busy: a second save and the unlink are refused.
        assert!(press(&mut screen, KeyCode::Char('s')).is_none());
        assert!(press(&mut screen, KeyCode::Char('u')).is_none());
    }

    #[test]
    fn escape_discards_edits() {
        let mut screen = loaded();
        press(&mut screen, KeyCode::Char('e'));
        screen.fields[1].set_value("someone-else");
        press(&mut screen, KeyCode::Esc);
        assert_eq!(screen.fields[1].value(), "u");
    }

    #[test]
    fn unlink_reports_outcome() {
        let mut screen = loaded();
        assert!(matches!(
            press(&mut screen, KeyCode::Char('u')),
            Some(Action::Request(Request::UnlinkYandex))
        ));
        screen
            .complete(Completion::Unlinked(Err(CoreError::Timeout)))
            .unwrap();
        assert_eq!(
            screen.detail.banner(),
            Some(&Banner::Error(
                "Failed to unlink device: Request timed out".into()
            ))
        );
    }

    #[test]
    fn failed_load_disables_actions() {
        let mut screen = DetailScreen::new("SN-9");
        screen
            .complete(Completion::Device(Err(CoreError::Timeout)))
            .unwrap();
        assert!(press(&mut screen, KeyCode::Char('e')).is_none());
        assert!(!screen.editing);
        let out = render_to_string(60, 10, |f| screen.render(f, f.area()));
        assert!(out.contains("Request timed out"));
    }
}
