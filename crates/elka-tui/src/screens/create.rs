//! New device form.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use elka_core::CreateDeviceForm;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Span;
use ratatui::widgets::Paragraph;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::widgets::{self, FIELD_HEIGHT, TextField};
use crate::theme;

pub struct CreateScreen {
    form: CreateDeviceForm,
    fields: [TextField; 3],
    focus: usize,
}

impl CreateScreen {
    pub fn new() -> Self {
        let form = CreateDeviceForm::default();
        let fields = [
            TextField::new("Device Name"),
            TextField::new("Serial Number"),
            TextField::new("Room").with_value(form.room.clone()),
        ];
        Self {
            form,
            fields,
            focus: 0,
        }
    }

    fn submit(&mut self) -> Option<Action> {
        let [name, serial, room] = &self.fields;
        self.form.name = name.value().to_owned();
        self.form.serial_number = serial.value().to_owned();
        self.form.room = room.value().to_owned();
        self.form
            .begin_submit()
            .map(|body| Action::Request(Request::CreateDevice(body)))
    }
}

impl Component for CreateScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % self.fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
            }
            KeyCode::Enter => return Ok(self.submit()),
            _ => {
                if self.form.is_busy() {
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
        if let Completion::DeviceCreated(result) = completion {
            return Ok(self.form.finish_submit(result).map(Action::Navigate));
        }
        Ok(None)
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Create New Device");
        let form = widgets::centered(inner, 64, 18);
        let [alert, name, serial, room, button, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(FIELD_HEIGHT),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .areas(form);

        if let Some(error) = self.form.error() {
            widgets::message(frame, alert, widgets::error_line(error));
        }
        let busy = self.form.is_busy();
        for (i, area) in [name, serial, room].into_iter().enumerate() {
            self.fields[i].render(frame, area, self.focus == i, !busy);
        }

        let (label, style) = if busy {
            ("Creating...", theme::disabled())
        } else {
            ("[ Create Device ]  Enter", theme::title())
        };
        frame.render_widget(Paragraph::new(Span::styled(label, style)), button);
        frame.render_widget(
            Paragraph::new(widgets::hints(&[("Tab", "next field"), ("Esc", "cancel")])),
            footer,
        );
    }

    fn id(&self) -> &str {
        "device-create"
    }
}
