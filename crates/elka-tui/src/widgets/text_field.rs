//! Labelled single-line text input backed by `tui-input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tui_input::{Input, InputRequest};

use crate::theme;

/// Rows a field needs: one label line plus a bordered box.
pub const FIELD_HEIGHT: u16 = 4;

#[derive(Debug, Clone, Default)]
pub struct TextField {
    label: &'static str,
    input: Input,
    masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            input: Input::default(),
            masked: false,
        }
    }

    /// Shows dots instead of the value.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.input = Input::new(value.into());
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.input.handle(InputRequest::InsertChar(c));
        }
    }

    /// Apply an editing key. Returns whether the key was used.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request = match key.code {
            KeyCode::Char('u') if ctrl => InputRequest::DeleteLine,
            KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
            KeyCode::Char('a') if ctrl => InputRequest::GoToStart,
            KeyCode::Char('e') if ctrl => InputRequest::GoToEnd,
            KeyCode::Char(c) if !ctrl => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return false,
        };
        self.input.handle(request);
        true
    }

    fn display(&self) -> String {
        if self.masked {
            "\u{25CF}".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_owned()
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, active: bool, enabled: bool) {
        if area.height < FIELD_HEIGHT - 1 {
            return;
        }
        let label_style = match (active, enabled) {
            (_, false) => theme::disabled(),
            (true, true) => theme::title(),
            (false, true) => theme::text(),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(self.label, label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_active()
            } else {
                theme::border()
            });
        let box_area = Rect::new(area.x, area.y + 1, area.width, 3);
        let inner = block.inner(box_area);
        frame.render_widget(block, box_area);

        // Keep the cursor in view on long values.
        let width = usize::from(inner.width.max(1));
        let scroll = self.input.visual_scroll(width.saturating_sub(1));
        let text: String = self.display().chars().skip(scroll).collect();
        let mut spans = vec![Span::styled(text, theme::text())];
        if active && enabled {
            spans.push(Span::styled("\u{2588}", theme::title()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), inner);
    }
}
