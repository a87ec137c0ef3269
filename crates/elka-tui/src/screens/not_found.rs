//! Catch-all page for unknown paths.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::component::Component;
use crate::{theme, widgets};

pub struct NotFoundScreen {
    path: String,
}

impl NotFoundScreen {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Component for NotFoundScreen {
    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Not Found");
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("  Page not found", theme::title())),
            Line::from(Span::styled(format!("  {}", self.path), theme::muted())),
            Line::from(""),
            widgets::hints(&[("Esc", "back"), (":", "go to path"), ("1", "home")]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn id(&self) -> &str {
        "not_found"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::testing::render_to_string;

    #[test]
    fn shows_the_missing_path() {
        let screen = NotFoundScreen::new("/nowhere");
        let out = render_to_string(50, 8, |f| screen.render(f, f.area()));
        assert!(out.contains("Page not found"));
        assert!(out.contains("/nowhere"));
    }
}
