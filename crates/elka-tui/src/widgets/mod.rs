//! Small rendering helpers shared by the pages.

pub mod text_field;

use chrono::{DateTime, Local, Utc};
use elka_core::Banner;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::theme;

pub use text_field::{FIELD_HEIGHT, TextField};

/// `key label  key label ...` hint line.
pub fn hints(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!("{key} "), theme::key_hint_key()));
        spans.push(Span::styled(format!("{label}  "), theme::key_hint()));
    }
    Line::from(spans)
}

/// Rounded page frame with a title; returns the inner area.
pub fn page_block(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// One-line alert in the banner's color.
pub fn banner_line(banner: &Banner) -> Line<'static> {
    let (mark, style) = if banner.is_error() {
        ("\u{2716} ", theme::error())
    } else {
        ("\u{2714} ", theme::success())
    };
    Line::from(vec![
        Span::styled(mark, style),
        Span::styled(banner.message().to_owned(), style),
    ])
}

pub fn error_line(message: &str) -> Line<'static> {
    banner_line(&Banner::Error(message.to_owned()))
}

/// Render a wrapped message (loading, empty, or error state).
pub fn message(frame: &mut Frame, area: Rect, line: Line<'static>) {
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

/// Local time for table cells; `-` when the server sent none.
pub fn stamp(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "-".to_owned(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// A `width` x `height` rectangle centered in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .areas(middle);
    center
}
