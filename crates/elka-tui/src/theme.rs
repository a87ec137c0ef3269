//! Palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ──────────────────────────────────────────────────────────

pub const PRIMARY: Color = Color::Rgb(39, 39, 39); // #272727
pub const SECONDARY: Color = Color::Rgb(41, 94, 124); // #295e7c
pub const ACCENT: Color = Color::Rgb(102, 178, 214); // #66b2d6
pub const TEXT: Color = Color::Rgb(214, 214, 214); // #d6d6d6
pub const MUTED: Color = Color::Rgb(160, 160, 160); // #a0a0a0
pub const BORDER: Color = Color::Rgb(92, 99, 112); // #5c6370
pub const SUCCESS: Color = Color::Rgb(76, 175, 80); // #4caf50
pub const ERROR: Color = Color::Rgb(229, 83, 83); // #e55353
pub const WARNING: Color = Color::Rgb(230, 192, 92); // #e6c05c
pub const BG_SELECTED: Color = Color::Rgb(33, 52, 66); // #213442

// ── Semantic styles ──────────────────────────────────────────────────

pub fn title() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn border() -> Style {
    Style::default().fg(BORDER)
}

pub fn border_active() -> Style {
    Style::default().fg(ACCENT)
}

pub fn text() -> Style {
    Style::default().fg(TEXT)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Header cell of the column the table is sorted by.
pub fn table_header_sorted() -> Style {
    table_header().fg(TEXT).bg(SECONDARY)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(BG_SELECTED)
        .add_modifier(Modifier::BOLD)
}

pub fn nav_active() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(SECONDARY)
        .add_modifier(Modifier::BOLD)
}

pub fn nav_inactive() -> Style {
    Style::default().fg(MUTED)
}

pub fn header_bar() -> Style {
    Style::default().bg(PRIMARY)
}

pub fn success() -> Style {
    Style::default().fg(SUCCESS)
}

pub fn error() -> Style {
    Style::default().fg(ERROR)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// A button that cannot be pressed right now.
pub fn disabled() -> Style {
    Style::default().fg(BORDER).add_modifier(Modifier::DIM)
}
