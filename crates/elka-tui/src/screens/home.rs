//! Landing page: who is signed in and where to go.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use elka_core::{Header, Route};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

use crate::action::Action;
use crate::component::Component;
use crate::{theme, widgets};

pub struct HomeScreen {
    header: Header,
    entries: Vec<(&'static str, Route)>,
    selected: usize,
}

impl HomeScreen {
    pub fn new(header: Header) -> Self {
        // The home entry itself is not worth listing here.
        let entries = header
            .nav()
            .into_iter()
            .filter(|(_, route)| *route != Route::Home)
            .collect();
        Self {
            header,
            entries,
            selected: 0,
        }
    }

    fn step(&mut self, delta: isize) {
        let last = self.entries.len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }
}

impl Component for HomeScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.step(1),
            KeyCode::Char('k') | KeyCode::Up => self.step(-1),
            KeyCode::Enter => {
                return Ok(self
                    .entries
                    .get(self.selected)
                    .map(|(_, route)| Action::Navigate(route.clone())));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Home");
        let [intro, list, hints] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let greeting = match self.header.display_name {
            Some(ref name) => format!("  Welcome back, {name}."),
            None => "  Welcome. Sign in to manage your windows.".to_owned(),
        };
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled("  Window Controller", theme::title())),
                Line::from(Span::styled(greeting, theme::text())),
            ]),
            intro,
        );

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|(label, route)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("  {label:<12}"), theme::text()),
                    Span::styled(route.to_string(), theme::muted()),
                ]))
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(
            List::new(items).highlight_style(theme::table_selected()),
            list,
            &mut state,
        );

        frame.render_widget(
            Paragraph::new(widgets::hints(&[("j/k", "move"), ("Enter", "open")])),
            hints,
        );
    }

    fn id(&self) -> &str {
        "home"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::widgets::testing::render_to_string;

    fn press(screen: &mut HomeScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn anonymous_entries_lead_to_sign_in() {
        let mut screen = HomeScreen::new(Header::default());
        let labels: Vec<_> = screen.entries.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, ["Devices", "Sign In", "Sign Up"]);

        press(&mut screen, KeyCode::Down);
        let action = press(&mut screen, KeyCode::Enter);
        assert!(matches!(action, Some(Action::Navigate(Route::Login))));
    }

    #[test]
    fn selection_stops_at_the_ends() {
        let mut screen = HomeScreen::new(Header::default());
        press(&mut screen, KeyCode::Up);
        assert_eq!(screen.selected, 0);
        for _ in 0..5 {
            press(&mut screen, KeyCode::Down);
        }
        assert_eq!(screen.selected, 2);
    }

    #[test]
    fn greets_the_signed_in_user() {
        let screen = HomeScreen::new(Header {
            logged_in: true,
            is_admin: false,
            display_name: Some("Ann".into()),
        });
        let out = render_to_string(60, 12, |f| screen.render(f, f.area()));
        assert!(out.contains("Welcome back, Ann."));
        assert!(out.contains("My Profile"));
    }
}
