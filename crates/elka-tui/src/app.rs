//! Application core: event loop, routing, and action dispatch.

use std::time::Duration;

use chrono::Datelike;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use elka_core::{FetchTicket, FetchTracker, Header, Hub, Route, SessionCheck, ViewScope};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::bridge;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screens::create_screen;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::{self, FIELD_HEIGHT, TextField};

/// Drives [`crate::screens::callback::REDIRECT_TICKS`].
const TICK_RATE: Duration = Duration::from_millis(250);
const RENDER_RATE: Duration = Duration::from_millis(33);

/// Top-level application state and event loop.
pub struct App {
    hub: Hub,
    route: Route,
    /// Pages to return to with Esc.
    history: Vec<Route>,
    screen: Box<dyn Component>,
    /// Ends with the app; each page scope is a child of it.
    root_scope: ViewScope,
    page_scope: ViewScope,
    /// One ticket per shown page. Completions for older pages are dropped.
    pages: FetchTracker,
    page: FetchTicket,
    header: Header,
    running: bool,
    help_visible: bool,
    /// Open "go to" prompt.
    goto: Option<TextField>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    /// Build the app on the page for `path`. Nothing runs until
    /// [`App::run`].
    pub fn new(hub: Hub, path: &str) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let root_scope = ViewScope::new();
        let page_scope = root_scope.child();
        let mut pages = FetchTracker::default();
        let page = pages.begin();

        let route = guard(&hub, Route::parse(path));
        let screen = create_screen(&route, path, &hub);
        let header = hub.header();

        Self {
            hub,
            route,
            history: Vec::new(),
            screen,
            root_scope,
            page_scope,
            pages,
            page,
            header,
            running: true,
            help_visible: false,
            goto: None,
            action_tx,
            action_rx,
        }
    }

    /// Hand the first page its sender and check the stored session.
    fn start(&mut self) -> Result<()> {
        info!(route = %self.route, "starting");
        self.screen.init(self.action_tx.clone())?;
        bridge::spawn_session_check(
            self.hub.clone(),
            self.root_scope.child(),
            self.action_tx.clone(),
        );
        Ok(())
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.start()?;

        let mut events = EventReader::new(TICK_RATE, RENDER_RATE);
        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Paste(text) => self.action_tx.send(Action::Paste(text))?,
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                let render = matches!(action, Action::Render);
                self.process_action(action)?;
                if render {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.root_scope.leave();
        events.stop();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Map a key to an action. The goto prompt, the help overlay, and
    /// forms that capture input get first pick; Ctrl+C always quits.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if let Some(ref mut prompt) = self.goto {
            match key.code {
                KeyCode::Esc => self.goto = None,
                KeyCode::Enter => {
                    let raw = prompt.value().trim().to_owned();
                    self.goto = None;
                    if !raw.is_empty() {
                        return Ok(Some(Action::Open(raw)));
                    }
                }
                _ => {
                    prompt.handle_key(key);
                }
            }
            return Ok(None);
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        if self.screen.captures_input() {
            return self.screen.handle_key_event(key);
        }

        if !ctrl {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                KeyCode::Char(':') => return Ok(Some(Action::OpenGoto)),
                KeyCode::Char('X') if self.header.logged_in => return Ok(Some(Action::SignOut)),
                KeyCode::Char(c @ '1'..='9') => {
                    let target = c
                        .to_digit(10)
                        .and_then(|n| usize::try_from(n).ok())
                        .and_then(|n| self.header.nav().into_iter().nth(n - 1));
                    if let Some((_, route)) = target {
                        return Ok(Some(Action::Navigate(route)));
                    }
                }
                KeyCode::Esc | KeyCode::Backspace => return Ok(Some(Action::GoBack)),
                _ => {}
            }
        }

        self.screen.handle_key_event(key)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.goto.is_some() || self.help_visible {
            return Ok(None);
        }
        self.screen.handle_mouse_event(mouse)
    }

    // ── Actions ──────────────────────────────────────────────────────

    fn process_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Render | Action::Resize(..) => {}
            Action::Tick => self.forward(|screen| screen.update(&Action::Tick))?,
            Action::Paste(text) => match self.goto {
                Some(ref mut prompt) => prompt.insert_str(&text),
                None => self.forward(|screen| screen.handle_paste(&text))?,
            },

            Action::Navigate(route) => self.navigate(route, None, true)?,
            Action::Open(raw) => {
                let route = Route::parse(&raw);
                self.navigate(route, Some(&raw), true)?;
            }
            Action::GoBack => {
                if let Some(previous) = self.history.pop() {
                    self.navigate(previous, None, false)?;
                }
            }
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::OpenGoto => {
                self.goto = Some(TextField::new("Go to (path or Yandex redirect address)"));
            }

            Action::SignOut => {
                let next = self.hub.auth().logout().unwrap_or_else(|e| {
                    warn!("logout: {e}");
                    Route::Login
                });
                self.header = self.hub.header();
                self.history.clear();
                self.navigate(next, None, false)?;
            }
            Action::SignedIn(next) => {
                self.header = self.hub.header();
                info!(user = ?self.header.display_name, "signed in");
                self.navigate(next, None, true)?;
            }
            Action::SessionChecked(check) => self.session_checked(check)?,

            Action::Request(request) => {
                bridge::spawn_request(
                    self.hub.clone(),
                    self.page_scope.clone(),
                    self.page,
                    request,
                    self.action_tx.clone(),
                );
            }
            Action::Completed(page, completion) => {
                if !self.pages.is_current(page) {
                    debug!("dropping completion for a page already left");
                    return Ok(());
                }
                self.forward(move |screen| screen.complete(completion))?;
                // Sign-in, sign-out, and profile reloads all show up here.
                self.header = self.hub.header();
            }
        }
        Ok(())
    }

    /// Give the page an event and queue whatever it asks for next.
    fn forward(
        &mut self,
        f: impl FnOnce(&mut dyn Component) -> Result<Option<Action>>,
    ) -> Result<()> {
        if let Some(next) = f(self.screen.as_mut())? {
            self.action_tx.send(next)?;
        }
        Ok(())
    }

    /// Leave the current page and show `route`.
    ///
    /// `raw` is the typed address, kept for pages that read its query.
    fn navigate(&mut self, route: Route, raw: Option<&str>, remember: bool) -> Result<()> {
        let route = guard(&self.hub, route);
        let raw = raw.map_or_else(|| route.to_string(), str::to_owned);

        self.page_scope.leave();
        self.page_scope = self.root_scope.child();
        self.page = self.pages.begin();

        let previous = std::mem::replace(&mut self.route, route);
        if remember && previous != self.route {
            self.history.push(previous);
        }
        info!(route = %self.route, "navigate");

        self.screen = create_screen(&self.route, &raw, &self.hub);
        self.screen.init(self.action_tx.clone())?;
        Ok(())
    }

    fn session_checked(&mut self, check: SessionCheck) -> Result<()> {
        match check {
            SessionCheck::Anonymous => {}
            SessionCheck::Cached(_) => self.header = self.hub.header(),
            SessionCheck::Fetched(profile) => {
                debug!(email = %profile.email, "profile fetched");
                self.header = self.hub.header();
                // The landing page greets by name.
                if self.route == Route::Home {
                    self.navigate(Route::Home, None, false)?;
                }
            }
            SessionCheck::Cleared => {
                self.header = self.hub.header();
                if self.route.requires_auth() {
                    self.history.clear();
                    self.navigate(Route::Login, None, false)?;
                }
            }
            SessionCheck::Kept(e) => warn!("could not check the session: {e}"),
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let [header, content, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.render_header(frame, header);
        self.screen.render(frame, content);
        Self::render_footer(frame, footer);

        if let Some(ref prompt) = self.goto {
            let area = widgets::centered(content, 72, FIELD_HEIGHT);
            frame.render_widget(Clear, area);
            prompt.render(frame, area, true, true);
        }
        if self.help_visible {
            Self::render_help(frame, content);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Block::default().style(theme::header_bar()), area);

        let mut spans = vec![Span::styled(" Window Controller ", theme::title())];
        for (i, (label, route)) in self.header.nav().into_iter().enumerate() {
            let style = if nav_matches(&route, &self.route) {
                theme::nav_active()
            } else {
                theme::nav_inactive()
            };
            spans.push(Span::styled(format!(" {} {label} ", i + 1), style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);

        if self.header.logged_in {
            let who = self.header.display_name.clone().unwrap_or_default();
            let right = Line::from(vec![
                Span::styled(format!("{who}  "), theme::text()),
                Span::styled("X ", theme::key_hint_key()),
                Span::styled("Sign Out ", theme::key_hint()),
            ])
            .right_aligned();
            frame.render_widget(Paragraph::new(right), area);
        }
    }

    fn render_footer(frame: &mut Frame, area: Rect) {
        let year = chrono::Local::now().year();
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" \u{a9} {year} Window Controller App. All rights reserved."),
                theme::muted(),
            ))),
            area,
        );
        frame.render_widget(
            Paragraph::new(
                Line::from(vec![
                    Span::styled("? ", theme::key_hint_key()),
                    Span::styled("help  ", theme::key_hint()),
                    Span::styled(": ", theme::key_hint_key()),
                    Span::styled("go to  ", theme::key_hint()),
                    Span::styled("q ", theme::key_hint_key()),
                    Span::styled("quit ", theme::key_hint()),
                ])
                .right_aligned(),
            ),
            area,
        );
    }

    fn render_help(frame: &mut Frame, area: Rect) {
        let area = widgets::centered(area, 58, 16);
        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_active());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let row = |key: &'static str, label: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<12}"), theme::key_hint_key()),
                Span::styled(label, theme::key_hint()),
            ])
        };
        let lines = vec![
            Line::from(""),
            row("1-4", "Jump to a page in the header"),
            row(":", "Go to a path, or paste a Yandex redirect"),
            row("Esc", "Back"),
            row("X", "Sign out"),
            row("j/k", "Move up/down"),
            row("Enter", "Open / submit"),
            row("Tab", "Next form field"),
            row("?", "This help"),
            row("q / Ctrl+C", "Quit"),
            Line::from(""),
            Line::from(Span::styled("  Esc or ? to close", theme::muted())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Pages that need a session send anonymous users to sign in.
fn guard(hub: &Hub, route: Route) -> Route {
    if route.requires_auth() && !hub.session().is_logged_in() {
        debug!(%route, "not signed in, redirecting");
        Route::Login
    } else {
        route
    }
}

/// Device sub-pages keep the Devices entry lit.
fn nav_matches(entry: &Route, current: &Route) -> bool {
    entry == current
        || (*entry == Route::Devices
            && matches!(
                current,
                Route::DeviceCreate | Route::DeviceDetail(_) | Route::DeviceLogs(_)
            ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use elka_core::models::UserProfile;
    use elka_core::{ClientConfig, MemoryStore};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::action::Completion;
    use crate::widgets::testing::render_to_string;

    fn hub() -> Hub {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ClientConfig::default()
        };
        Hub::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    fn signed_in_hub() -> Hub {
        let hub = hub();
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 7, "email": "ann@example.com", "name": "Ann"
        }))
        .unwrap();
        hub.session().save_tokens("access", "refresh").unwrap();
        hub.session().set_cached_profile(&profile).unwrap();
        hub
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Run every queued action except network requests.
    fn settle(app: &mut App) {
        while let Ok(action) = app.action_rx.try_recv() {
            if matches!(action, Action::Request(_)) {
                continue;
            }
            app.process_action(action).unwrap();
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        if let Some(action) = app.handle_key_event(key(code)).unwrap() {
            app.process_action(action).unwrap();
        }
        settle(app);
    }

    #[test]
    fn protected_pages_need_a_session() {
        let app = App::new(hub(), "/logs");
        assert_eq!(app.route, Route::Login);

        let app = App::new(signed_in_hub(), "/logs");
        assert_eq!(app.route, Route::Logs);
    }

    #[test]
    fn number_keys_follow_the_header() {
        let mut app = App::new(hub(), "/");
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.route, Route::Login);

        let mut app = App::new(signed_in_hub(), "/");
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.route, Route::Profile);
    }

    #[test]
    fn escape_walks_history() {
        let mut app = App::new(hub(), "/");
        app.process_action(Action::Navigate(Route::Devices)).unwrap();
        app.process_action(Action::Navigate(Route::DeviceDetail("SN-1".into())))
            .unwrap();
        settle(&mut app);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.route, Route::Devices);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.route, Route::Home);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.route, Route::Home);
    }

    #[test]
    fn goto_prompt_keeps_the_query_for_the_callback() {
        let mut app = App::new(hub(), "/");
        press(&mut app, KeyCode::Char(':'));
        assert!(app.goto.is_some());
        // Letters go to the prompt, not to the global bindings.
        for c in "/auth/yandex/callback".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        app.process_action(Action::Paste("?code=abc".into())).unwrap();

        let action = app.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(
            action,
            Some(Action::Open(ref raw)) if raw == "/auth/yandex/callback?code=abc"
        ));
        app.process_action(action.unwrap()).unwrap();
        assert_eq!(app.route, Route::YandexCallback);
        assert!(matches!(
            app.action_rx.try_recv(),
            Ok(Action::Request(crate::action::Request::YandexCallback(ref raw))) if raw.contains("code=abc")
        ));
    }

    #[test]
    fn forms_keep_letter_keys() {
        let mut app = App::new(hub(), "/login");
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert_eq!(app.route, Route::Login);
    }

    #[test]
    fn completions_for_left_pages_are_dropped() {
        let mut app = App::new(hub(), "/register");
        let stale = app.page;
        app.process_action(Action::Navigate(Route::Register)).unwrap();
        settle(&mut app);

        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 7, "email": "ann@example.com", "name": "Ann"
        }))
        .unwrap();
        app.process_action(Action::Completed(stale, Completion::Registered(Ok(profile))))
            .unwrap();
        let out = render_to_string(100, 30, |f| app.render(f));
        assert!(!out.contains("Registration successful"));
    }

    #[test]
    fn sign_in_and_out_update_the_header() {
        let hub = hub();
        let mut app = App::new(hub.clone(), "/login");

        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 7, "email": "ann@example.com", "name": "Ann"
        }))
        .unwrap();
        hub.session().save_tokens("access", "refresh").unwrap();
        hub.session().set_cached_profile(&profile).unwrap();
        app.process_action(Action::SignedIn(Route::Home)).unwrap();
        settle(&mut app);
        assert_eq!(app.route, Route::Home);
        assert!(app.header.logged_in);

        let out = render_to_string(110, 20, |f| app.render(f));
        assert!(out.contains("Sign Out"));
        assert!(out.contains("Ann"));

        press(&mut app, KeyCode::Char('X'));
        assert_eq!(app.route, Route::Login);
        assert!(!app.header.logged_in);
        assert!(!hub.session().is_logged_in());
    }

    #[test]
    fn cleared_session_leaves_protected_pages() {
        let mut app = App::new(signed_in_hub(), "/profile");
        app.hub.session().clear().unwrap();
        app.process_action(Action::SessionChecked(SessionCheck::Cleared))
            .unwrap();
        assert_eq!(app.route, Route::Login);
    }

    #[test]
    fn frame_has_header_and_footer() {
        let app = App::new(hub(), "/nowhere");
        let out = render_to_string(110, 20, |f| app.render(f));
        assert!(out.contains("Window Controller App. All rights reserved."));
        assert!(out.contains("Page not found"));
        assert!(out.contains("Sign In"));
    }
}
