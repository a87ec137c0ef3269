//! Device list: server-paged, server-sorted table.
//!
//! Every change of page, page size, sort, or source issues a new fetch;
//! the table's ticket check keeps only the newest answer.

use std::cell::Cell;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use elka_core::models::{DeviceSortField, SortDirection};
use elka_core::pages::{SYNC_FAILED, message_or, synced_count};
use elka_core::{Banner, ClickOrigin, DeviceTable, Route, TableSource};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell as TableCell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, Completion, Request};
use crate::component::Component;
use crate::{theme, widgets};

/// Header label and the field it sorts by.
const COLUMNS: [(&str, Option<DeviceSortField>); 5] = [
    ("#", None),
    ("Name", Some(DeviceSortField::Name)),
    ("Serial Number", Some(DeviceSortField::SerialNumber)),
    ("Owner", Some(DeviceSortField::UserId)),
    ("Actions", None),
];
const ACTIONS_WIDTH: u16 = 9;

pub struct DevicesScreen {
    table: DeviceTable,
    logged_in: bool,
    selected: usize,
    /// Header column the sort keys act on.
    sort_cursor: usize,
    syncing: bool,
    banner: Option<Banner>,
    action_tx: Option<UnboundedSender<Action>>,
    // Geometry of the last frame, for mouse hits.
    table_area: Cell<Rect>,
    table_offset: Cell<usize>,
}

impl DevicesScreen {
    pub fn new(logged_in: bool) -> Self {
        Self {
            table: DeviceTable::new(TableSource::All),
            logged_in,
            selected: 0,
            sort_cursor: 1,
            syncing: false,
            banner: None,
            action_tx: None,
            table_area: Cell::new(Rect::default()),
            table_offset: Cell::new(0),
        }
    }

    fn fetch(&mut self) -> Action {
        let ticket = self.table.begin_fetch();
        Action::Request(Request::DevicePage {
            ticket,
            source: self.table.source,
            query: self.table.query(),
        })
    }

    fn fetch_if(&mut self, changed: bool) -> Option<Action> {
        changed.then(|| self.fetch())
    }

    fn move_selection(&mut self, delta: isize) {
        let last = self.table.rows().len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    fn move_sort_cursor(&mut self, forward: bool) {
        let sortable: Vec<usize> = COLUMNS
            .iter()
            .enumerate()
            .filter_map(|(i, (_, field))| field.map(|_| i))
            .collect();
        let pos = sortable
            .iter()
            .position(|i| *i == self.sort_cursor)
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % sortable.len()
        } else {
            (pos + sortable.len() - 1) % sortable.len()
        };
        self.sort_cursor = sortable.get(next).copied().unwrap_or(1);
    }

    fn toggle_source(&mut self) -> Option<Action> {
        if !self.logged_in {
            self.banner = Some(Banner::Error("Sign in to see your own devices.".into()));
            return None;
        }
        let source = match self.table.source {
            TableSource::All => TableSource::Mine,
            TableSource::Mine => TableSource::All,
        };
        self.table = DeviceTable::with_query(source, self.table.query());
        self.table.set_page(0);
        self.selected = 0;
        Some(self.fetch())
    }

    fn sync(&mut self) -> Option<Action> {
        if self.syncing {
            return None;
        }
        if !self.logged_in {
            self.banner = Some(Banner::Error(SYNC_FAILED.into()));
            return None;
        }
        self.syncing = true;
        self.banner = None;
        Some(Action::Request(Request::SyncYandex))
    }

    /// Row index under a terminal position, if any.
    fn row_at(&self, column: u16, row: u16) -> Option<(usize, ClickOrigin)> {
        let area = self.table_area.get();
        // First line of the table is the header.
        if column < area.x || column >= area.right() || row <= area.y || row >= area.bottom() {
            return None;
        }
        let index = usize::from(row - area.y - 1) + self.table_offset.get();
        let origin = if column >= area.right().saturating_sub(ACTIONS_WIDTH) {
            ClickOrigin::Control
        } else {
            ClickOrigin::Row
        };
        (index < self.table.rows().len()).then_some((index, origin))
    }

    fn status_line(&self) -> Line<'static> {
        let q = self.table.query();
        let source = match self.table.source {
            TableSource::All => "all devices",
            TableSource::Mine => "my devices",
        };
        let arrow = match q.sort_direction {
            SortDirection::Asc => "\u{2191}",
            SortDirection::Desc => "\u{2193}",
        };
        Line::from(vec![
            Span::styled(" Showing: ", theme::muted()),
            Span::styled(source, theme::title()),
            Span::styled("  Sort: ", theme::muted()),
            Span::styled(format!("{} {arrow}", q.sort_field), theme::title()),
        ])
    }

    fn footer_line(&self) -> Line<'static> {
        let q = self.table.query();
        let mut spans = vec![
            Span::styled(" Rows on the page: ", theme::muted()),
            Span::styled(q.rows_per_page.to_string(), theme::text()),
            Span::styled(format!("   {}", self.table.range_label()), theme::text()),
            Span::styled(
                format!("   page {}/{}", q.page + 1, self.table.last_page() + 1),
                theme::muted(),
            ),
        ];
        if self.table.is_loading() {
            spans.push(Span::styled("   loading...", theme::warning()));
        }
        Line::from(spans)
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let q = self.table.query();
        let header = Row::new(COLUMNS.iter().enumerate().map(|(i, (label, field))| {
            let sorted = field.is_some_and(|f| f == q.sort_field);
            let mut text = (*label).to_owned();
            if sorted {
                text.push_str(match q.sort_direction {
                    SortDirection::Asc => " \u{2191}",
                    SortDirection::Desc => " \u{2193}",
                });
            }
            if i == self.sort_cursor {
                text = format!("[{text}]");
            }
            let style = if sorted {
                theme::table_header_sorted()
            } else {
                theme::table_header()
            };
            TableCell::from(text).style(style)
        }));

        let rows: Vec<Row> = self
            .table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Row::new(vec![
                    TableCell::from(self.table.row_number(i).to_string()),
                    TableCell::from(row.name.clone()),
                    TableCell::from(row.serial_number.clone()),
                    TableCell::from(row.owner.clone()),
                    TableCell::from(Span::styled("Details", theme::title())),
                ])
                .style(theme::text())
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(ACTIONS_WIDTH),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("\u{25B8}");
        let mut state = TableState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut state);

        self.table_area.set(area);
        self.table_offset.set(state.offset());
    }
}

impl Component for DevicesScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        let first = self.fetch();
        action_tx.send(first)?;
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Enter => self
                .table
                .row_click(self.selected, ClickOrigin::Row)
                .map(Action::Navigate),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
                let changed = self.table.next_page();
                self.fetch_if(changed)
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
                let changed = self.table.prev_page();
                self.fetch_if(changed)
            }
            KeyCode::Char('r') => {
                self.table.cycle_rows_per_page();
                self.selected = 0;
                Some(self.fetch())
            }
            KeyCode::Char('>') => {
                self.move_sort_cursor(true);
                None
            }
            KeyCode::Char('<') => {
                self.move_sort_cursor(false);
                None
            }
            KeyCode::Char('s') => match COLUMNS.get(self.sort_cursor).and_then(|(_, f)| *f) {
                Some(field) => {
                    self.table.request_sort(field);
                    self.selected = 0;
                    Some(self.fetch())
                }
                None => None,
            },
            KeyCode::Char('m') => self.toggle_source(),
            KeyCode::Char('n') => Some(Action::Navigate(Route::DeviceCreate)),
            KeyCode::Char('y') => self.sync(),
            KeyCode::Char('R') => Some(self.fetch()),
            _ => None,
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(None);
        }
        let Some((index, origin)) = self.row_at(mouse.column, mouse.row) else {
            return Ok(None);
        };
        self.selected = index;
        // The Details button navigates itself; the row handler stays out.
        let target = match origin {
            ClickOrigin::Control => self
                .table
                .rows()
                .get(index)
                .map(|row| Route::DeviceDetail(row.serial_number.clone())),
            ClickOrigin::Row => self.table.row_click(index, origin),
        };
        Ok(target.map(Action::Navigate))
    }

    fn complete(&mut self, completion: Completion) -> Result<Option<Action>> {
        match completion {
            Completion::DevicePage(ticket, result) => {
                if self.table.finish_fetch(ticket, result) {
                    self.move_selection(0);
                }
                Ok(None)
            }
            Completion::Synced(result) => {
                self.syncing = false;
                match result {
                    Ok(payload) => {
                        self.banner = Some(Banner::Success(format!(
                            "Successfully synced {} device(s). Table will refresh.",
                            synced_count(&payload)
                        )));
                        Ok(Some(self.fetch()))
                    }
                    Err(e) => {
                        self.banner = Some(Banner::Error(message_or(&e, SYNC_FAILED)));
                        Ok(None)
                    }
                }
            }
            _ => Ok(None),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let inner = widgets::page_block(frame, area, "Devices");
        let [status, alert, body, footer, hints] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(self.status_line()), status);

        if self.syncing {
            widgets::message(
                frame,
                alert,
                Line::from(Span::styled(" Syncing...", theme::warning())),
            );
        } else if let Some(error) = self.table.error() {
            widgets::message(frame, alert, widgets::error_line(error));
        } else if let Some(ref banner) = self.banner {
            widgets::message(frame, alert, widgets::banner_line(banner));
        }

        if self.table.rows().is_empty() {
            let text = if self.table.is_loading() {
                "Loading devices..."
            } else {
                "No devices found."
            };
            widgets::message(
                frame,
                body,
                Line::from(Span::styled(format!("  {text}"), theme::muted())),
            );
        } else {
            self.render_table(frame, body);
        }

        frame.render_widget(Paragraph::new(self.footer_line()), footer);
        frame.render_widget(
            Paragraph::new(widgets::hints(&[
                ("Enter", "details"),
                ("h/l", "page"),
                ("r", "rows"),
                ("</>", "column"),
                ("s", "sort"),
                ("m", "mine/all"),
                ("n", "new"),
                ("y", "sync Yandex"),
            ])),
            hints,
        );
    }

    fn id(&self) -> &str {
        "devices"
    }
}
