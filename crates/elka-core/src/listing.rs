// ── List and async page state ──
//
// Front-end independent state for the device table, plus the two guards
// every async page uses: `FetchTracker` drops stale completions and
// `ViewScope` drops completions for pages that are no longer shown.

use std::future::Future;

use elka_api::models::{
    Device, DeviceList, DeviceSortField, ListDevicesParams, Pagination, SortDirection, UserDevice,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;
use crate::route::Route;

pub const DEFAULT_ROWS_PER_PAGE: u64 = 20;
pub const ROWS_PER_PAGE_OPTIONS: [u64; 3] = [10, 20, 50];

// ── Loadable ─────────────────────────────────────────────────────────

/// Async data as a page sees it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Loadable<T> {
    #[default]
    Loading,
    Failed(String),
    Loaded(T),
}

impl<T> Loadable<T> {
    pub fn from_result(result: Result<T, CoreError>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

// ── FetchTracker ─────────────────────────────────────────────────────

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// Hands out tickets; only the newest one is current.
#[derive(Debug, Default)]
pub struct FetchTracker {
    latest: u64,
}

impl FetchTracker {
    pub fn begin(&mut self) -> FetchTicket {
        self.latest += 1;
        FetchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }
}

// ── ViewScope ────────────────────────────────────────────────────────

/// Lifetime of a visible page. Work run in the scope is abandoned once
/// the page is left.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope that also ends when `self` ends.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn leave(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run `fut` unless the page is left first; `None` means it was.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

// ── Device table ─────────────────────────────────────────────────────

/// Which listing backs the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableSource {
    /// Public `GET /devices/`, sorted server-side.
    #[default]
    All,
    /// The current user's devices. The server ignores sorting here.
    Mine,
}

/// Where a click inside a row landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOrigin {
    Row,
    /// A nested link or button, which handles the click itself.
    Control,
}

/// The fetch key: any change means a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableQuery {
    pub page: u64,
    pub rows_per_page: u64,
    pub sort_field: DeviceSortField,
    pub sort_direction: SortDirection,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            sort_field: DeviceSortField::Name,
            sort_direction: SortDirection::Desc,
        }
    }
}

impl TableQuery {
    pub fn skip(&self) -> u64 {
        self.page * self.rows_per_page
    }

    pub fn to_params(&self) -> ListDevicesParams {
        ListDevicesParams {
            skip: self.skip(),
            limit: Some(self.rows_per_page),
            sort_field: Some(self.sort_field),
            sort_direction: Some(self.sort_direction),
            ..ListDevicesParams::default()
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            skip: self.skip(),
            limit: self.rows_per_page,
        }
    }
}

/// A table row, shared by both listing shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRow {
    pub id: String,
    pub name: String,
    pub serial_number: String,
    pub owner: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.to_string(),
            name: or_na(&d.name),
            serial_number: or_na(&d.serial_number),
            owner: d.owner_label().to_owned(),
        }
    }
}

impl From<&UserDevice> for DeviceRow {
    fn from(d: &UserDevice) -> Self {
        Self {
            id: d.id.clone(),
            name: or_na(&d.name),
            serial_number: d.id.clone(),
            owner: "N/A".into(),
        }
    }
}

fn or_na(s: &str) -> String {
    if s.is_empty() { "N/A".into() } else { s.to_owned() }
}

/// Paging, sorting, and rows of the device list page.
///
/// Rows always reflect the last successful fetch; a failed fetch keeps
/// them and sets `error`.
#[derive(Debug, Default)]
pub struct DeviceTable {
    pub source: TableSource,
    query: TableQuery,
    rows: Vec<DeviceRow>,
    total: u64,
    loading: bool,
    error: Option<String>,
    tracker: FetchTracker,
}

impl DeviceTable {
    pub fn new(source: TableSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Start from an explicit query instead of the defaults.
    pub fn with_query(source: TableSource, query: TableQuery) -> Self {
        Self {
            source,
            query,
            ..Self::default()
        }
    }

    pub fn query(&self) -> TableQuery {
        self.query
    }

    pub fn rows(&self) -> &[DeviceRow] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // ── Query changes ────────────────────────────────────────────────

    /// Sort by `field`. The active field in ascending order flips to
    /// descending; anything else sorts ascending. Always back to page 0.
    pub fn request_sort(&mut self, field: DeviceSortField) {
        let is_asc =
            self.query.sort_field == field && self.query.sort_direction == SortDirection::Asc;
        self.query.sort_direction = if is_asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.query.sort_field = field;
        self.query.page = 0;
    }

    /// Change page size; unsupported sizes are ignored. Back to page 0.
    pub fn set_rows_per_page(&mut self, rows: u64) -> bool {
        if !ROWS_PER_PAGE_OPTIONS.contains(&rows) {
            return false;
        }
        self.query.rows_per_page = rows;
        self.query.page = 0;
        true
    }

    /// Step to the next size in `ROWS_PER_PAGE_OPTIONS`, wrapping.
    pub fn cycle_rows_per_page(&mut self) {
        let idx = ROWS_PER_PAGE_OPTIONS
            .iter()
            .position(|r| *r == self.query.rows_per_page)
            .map_or(0, |i| (i + 1) % ROWS_PER_PAGE_OPTIONS.len());
        self.set_rows_per_page(ROWS_PER_PAGE_OPTIONS[idx]);
    }

    pub fn set_page(&mut self, page: u64) {
        self.query.page = page.min(self.last_page());
    }

    pub fn next_page(&mut self) -> bool {
        if self.query.page < self.last_page() {
            self.query.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.query.page > 0 {
            self.query.page -= 1;
            true
        } else {
            false
        }
    }

    /// Last reachable page index given the known total.
    pub fn last_page(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.total - 1) / self.query.rows_per_page
    }

    // ── Fetch lifecycle ──────────────────────────────────────────────

    /// Mark a fetch for the current query as in flight.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.loading = true;
        self.tracker.begin()
    }

    /// Apply a finished fetch. Stale tickets are dropped and `false`
    /// returned.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<DeviceList<DeviceRow>, CoreError>,
    ) -> bool {
        if !self.tracker.is_current(ticket) {
            debug!("dropping stale device list response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(list) => {
                self.rows = list.devices;
                self.total = list.total;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(format!("Error loading devices: {e}"));
            }
        }
        true
    }

    // ── Rows ─────────────────────────────────────────────────────────

    /// 1-based row number across pages.
    pub fn row_number(&self, index: usize) -> u64 {
        self.query.skip() + u64::try_from(index).unwrap_or(u64::MAX) + 1
    }

    /// Where a click on row `index` leads, if anywhere.
    pub fn row_click(&self, index: usize, origin: ClickOrigin) -> Option<Route> {
        if origin == ClickOrigin::Control {
            return None;
        }
        self.rows
            .get(index)
            .map(|row| Route::DeviceDetail(row.serial_number.clone()))
    }

    /// `from-to / total`, e.g. `21-40 / 57`.
    pub fn range_label(&self) -> String {
        if self.rows.is_empty() {
            return format!("0-0 / {}", self.total);
        }
        let from = self.query.skip() + 1;
        let to = self.query.skip() + u64::try_from(self.rows.len()).unwrap_or(u64::MAX);
        format!("{from}-{to} / {}", self.total)
    }
}

/// Map an API device list into table rows.
pub fn rows_from<T>(list: &DeviceList<T>) -> DeviceList<DeviceRow>
where
    for<'a> DeviceRow: From<&'a T>,
{
    DeviceList {
        devices: list.devices.iter().map(DeviceRow::from).collect(),
        total: list.total,
    }
}
