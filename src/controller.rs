use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::{PageCache, PageKey, DEFAULT_STALE_TIME};
use crate::fetcher::FetchFailure;
use crate::grid::view::{self, ViewInputs};
use crate::grid::{
    is_allowed_page_size, page_count, sort, Column, ColumnSet, ColumnView, Effect, FetchStatus,
    GridError, GridMessage, GridState, GridView, PageRequest, PageResult, Row,
};

pub const DEFAULT_QUERY_KEY: &str = "table-data";
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub endpoint: String,
    /// Caller-supplied truth; the grid never derives it from fetched rows.
    pub total_items: usize,
    pub query_key: String,
}

impl ApiConfig {
    pub fn new(endpoint: impl Into<String>, total_items: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            total_items,
            query_key: DEFAULT_QUERY_KEY.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GridConfig {
    pub columns: Vec<Column>,
    pub api: ApiConfig,
    pub initial_page_size: usize,
    pub stale_time: Duration,
}

impl GridConfig {
    pub fn new(columns: Vec<Column>, api: ApiConfig) -> Self {
        Self {
            columns,
            api,
            initial_page_size: DEFAULT_PAGE_SIZE,
            stale_time: DEFAULT_STALE_TIME,
        }
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.initial_page_size = size;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }
}

/// Identity of one issued fetch. Only the latest ticket may resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    request: PageRequest,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The rows became the visible page.
    Applied,
    /// The failure became the error overlay.
    Failed,
    /// A newer request was issued after this one; nothing changed.
    Superseded,
}

/// Owns the grid state and decides when a page has to be fetched.
///
/// Every operation is a synchronous transition. Operations that need a new
/// page hand back a [`FetchTicket`]; the caller runs the fetch and reports
/// the outcome through [`GridController::resolve`].
#[derive(Debug)]
pub struct GridController {
    columns: ColumnSet,
    api: ApiConfig,
    state: GridState,
    page: Option<PageResult>,
    in_flight: Option<FetchTicket>,
    last_seq: u64,
    error: Option<FetchFailure>,
    cache: PageCache,
}

impl GridController {
    /// Builds the grid and issues the fetch for the first page.
    pub fn mount(config: GridConfig) -> Result<(Self, Option<FetchTicket>), GridError> {
        if !is_allowed_page_size(config.initial_page_size) {
            return Err(GridError::InvalidPageSize {
                size: config.initial_page_size,
            });
        }
        let columns = ColumnSet::new(config.columns)?;
        let state = GridState::new(&columns, config.initial_page_size);
        let mut controller = Self {
            columns,
            api: config.api,
            state,
            page: None,
            in_flight: None,
            last_seq: 0,
            error: None,
            cache: PageCache::new(config.stale_time),
        };
        let ticket = controller.request_current_page();
        Ok((controller, ticket))
    }

    pub fn dispatch(&mut self, message: GridMessage) -> Result<Option<FetchTicket>, GridError> {
        let effect = self
            .state
            .apply(&message, &self.columns, self.api.total_items)?;
        match effect {
            Effect::Local => Ok(None),
            Effect::Refetch => Ok(self.request_current_page()),
        }
    }

    pub fn set_sort(&mut self, column: &str) -> Result<(), GridError> {
        self.dispatch(GridMessage::SetSort(column.to_string())).map(|_| ())
    }

    pub fn add_sort(&mut self, column: &str) -> Result<(), GridError> {
        self.dispatch(GridMessage::AddSort(column.to_string())).map(|_| ())
    }

    pub fn set_column_filter(&mut self, column: &str, pattern: &str) -> Result<(), GridError> {
        self.dispatch(GridMessage::SetColumnFilter {
            column: column.to_string(),
            pattern: pattern.to_string(),
        })
        .map(|_| ())
    }

    // Neither message names a column, so neither can be rejected.
    pub fn set_global_filter(&mut self, pattern: &str) {
        let _ = self.dispatch(GridMessage::SetGlobalFilter(pattern.to_string()));
    }

    pub fn clear_filters(&mut self) {
        let _ = self.dispatch(GridMessage::ClearFilters);
    }

    pub fn set_page(&mut self, index: usize) -> Option<FetchTicket> {
        self.navigate(GridMessage::SetPage(index))
    }

    pub fn first_page(&mut self) -> Option<FetchTicket> {
        self.navigate(GridMessage::FirstPage)
    }

    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        self.navigate(GridMessage::PreviousPage)
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        self.navigate(GridMessage::NextPage)
    }

    pub fn last_page(&mut self) -> Option<FetchTicket> {
        self.navigate(GridMessage::LastPage)
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<Option<FetchTicket>, GridError> {
        self.dispatch(GridMessage::SetPageSize(size))
    }

    pub fn resize_column(&mut self, column: &str, delta: i32) -> Result<u32, GridError> {
        self.dispatch(GridMessage::ResizeColumn {
            column: column.to_string(),
            delta,
        })?;
        Ok(self.state.column_width(column).unwrap_or_default())
    }

    pub fn reset_column_size(&mut self, column: &str) -> Result<(), GridError> {
        self.dispatch(GridMessage::ResetColumnSize(column.to_string())).map(|_| ())
    }

    // Page moves never name a column or a page size, so they cannot fail.
    fn navigate(&mut self, message: GridMessage) -> Option<FetchTicket> {
        self.dispatch(message).ok().flatten()
    }

    fn request_current_page(&mut self) -> Option<FetchTicket> {
        let request = self.state.pagination();
        self.last_seq += 1;
        let seq = self.last_seq;

        let key = PageKey::new(&self.api.query_key, request);
        if let Some(cached) = self.cache.get_fresh(&key, Instant::now()) {
            debug!(seq, page = request.page_index, size = request.page_size, "serving cached page");
            self.page = Some(cached.clone());
            self.in_flight = None;
            self.error = None;
            return None;
        }

        let ticket = FetchTicket { seq, request };
        debug!(
            seq,
            start = request.start(),
            limit = request.limit(),
            "issuing page fetch"
        );
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Applies a finished fetch, unless a newer one was issued since.
    pub fn resolve(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Vec<Row>, FetchFailure>,
    ) -> Resolution {
        if self.in_flight != Some(ticket) {
            debug!(seq = ticket.seq, latest = self.last_seq, "discarding superseded page");
            return Resolution::Superseded;
        }
        self.in_flight = None;

        match outcome {
            Ok(mut rows) => {
                rows.truncate(ticket.request.page_size);
                let result = PageResult {
                    request: ticket.request,
                    rows,
                    fetched_at: Instant::now(),
                };
                self.cache.insert(
                    PageKey::new(&self.api.query_key, ticket.request),
                    result.clone(),
                );
                self.page = Some(result);
                self.error = None;
                Resolution::Applied
            }
            Err(failure) => {
                warn!(seq = ticket.seq, error = %failure, "page fetch failed");
                self.error = Some(failure);
                Resolution::Failed
            }
        }
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// Last page that arrived, kept visible while newer ones load or fail.
    pub fn page(&self) -> Option<&PageResult> {
        self.page.as_ref()
    }

    pub fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn total_items(&self) -> usize {
        self.api.total_items
    }

    pub fn page_count(&self) -> usize {
        page_count(self.api.total_items, self.state.pagination().page_size)
    }

    pub fn can_previous_page(&self) -> bool {
        !self.is_fetching() && self.state.pagination().page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        !self.is_fetching() && self.state.pagination().page_index + 1 < self.page_count()
    }

    pub fn status(&self) -> FetchStatus {
        match (self.in_flight.is_some(), self.page.is_some()) {
            (false, _) => FetchStatus::Idle,
            (true, false) => FetchStatus::Loading,
            (true, true) => FetchStatus::Fetching,
        }
    }

    pub fn view(&self) -> GridView {
        let columns = self
            .columns
            .iter()
            .map(|c| ColumnView {
                key: c.key.clone(),
                label: c.label.clone(),
                align: c.align,
                width: self.state.column_width(&c.key).unwrap_or(c.sizing.current),
                sort: sort::direction_of(self.state.sort(), &c.key),
                filter: self.state.column_filters().get(&c.key).cloned(),
            })
            .collect();
        let page_rows = self.page.as_ref().map(|p| p.rows.as_slice()).unwrap_or(&[]);
        view::build(ViewInputs {
            columns,
            page_rows,
            state: &self.state,
            page_count: self.page_count(),
            total_items: self.api.total_items,
            status: self.status(),
            error: self.error.as_ref().map(|e| e.to_string()),
            can_previous: self.can_previous_page(),
            can_next: self.can_next_page(),
        })
    }
}
