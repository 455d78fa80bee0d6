use serde::Serialize;

use super::{filters, sort, Alignment, Row, SortDirection};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    /// No page has arrived yet and one is on the way.
    Loading,
    /// A page is visible and a newer one is on the way.
    Fetching,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnView {
    pub key: String,
    pub label: String,
    pub align: Alignment,
    pub width: u32,
    pub sort: Option<SortDirection>,
    pub filter: Option<String>,
}

/// Everything a front end needs to draw the grid once.
#[derive(Clone, Debug, Serialize)]
pub struct GridView {
    pub columns: Vec<ColumnView>,
    pub rows: Vec<Row>,
    pub page_number: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub page_rows: usize,
    pub filtered_rows: usize,
    pub global_filter: String,
    pub status: FetchStatus,
    pub error: Option<String>,
    pub banner: Option<String>,
    pub empty_message: Option<String>,
    pub can_previous: bool,
    pub can_next: bool,
}

pub(crate) struct ViewInputs<'a> {
    pub(crate) columns: Vec<ColumnView>,
    pub(crate) page_rows: &'a [Row],
    pub(crate) state: &'a super::GridState,
    pub(crate) page_count: usize,
    pub(crate) total_items: usize,
    pub(crate) status: FetchStatus,
    pub(crate) error: Option<String>,
    pub(crate) can_previous: bool,
    pub(crate) can_next: bool,
}

pub(crate) fn build(inputs: ViewInputs<'_>) -> GridView {
    let state = inputs.state;
    let mut visible = filters::apply_filters(
        inputs.page_rows,
        state.column_filters(),
        state.global_filter(),
    );
    let filtered_rows = visible.len();
    sort::sort_rows(&mut visible, state.sort());
    let rows: Vec<Row> = visible.into_iter().cloned().collect();

    let page_rows = inputs.page_rows.len();
    let banner = if state.has_local_operations() {
        Some(format!(
            "Filters and sorting only apply to the current page data ({page_rows} items). \
             To search or sort all {} items, navigate through pages or use server-side \
             operations if available.",
            inputs.total_items
        ))
    } else {
        None
    };

    let empty_message = if !rows.is_empty() {
        None
    } else if inputs.status == FetchStatus::Loading {
        Some("Loading data...".to_string())
    } else if page_rows > 0 {
        Some("No data matches your search criteria on this page.".to_string())
    } else {
        Some("No data available for this page.".to_string())
    };

    let pagination = state.pagination();
    GridView {
        columns: inputs.columns,
        rows,
        page_number: pagination.page_index + 1,
        page_count: inputs.page_count,
        page_size: pagination.page_size,
        total_items: inputs.total_items,
        page_rows,
        filtered_rows,
        global_filter: state.global_filter().to_string(),
        status: inputs.status,
        error: inputs.error,
        banner,
        empty_message,
        can_previous: inputs.can_previous,
        can_next: inputs.can_next,
    }
}

impl GridView {
    /// "Showing X of Y filtered results" footer line.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Showing {} of {} filtered results",
            self.rows.len(),
            self.filtered_rows
        );
        if self.filtered_rows != self.page_rows {
            out.push_str(&format!(
                " (from {} on this page, {} total)",
                self.page_rows, self.total_items
            ));
        } else {
            out.push_str(&format!(" (from {} total)", self.total_items));
        }
        out
    }

    pub fn is_fetching(&self) -> bool {
        self.status != FetchStatus::Idle
    }
}
