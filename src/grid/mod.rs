pub mod column;
pub mod filters;
pub mod sort;
pub mod state;
pub mod view;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use column::{Alignment, Column, ColumnSet, ColumnSizing};
pub use state::{Effect, GridMessage, GridState};
pub use view::{ColumnView, FetchStatus, GridView};

/// Page sizes a grid can be switched to.
pub const ALLOWED_PAGE_SIZES: [usize; 5] = [10, 20, 30, 50, 100];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("at least one column is required")]
    NoColumns,

    #[error("column key must not be empty")]
    EmptyColumnKey,

    #[error("duplicate column key: {column}")]
    DuplicateColumn { column: String },

    #[error("invalid sizing for column {column}: min {min} is greater than max {max}")]
    InvalidColumnSizing { column: String, min: u32, max: u32 },

    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("invalid page size {size}, expected one of 10, 20, 30, 50, 100")]
    InvalidPageSize { size: usize },
}

/// One fetched record: column key to displayable value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Display text of a cell; a missing key renders empty.
    pub fn cell_text(&self, key: &str) -> String {
        self.0.get(key).map(value_text).unwrap_or_default()
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequest {
    pub page_index: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Offset of the first row, sent as `_start`.
    pub fn start(&self) -> usize {
        self.page_index * self.page_size
    }

    /// Sent as `_limit`.
    pub fn limit(&self) -> usize {
        self.page_size
    }
}

#[derive(Clone, Debug)]
pub struct PageResult {
    pub request: PageRequest,
    pub rows: Vec<Row>,
    pub fetched_at: Instant,
}

pub fn page_count(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

pub fn clamp_page_index(index: usize, page_count: usize) -> usize {
    if page_count == 0 {
        0
    } else {
        index.min(page_count - 1)
    }
}

pub fn is_allowed_page_size(size: usize) -> bool {
    ALLOWED_PAGE_SIZES.contains(&size)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortEntry {
    pub column: String,
    pub direction: SortDirection,
}
