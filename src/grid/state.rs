use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    clamp_page_index, is_allowed_page_size, page_count, sort, ColumnSet, GridError, PageRequest,
    SortEntry,
};

/// User intent, one variant per grid operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridMessage {
    SetSort(String),
    AddSort(String),
    SetColumnFilter { column: String, pattern: String },
    SetGlobalFilter(String),
    ClearFilters,
    SetPage(usize),
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    SetPageSize(usize),
    ResizeColumn { column: String, delta: i32 },
    ResetColumnSize(String),
}

/// What a transition did to the page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Only local state changed; the current page stays as is.
    Local,
    /// The page request changed and a new page is needed.
    Refetch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GridState {
    sort: Vec<SortEntry>,
    column_filters: BTreeMap<String, String>,
    global_filter: String,
    pagination: PageRequest,
    column_sizing: BTreeMap<String, u32>,
}

impl GridState {
    pub fn new(columns: &ColumnSet, page_size: usize) -> Self {
        let column_sizing = columns
            .iter()
            .map(|c| (c.key.clone(), c.sizing.current))
            .collect();
        Self {
            sort: Vec::new(),
            column_filters: BTreeMap::new(),
            global_filter: String::new(),
            pagination: PageRequest::new(0, page_size),
            column_sizing,
        }
    }

    pub fn sort(&self) -> &[SortEntry] {
        &self.sort
    }

    pub fn column_filters(&self) -> &BTreeMap<String, String> {
        &self.column_filters
    }

    pub fn global_filter(&self) -> &str {
        &self.global_filter
    }

    pub fn pagination(&self) -> PageRequest {
        self.pagination
    }

    pub fn column_width(&self, column: &str) -> Option<u32> {
        self.column_sizing.get(column).copied()
    }

    pub fn column_sizing(&self) -> &BTreeMap<String, u32> {
        &self.column_sizing
    }

    pub fn has_local_operations(&self) -> bool {
        !self.sort.is_empty() || !self.column_filters.is_empty() || !self.global_filter.is_empty()
    }

    /// Applies one message. On error the state is left untouched.
    pub fn apply(
        &mut self,
        message: &GridMessage,
        columns: &ColumnSet,
        total_items: usize,
    ) -> Result<Effect, GridError> {
        let pages = page_count(total_items, self.pagination.page_size);
        match message {
            GridMessage::SetSort(column) => {
                columns.require(column)?;
                sort::cycle_single(&mut self.sort, column);
                Ok(Effect::Local)
            }
            GridMessage::AddSort(column) => {
                columns.require(column)?;
                sort::cycle_multi(&mut self.sort, column);
                Ok(Effect::Local)
            }
            GridMessage::SetColumnFilter { column, pattern } => {
                columns.require(column)?;
                if pattern.is_empty() {
                    self.column_filters.remove(column);
                } else {
                    self.column_filters.insert(column.clone(), pattern.clone());
                }
                Ok(Effect::Local)
            }
            GridMessage::SetGlobalFilter(pattern) => {
                self.global_filter = pattern.clone();
                Ok(Effect::Local)
            }
            GridMessage::ClearFilters => {
                self.column_filters.clear();
                self.global_filter.clear();
                Ok(Effect::Local)
            }
            GridMessage::SetPage(index) => Ok(self.move_to(*index, pages)),
            GridMessage::FirstPage => Ok(self.move_to(0, pages)),
            GridMessage::PreviousPage => {
                let index = self.pagination.page_index.saturating_sub(1);
                Ok(self.move_to(index, pages))
            }
            GridMessage::NextPage => {
                let index = self.pagination.page_index.saturating_add(1);
                Ok(self.move_to(index, pages))
            }
            GridMessage::LastPage => Ok(self.move_to(pages.saturating_sub(1), pages)),
            GridMessage::SetPageSize(size) => {
                if !is_allowed_page_size(*size) {
                    return Err(GridError::InvalidPageSize { size: *size });
                }
                let next_pages = page_count(total_items, *size);
                let next = PageRequest::new(
                    clamp_page_index(self.pagination.page_index, next_pages),
                    *size,
                );
                Ok(self.replace_request(next))
            }
            GridMessage::ResizeColumn { column, delta } => {
                let sizing = columns.require(column)?.sizing;
                let width = self.column_width(column).unwrap_or(sizing.current);
                let next = sizing.clamp(i64::from(width) + i64::from(*delta));
                self.column_sizing.insert(column.clone(), next);
                Ok(Effect::Local)
            }
            GridMessage::ResetColumnSize(column) => {
                let default = columns.require(column)?.default_width();
                self.column_sizing.insert(column.clone(), default);
                Ok(Effect::Local)
            }
        }
    }

    fn move_to(&mut self, index: usize, pages: usize) -> Effect {
        let next = PageRequest::new(clamp_page_index(index, pages), self.pagination.page_size);
        self.replace_request(next)
    }

    fn replace_request(&mut self, next: PageRequest) -> Effect {
        if next == self.pagination {
            return Effect::Local;
        }
        self.pagination = next;
        Effect::Refetch
    }
}
