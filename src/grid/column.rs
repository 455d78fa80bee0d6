use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::GridError;

pub const DEFAULT_MIN_SIZE: u32 = 80;
pub const DEFAULT_MAX_SIZE: u32 = 800;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "left" | "l" => Some(Self::Left),
            "center" | "centre" | "c" => Some(Self::Center),
            "right" | "r" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnSizing {
    pub current: u32,
    pub min: u32,
    pub max: u32,
}

impl ColumnSizing {
    pub fn clamp(&self, width: i64) -> u32 {
        width.clamp(i64::from(self.min), i64::from(self.max)) as u32
    }
}

/// Width a column gets when the caller does not configure one.
pub fn default_size_for(key: &str) -> u32 {
    match key {
        "id" => 80,
        "userId" => 100,
        "title" => 300,
        "body" => 400,
        _ => 150,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: String,
    pub label: String,
    pub align: Alignment,
    pub sizing: ColumnSizing,
}

impl Column {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let key = key.into();
        let current = default_size_for(&key);
        Self {
            key,
            label: label.into(),
            align: Alignment::default(),
            sizing: ColumnSizing {
                current,
                min: DEFAULT_MIN_SIZE,
                max: DEFAULT_MAX_SIZE,
            },
        }
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.sizing.current = size;
        self
    }

    pub fn min_size(mut self, min: u32) -> Self {
        self.sizing.min = min;
        self
    }

    pub fn max_size(mut self, max: u32) -> Self {
        self.sizing.max = max;
        self
    }

    pub fn default_width(&self) -> u32 {
        self.sizing.clamp(i64::from(self.sizing.current))
    }
}

/// The fixed, validated column configuration of one grid.
#[derive(Clone, Debug)]
pub struct ColumnSet {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl ColumnSet {
    pub fn new(columns: Vec<Column>) -> Result<Self, GridError> {
        if columns.is_empty() {
            return Err(GridError::NoColumns);
        }
        let mut index = HashMap::with_capacity(columns.len());
        let mut out = Vec::with_capacity(columns.len());
        for (i, mut column) in columns.into_iter().enumerate() {
            if column.key.trim().is_empty() {
                return Err(GridError::EmptyColumnKey);
            }
            if column.sizing.min > column.sizing.max {
                return Err(GridError::InvalidColumnSizing {
                    column: column.key,
                    min: column.sizing.min,
                    max: column.sizing.max,
                });
            }
            if index.insert(column.key.clone(), i).is_some() {
                return Err(GridError::DuplicateColumn { column: column.key });
            }
            column.sizing.current = column.default_width();
            out.push(column);
        }
        Ok(Self {
            columns: out,
            index,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Column> {
        self.index.get(key).map(|&i| &self.columns[i])
    }

    pub fn require(&self, key: &str) -> Result<&Column, GridError> {
        self.get(key).ok_or_else(|| GridError::UnknownColumn {
            column: key.to_string(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
