use std::collections::BTreeMap;

use super::{value_text, Row};

/// Case-insensitive substring test; an empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// Global search looks at every field of the row, configured or not.
fn matches_global(row: &Row, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let needle = pattern.to_lowercase();
    row.fields()
        .values()
        .any(|v| value_text(v).to_lowercase().contains(&needle))
}

pub fn row_matches(row: &Row, column_filters: &BTreeMap<String, String>, global: &str) -> bool {
    column_filters
        .iter()
        .all(|(key, pattern)| contains_ignore_case(&row.cell_text(key), pattern))
        && matches_global(row, global)
}

pub fn apply_filters<'a>(
    rows: &'a [Row],
    column_filters: &BTreeMap<String, String>,
    global: &str,
) -> Vec<&'a Row> {
    rows.iter()
        .filter(|row| row_matches(row, column_filters, global))
        .collect()
}
