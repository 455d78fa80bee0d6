use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::{value_text, Row, SortDirection, SortEntry};

fn next_direction(current: Option<SortDirection>) -> Option<SortDirection> {
    match current {
        None => Some(SortDirection::Ascending),
        Some(SortDirection::Ascending) => Some(SortDirection::Descending),
        Some(SortDirection::Descending) => None,
    }
}

pub fn direction_of(sort: &[SortEntry], column: &str) -> Option<SortDirection> {
    sort.iter()
        .find(|e| e.column == column)
        .map(|e| e.direction)
}

/// Header click: cycles the clicked column and drops every other sort.
pub fn cycle_single(sort: &mut Vec<SortEntry>, column: &str) {
    let current = direction_of(sort, column);
    sort.clear();
    if let Some(direction) = next_direction(current) {
        sort.push(SortEntry {
            column: column.to_string(),
            direction,
        });
    }
}

/// Shift-click: cycles the column in place, appending it when absent.
pub fn cycle_multi(sort: &mut Vec<SortEntry>, column: &str) {
    match sort.iter().position(|e| e.column == column) {
        Some(pos) => match next_direction(Some(sort[pos].direction)) {
            Some(direction) => sort[pos].direction = direction,
            None => {
                sort.remove(pos);
            }
        },
        None => sort.push(SortEntry {
            column: column.to_string(),
            direction: SortDirection::Ascending,
        }),
    }
}

static NULL: Value = Value::Null;

fn class_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::Bool(_) => 2,
        _ => 3,
    }
}

enum Numeric {
    Int(i128),
    Float(f64),
}

fn numeric(n: &Number) -> Numeric {
    if let Some(i) = n.as_i64() {
        Numeric::Int(i128::from(i))
    } else if let Some(u) = n.as_u64() {
        Numeric::Int(i128::from(u))
    } else {
        Numeric::Float(n.as_f64().unwrap_or(0.0))
    }
}

// Exact: a float equal to the rounded integer is integral and in range.
fn compare_int_float(i: i128, f: f64) -> Ordering {
    match (i as f64).total_cmp(&f) {
        Ordering::Equal => i.cmp(&(f as i128)),
        ord => ord,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (numeric(a), numeric(b)) {
        (Numeric::Int(x), Numeric::Int(y)) => x.cmp(&y),
        (Numeric::Float(x), Numeric::Float(y)) => x.total_cmp(&y),
        (Numeric::Int(x), Numeric::Float(y)) => compare_int_float(x, y),
        (Numeric::Float(x), Numeric::Int(y)) => compare_int_float(y, x).reverse(),
    }
}

/// Missing and null first, then numbers, then booleans, then everything
/// else by case-folded text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&NULL);
    let b = b.unwrap_or(&NULL);
    match class_rank(a).cmp(&class_rank(b)) {
        Ordering::Equal => {}
        ord => return ord,
    }
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => {
            let x = value_text(x);
            let y = value_text(y);
            x.to_lowercase()
                .cmp(&y.to_lowercase())
                .then_with(|| x.cmp(&y))
        }
    }
}

/// Stable sort, so an empty sort leaves fetch order untouched.
pub fn sort_rows(rows: &mut [&Row], sort: &[SortEntry]) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for entry in sort {
            let ord = compare_values(a.get(&entry.column), b.get(&entry.column));
            let ord = match entry.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}
