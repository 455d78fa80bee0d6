use std::collections::HashSet;

use crate::grid::{Alignment, Column};

/// Parses `key[:label[:align[:size]]]` entries separated by commas.
pub fn parse_columns_spec(value: &str) -> Result<Vec<Column>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("columns list is empty".to_string());
    }

    let mut out: Vec<Column> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let mut fields = item.splitn(4, ':').map(|f| f.trim());
        let key = fields.next().unwrap_or_default();
        if key.is_empty() {
            return Err(format!("missing column key in '{item}'"));
        }
        if !seen.insert(key.to_string()) {
            return Err(format!("duplicate column '{key}'"));
        }

        let label = match fields.next() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => label_for_key(key),
        };
        let mut column = Column::new(key, label);

        if let Some(align) = fields.next().filter(|a| !a.is_empty()) {
            let align =
                Alignment::parse(align).ok_or_else(|| format!("invalid alignment '{align}'"))?;
            column = column.align(align);
        }
        if let Some(size) = fields.next().filter(|s| !s.is_empty()) {
            let size: u32 = size
                .parse()
                .map_err(|_| format!("invalid column size '{size}'"))?;
            column = column.size(size);
        }
        out.push(column);
    }

    if out.is_empty() {
        return Err("columns list is empty".to_string());
    }
    Ok(out)
}

/// Header text for a column key: `userId` becomes `User ID`.
pub fn label_for_key(key: &str) -> String {
    smart_break(key)
        .iter()
        .map(|word| {
            if word.eq_ignore_ascii_case("id") {
                "ID".to_string()
            } else {
                title_ascii(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn smart_break(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();

    let flush = |buf: &mut String, out: &mut Vec<String>| {
        if !buf.is_empty() {
            out.push(std::mem::take(buf));
        }
    };

    for i in 0..chars.len() {
        let ch = chars[i];
        if is_smart_separator(ch) {
            flush(&mut buf, &mut out);
            continue;
        }
        if !buf.is_empty() {
            let prev = buf.chars().last().unwrap_or(ch);
            let next = chars.get(i + 1).copied();
            if is_boundary(prev, ch, next) {
                flush(&mut buf, &mut out);
            }
        }
        buf.push(ch);
    }
    flush(&mut buf, &mut out);

    out.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_smart_separator(ch: char) -> bool {
    ch.is_whitespace() || ch == '_' || ch == '-' || ch == '.'
}

fn is_boundary(prev: char, curr: char, next: Option<char>) -> bool {
    if prev.is_ascii_lowercase() && curr.is_ascii_uppercase() {
        return true;
    }
    if prev.is_ascii_uppercase() && curr.is_ascii_uppercase() {
        if let Some(next) = next {
            if next.is_ascii_lowercase() {
                return true;
            }
        }
    }
    if prev.is_ascii_alphabetic() && curr.is_ascii_digit() {
        return true;
    }
    if prev.is_ascii_digit() && curr.is_ascii_alphabetic() {
        return true;
    }
    false
}

fn title_ascii(input: &str) -> String {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out = String::with_capacity(input.len());
    out.push(first.to_ascii_uppercase());
    for ch in chars {
        out.push(ch.to_ascii_lowercase());
    }
    out
}

pub fn parse_page_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid page size '{}'", value.trim()))?;
    if !crate::grid::is_allowed_page_size(size) {
        return Err(format!(
            "invalid page size {size}, expected one of 10, 20, 30, 50, 100"
        ));
    }
    Ok(size)
}
