use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::grid::{Alignment, ColumnView, FetchStatus, GridView, SortDirection};

/// Column widths are kept in pixels; a terminal cell stands for this many.
pub const PIXELS_PER_CELL: u32 = 10;
const MIN_CELLS: usize = 3;

pub fn cells_for_width(width: u32) -> usize {
    ((width / PIXELS_PER_CELL) as usize).max(MIN_CELLS)
}

pub fn truncate_content(content: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if content.width() <= max_width {
        return content.to_string();
    }

    let target_width = max_width.saturating_sub(1);
    let mut result = String::new();
    let mut current_width = 0;
    for c in content.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > target_width {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

pub fn pad_cell(content: &str, width: usize, align: Alignment) -> String {
    let content = truncate_content(content, width);
    let gap = width.saturating_sub(content.width());
    match align {
        Alignment::Left => format!("{content}{}", " ".repeat(gap)),
        Alignment::Right => format!("{}{content}", " ".repeat(gap)),
        Alignment::Center => {
            let left = gap / 2;
            format!("{}{content}{}", " ".repeat(left), " ".repeat(gap - left))
        }
    }
}

fn header_text(column: &ColumnView) -> String {
    let mut text = column.label.to_uppercase();
    match column.sort {
        Some(SortDirection::Ascending) => text.push_str(" ▲"),
        Some(SortDirection::Descending) => text.push_str(" ▼"),
        None => {}
    }
    text
}

fn single_line(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

/// Draws the grid as plain lines: banner, header, rows, footer.
pub fn render_table(view: &GridView, color: bool) -> String {
    let widths: Vec<usize> = view
        .columns
        .iter()
        .map(|c| cells_for_width(c.width))
        .collect();
    let mut out = String::new();

    if let Some(banner) = view.banner.as_deref() {
        let line = format!("[NOTE] {banner}");
        if color {
            out.push_str(&line.yellow().to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }

    let active_filters: Vec<String> = view
        .columns
        .iter()
        .filter_map(|c| c.filter.as_ref().map(|f| format!("{}~\"{f}\"", c.key)))
        .collect();
    if !active_filters.is_empty() || !view.global_filter.is_empty() {
        let mut line = String::from(":: filters  : ");
        let mut parts = active_filters;
        if !view.global_filter.is_empty() {
            parts.push(format!("*~\"{}\"", view.global_filter));
        }
        line.push_str(&parts.join(" "));
        out.push_str(&line);
        out.push('\n');
    }

    let header = view
        .columns
        .iter()
        .zip(widths.iter())
        .map(|(c, &w)| pad_cell(&header_text(c), w, c.align))
        .collect::<Vec<_>>()
        .join(" │ ");
    if color {
        out.push_str(&header.bold().to_string());
    } else {
        out.push_str(&header);
    }
    out.push('\n');

    let rule = widths
        .iter()
        .map(|&w| "─".repeat(w))
        .collect::<Vec<_>>()
        .join("─┼─");
    out.push_str(&rule);
    out.push('\n');

    for row in &view.rows {
        let line = view
            .columns
            .iter()
            .zip(widths.iter())
            .map(|(c, &w)| pad_cell(&single_line(&row.cell_text(&c.key)), w, c.align))
            .collect::<Vec<_>>()
            .join(" │ ");
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if let Some(message) = view.empty_message.as_deref() {
        out.push_str("  ");
        out.push_str(message);
        out.push('\n');
    }

    out.push_str(&rule);
    out.push('\n');

    if let Some(error) = view.error.as_deref() {
        let line = format!("[ERR] Error: {error}");
        if color {
            out.push_str(&line.red().to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');
    }

    let status = match view.status {
        FetchStatus::Idle => "",
        FetchStatus::Loading => " · loading",
        FetchStatus::Fetching => " · fetching",
    };
    out.push_str(&format!(
        "Page {} of {} · {} rows per page{status}\n",
        view.page_number,
        view.page_count.max(1),
        view.page_size
    ));
    out.push_str(&view.summary());
    out.push('\n');
    out
}
