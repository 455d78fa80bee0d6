pub mod table;

use crate::grid::GridView;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render(view: &GridView, format: OutputFormat, color: bool) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(view, color),
        OutputFormat::Json => render_json(view),
    }
}

pub fn render_text(view: &GridView, color: bool) -> Vec<u8> {
    table::render_table(view, color).into_bytes()
}

pub fn render_json(view: &GridView) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(view).unwrap_or_else(|_| b"{}".to_vec());
    out.push(b'\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse(" txt "), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("xml"), None);
    }
}
