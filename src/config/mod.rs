use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// One column as written in the config file.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ColumnEntry {
    pub key: String,
    pub label: Option<String>,
    pub align: Option<String>,
    pub size: Option<u32>,
    pub min_size: Option<u32>,
    pub max_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub endpoint: Option<String>,
    #[serde(alias = "total_items")]
    pub total: Option<usize>,
    pub file: Option<String>,
    pub query_key: Option<String>,
    pub page_size: Option<usize>,
    pub stale_time: Option<u64>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub columns: Option<Vec<ColumnEntry>>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".pagegrid").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str, origin: &str) -> Result<ConfigFile, String> {
    serde_yaml::from_str::<ConfigFile>(contents)
        .map_err(|e| format!("failed to parse config '{origin}': {e}"))
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, &path.display().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grid_config_with_columns() {
        let cfg = parse_config(
            r#"
endpoint: https://jsonplaceholder.typicode.com/posts
total_items: 100
page_size: 20
columns:
  - key: id
    label: ID
    align: right
  - key: title
    size: 320
"#,
            "inline",
        )
        .unwrap();
        assert_eq!(cfg.total, Some(100));
        assert_eq!(cfg.page_size, Some(20));
        let columns = cfg.columns.unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].align.as_deref(), Some("right"));
        assert_eq!(columns[1].size, Some(320));
    }

    #[test]
    fn reports_origin_on_parse_failure() {
        let err = parse_config("page_size: [", "broken.yml").unwrap_err();
        assert!(err.contains("broken.yml"));
    }
}
