use crate::grid::GridMessage;

/// One line typed at the grid prompt or passed with `-x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Grid(GridMessage),
    Show,
    Help,
    Quit,
}

pub const COMMAND_HELP: &str = "\
Commands:
  next | n                 go to the next page
  prev | p                 go to the previous page
  first                    go to the first page
  last                     go to the last page
  page <N>                 go to page N (1-based)
  size <N>                 rows per page (10, 20, 30, 50, 100)
  sort <KEY>               cycle sorting on a column (asc, desc, none)
  sort+ <KEY>              add a column to a multi-column sort
  filter <KEY> [PATTERN]   filter a column on this page (empty clears)
  search [PATTERN]         search every field on this page (empty clears)
  clear                    drop all filters
  resize <KEY> <DELTA>     widen or narrow a column by DELTA px
  reset <KEY>              restore a column's default width
  show                     print the grid again
  help                     print this help
  quit | q                 exit";

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "next" | "n" => Command::Grid(GridMessage::NextPage),
        "prev" | "previous" | "p" => Command::Grid(GridMessage::PreviousPage),
        "first" => Command::Grid(GridMessage::FirstPage),
        "last" => Command::Grid(GridMessage::LastPage),
        "page" => {
            let number = parse_number::<usize>(rest, "page")?;
            if number == 0 {
                return Err("page numbers start at 1".to_string());
            }
            Command::Grid(GridMessage::SetPage(number - 1))
        }
        "size" => Command::Grid(GridMessage::SetPageSize(parse_number::<usize>(rest, "size")?)),
        "sort" => Command::Grid(GridMessage::SetSort(require_key(rest, "sort")?)),
        "sort+" => Command::Grid(GridMessage::AddSort(require_key(rest, "sort+")?)),
        "filter" => {
            let (column, pattern) = match rest.split_once(char::is_whitespace) {
                Some((column, pattern)) => (column, pattern.trim()),
                None => (rest, ""),
            };
            Command::Grid(GridMessage::SetColumnFilter {
                column: require_key(column, "filter")?,
                pattern: pattern.to_string(),
            })
        }
        "search" => Command::Grid(GridMessage::SetGlobalFilter(rest.to_string())),
        "clear" => Command::Grid(GridMessage::ClearFilters),
        "resize" => {
            let mut parts = rest.split_whitespace();
            let column = require_key(parts.next().unwrap_or_default(), "resize")?;
            let delta = parse_number::<i32>(parts.next().unwrap_or_default(), "resize")?;
            Command::Grid(GridMessage::ResizeColumn { column, delta })
        }
        "reset" => Command::Grid(GridMessage::ResetColumnSize(require_key(rest, "reset")?)),
        "show" | "s" => Command::Show,
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn require_key(value: &str, command: &str) -> Result<String, String> {
    let key = value.trim();
    if key.is_empty() {
        return Err(format!("'{command}' needs a column key"));
    }
    Ok(key.to_string())
}

fn parse_number<T: std::str::FromStr>(value: &str, command: &str) -> Result<T, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("'{command}' needs a number"));
    }
    value
        .parse::<T>()
        .map_err(|_| format!("invalid number '{value}' for '{command}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_are_one_based() {
        assert_eq!(
            parse_command("page 3").unwrap(),
            Some(Command::Grid(GridMessage::SetPage(2)))
        );
        assert!(parse_command("page 0").is_err());
        assert!(parse_command("page").is_err());
    }

    #[test]
    fn filter_keeps_spaces_in_pattern() {
        assert_eq!(
            parse_command("filter title sunt aut").unwrap(),
            Some(Command::Grid(GridMessage::SetColumnFilter {
                column: "title".to_string(),
                pattern: "sunt aut".to_string(),
            }))
        );
    }

    #[test]
    fn bare_search_clears_global_filter() {
        assert_eq!(
            parse_command("search").unwrap(),
            Some(Command::Grid(GridMessage::SetGlobalFilter(String::new())))
        );
    }

    #[test]
    fn resize_accepts_negative_delta() {
        assert_eq!(
            parse_command("resize body -50").unwrap(),
            Some(Command::Grid(GridMessage::ResizeColumn {
                column: "body".to_string(),
                delta: -50,
            }))
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# note").unwrap(), None);
    }

    #[test]
    fn unknown_commands_are_rejected() {
        let err = parse_command("jump 4").unwrap_err();
        assert!(err.contains("jump"));
    }
}
