use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cache::DEFAULT_STALE_TIME;
use crate::cli::args::CliArgs;
use crate::cli::commands::{self, Command, COMMAND_HELP};
use crate::cli::validation;
use crate::config::{self, ColumnEntry, ConfigFile};
use crate::controller::{ApiConfig, GridConfig, DEFAULT_PAGE_SIZE, DEFAULT_QUERY_KEY};
use crate::fetcher::http::{HttpOptions, HttpPageFetcher};
use crate::fetcher::memory::MemoryPageFetcher;
use crate::fetcher::PageFetcher;
use crate::grid::{Alignment, Column};
use crate::output::{self, OutputFormat};
use crate::session::GridSession;

pub const DEMO_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
pub const DEMO_TOTAL_ITEMS: usize = 100;

fn demo_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID").align(Alignment::Right),
        Column::new("userId", "User ID").align(Alignment::Right),
        Column::new("title", "Title"),
        Column::new("body", "Body"),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Source {
    Endpoint(String),
    File(String),
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: Source,
    total: Option<usize>,
    columns: Option<Vec<Column>>,
    page_size: usize,
    query_key: String,
    stale_time: Duration,
    http: HttpOptions,
    exec: Vec<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn print_tag(tag: &str, message: &str) {
    let tag = match tag {
        "ERR" => tag.bold().red(),
        "WRN" => tag.bold().yellow(),
        _ => tag.bold().cyan(),
    };
    eprintln!("{}{}{} {}", "[".bold().white(), tag, "]".bold().white(), message);
}

fn flag_names(arg: &clap::Arg) -> String {
    let mut names: Vec<String> = arg.get_short().map(|c| format!("-{c}")).into_iter().collect();
    names.extend(arg.get_long().map(|l| format!("--{l}")));
    names.extend(
        arg.get_visible_aliases()
            .unwrap_or_default()
            .into_iter()
            .map(|a| format!("--{a}")),
    );
    let mut flags = names.join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        flags.push_str(&format!(" <{value}>"));
    }
    flags
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!(
        "{} {}\n{}\n\n{}\n\nUsage: {} [OPTIONS]\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default(),
        cmd.get_about().map(|a| a.to_string()).unwrap_or_default(),
        cmd.get_long_about().map(|a| a.to_string()).unwrap_or_default(),
        cmd.get_name(),
    );

    // Headings in first-seen order.
    let mut headings: Vec<&str> = Vec::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        let heading = arg.get_help_heading().unwrap_or("Options");
        if !headings.contains(&heading) {
            headings.push(heading);
        }
    }

    for heading in headings {
        out.push_str(&format!("\n{heading}:\n"));
        for arg in cmd
            .get_arguments()
            .filter(|a| !a.is_hide_set() && a.get_help_heading().unwrap_or("Options") == heading)
        {
            let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
            out.push_str(&format!("  {:<34} {}\n", flag_names(arg), help.trim()));
        }
    }

    out.push('\n');
    out.push_str(COMMAND_HELP);
    out.push('\n');
    out
}

fn columns_from_config(entries: &[ColumnEntry]) -> Result<Vec<Column>, String> {
    entries
        .iter()
        .map(|entry| {
            let key = entry.key.trim();
            let label = entry
                .label
                .clone()
                .unwrap_or_else(|| crate::utils::label_for_key(key));
            let mut column = Column::new(key, label);
            if let Some(raw) = entry.align.as_deref() {
                let align = Alignment::parse(raw)
                    .ok_or_else(|| format!("invalid alignment '{raw}' for column '{key}'"))?;
                column = column.align(align);
            }
            if let Some(size) = entry.size {
                column = column.size(size);
            }
            if let Some(min) = entry.min_size {
                column = column.min_size(min);
            }
            if let Some(max) = entry.max_size {
                column = column.max_size(max);
            }
            Ok(column)
        })
        .collect()
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let source = match (args.file, args.endpoint) {
        (Some(path), _) => Source::File(config::expand_tilde_string(&path)),
        (None, Some(url)) => Source::Endpoint(url.trim().to_string()),
        (None, None) => match (cfg.file, cfg.endpoint) {
            (Some(_), Some(_)) => {
                return Err("use either endpoint or file in config, not both".to_string())
            }
            (Some(path), None) => Source::File(config::expand_tilde_string(&path)),
            (None, Some(url)) => Source::Endpoint(url.trim().to_string()),
            (None, None) => Source::Endpoint(DEMO_ENDPOINT.to_string()),
        },
    };
    let is_demo = source == Source::Endpoint(DEMO_ENDPOINT.to_string());

    let mut total = args.total.or(cfg.total);
    if total.is_none() && is_demo {
        total = Some(DEMO_TOTAL_ITEMS);
    }
    if total.is_none() && matches!(source, Source::Endpoint(_)) {
        return Err("--total is required with a custom endpoint".to_string());
    }

    let columns = match (args.columns.as_deref(), cfg.columns.as_deref()) {
        (Some(raw), _) => Some(crate::utils::parse_columns_spec(raw)?),
        (None, Some(entries)) => Some(columns_from_config(entries)?),
        (None, None) if is_demo => Some(demo_columns()),
        (None, None) => None,
    };
    if columns.is_none() && matches!(source, Source::Endpoint(_)) {
        return Err("--columns is required with a custom endpoint".to_string());
    }

    let page_size = match (args.page_size.as_deref(), cfg.page_size) {
        (Some(raw), _) => crate::utils::parse_page_size(raw)?,
        (None, Some(size)) => crate::utils::parse_page_size(&size.to_string())?,
        (None, None) => DEFAULT_PAGE_SIZE,
    };

    let query_key = args
        .query_key
        .or(cfg.query_key)
        .unwrap_or_else(|| DEFAULT_QUERY_KEY.to_string());
    let stale_time = args
        .stale_time
        .or(cfg.stale_time)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_STALE_TIME);

    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let http = HttpOptions {
        timeout_seconds,
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        system_proxy: true,
    };

    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text or json"))?,
        None => OutputFormat::Text,
    };

    Ok(RunConfig {
        source,
        total,
        columns,
        page_size,
        query_key,
        stale_time,
        http,
        exec: args.exec,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pagegrid={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

struct Prepared {
    fetcher: Arc<dyn PageFetcher>,
    endpoint: String,
    total: usize,
    columns: Vec<Column>,
}

async fn prepare_source(run: &RunConfig) -> Result<Prepared, String> {
    match &run.source {
        Source::Endpoint(url) => {
            let fetcher = HttpPageFetcher::new(url, &run.http).map_err(|e| e.to_string())?;
            Ok(Prepared {
                fetcher: Arc::new(fetcher),
                endpoint: url.clone(),
                total: run.total.unwrap_or_default(),
                columns: run.columns.clone().unwrap_or_default(),
            })
        }
        Source::File(path) => {
            let fetcher = MemoryPageFetcher::from_json_file(path)
                .await
                .map_err(|e| e.to_string())?;
            let columns = match run.columns.clone() {
                Some(columns) => columns,
                None => fetcher
                    .field_keys()
                    .iter()
                    .map(|key| Column::new(key.as_str(), crate::utils::label_for_key(key)))
                    .collect(),
            };
            if columns.is_empty() {
                return Err(format!("no columns found in '{path}'"));
            }
            Ok(Prepared {
                total: run.total.unwrap_or_else(|| fetcher.total_items()),
                fetcher: Arc::new(fetcher),
                endpoint: path.clone(),
                columns,
            })
        }
    }
}

async fn settle_with_spinner(session: &mut GridSession, show: bool) -> Result<(), String> {
    let Some(ticket) = session.controller().in_flight() else {
        return Ok(());
    };
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(if show {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    });
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]")
            .map_err(|e| format!("failed to build progress bar style: {e}"))?,
    );
    let request = ticket.request();
    pb.set_message(format!(
        "fetching page {} (start={}, limit={})",
        request.page_index + 1,
        request.start(),
        request.limit()
    ));

    let resolutions = session.settle().await;
    pb.finish_and_clear();
    debug!(?resolutions, "grid settled");
    Ok(())
}

fn print_view(session: &GridSession, run: &RunConfig) {
    let rendered = output::render(&session.view(), run.output_format, !run.no_color);
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(&rendered);
    let _ = stdout.flush();
}

/// Runs one command line. Returns `false` once the user asked to quit.
async fn handle_line(session: &mut GridSession, run: &RunConfig, line: &str) -> bool {
    let command = match commands::parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            print_tag("ERR", &e);
            return true;
        }
    };

    match command {
        Command::Quit => return false,
        Command::Help => println!("{COMMAND_HELP}"),
        Command::Show => print_view(session, run),
        Command::Grid(message) => {
            debug!(?message, "dispatching");
            if let Err(e) = session.dispatch(message) {
                print_tag("ERR", &e.to_string());
                return true;
            }
            let show_spinner = run.output_format == OutputFormat::Text;
            if let Err(e) = settle_with_spinner(session, show_spinner).await {
                print_tag("ERR", &e);
            }
            print_view(session, run);
        }
    }
    true
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let prepared = prepare_source(&run).await?;
    let mut api = ApiConfig::new(prepared.endpoint.clone(), prepared.total);
    api.query_key = run.query_key.clone();
    let grid_config = GridConfig::new(prepared.columns, api)
        .page_size(run.page_size)
        .stale_time(run.stale_time);

    if run.output_format == OutputFormat::Text {
        format_kv_line("Source", &prepared.endpoint);
        format_kv_line("Total", &prepared.total.to_string());
        format_kv_line("Page size", &run.page_size.to_string());
        format_kv_line("Stale time", &format!("{}s", run.stale_time.as_secs()));
        println!();
    }

    let mut session =
        GridSession::mount(grid_config, prepared.fetcher).map_err(|e| e.to_string())?;
    info!(
        source = %prepared.endpoint,
        total = prepared.total,
        page_size = run.page_size,
        "grid mounted"
    );
    settle_with_spinner(&mut session, run.output_format == OutputFormat::Text).await?;
    print_view(&session, &run);

    if !run.exec.is_empty() {
        for line in run.exec.iter() {
            if !handle_line(&mut session, &run, line).await {
                break;
            }
        }
        return Ok(());
    }

    if run.output_format == OutputFormat::Text {
        print_tag("INF", "type 'help' for commands, 'quit' to exit");
    }
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        if run.output_format == OutputFormat::Text {
            print!("pagegrid> ");
            let _ = std::io::stdout().flush();
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read stdin: {e}")),
        };
        if !handle_line(&mut session, &run, &line).await {
            break;
        }
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.clone().map(|p| config::expand_tilde(&p)) {
        Some(path) => config::load_config(&path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_tracing(run.verbose);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_to_demo_endpoint() {
        let args = CliArgs::parse_from(["pagegrid"]);
        let run = build_run_config(args, ConfigFile::default()).unwrap();
        assert_eq!(run.source, Source::Endpoint(DEMO_ENDPOINT.to_string()));
        assert_eq!(run.total, Some(DEMO_TOTAL_ITEMS));
        assert_eq!(run.page_size, 10);
        assert_eq!(run.columns.unwrap().len(), 4);
        assert_eq!(run.stale_time, DEFAULT_STALE_TIME);
    }

    #[test]
    fn custom_endpoint_needs_total_and_columns() {
        let args = CliArgs::parse_from(["pagegrid", "-u", "http://localhost/rows"]);
        let err = build_run_config(args, ConfigFile::default()).unwrap_err();
        assert!(err.contains("--total"));

        let args = CliArgs::parse_from(["pagegrid", "-u", "http://localhost/rows", "-t", "42"]);
        let err = build_run_config(args, ConfigFile::default()).unwrap_err();
        assert!(err.contains("--columns"));

        let args = CliArgs::parse_from([
            "pagegrid",
            "-u",
            "http://localhost/rows",
            "-t",
            "42",
            "-k",
            "id,name",
        ]);
        let run = build_run_config(args, ConfigFile::default()).unwrap();
        assert_eq!(run.total, Some(42));
    }

    #[test]
    fn rejects_page_size_outside_allowed_set() {
        let args = CliArgs::parse_from(["pagegrid", "-s", "25"]);
        assert!(build_run_config(args, ConfigFile::default()).is_err());
    }

    #[test]
    fn cli_flags_win_over_config() {
        let cfg = ConfigFile {
            page_size: Some(50),
            query_key: Some("from-config".to_string()),
            stale_time: Some(5),
            ..ConfigFile::default()
        };
        let args = CliArgs::parse_from(["pagegrid", "-s", "20"]);
        let run = build_run_config(args, cfg).unwrap();
        assert_eq!(run.page_size, 20);
        assert_eq!(run.query_key, "from-config");
        assert_eq!(run.stale_time, Duration::from_secs(5));
    }

    #[test]
    fn file_source_defers_total_and_columns() {
        let args = CliArgs::parse_from(["pagegrid", "-f", "rows.json", "-x", "next"]);
        let run = build_run_config(args, ConfigFile::default()).unwrap();
        assert_eq!(run.source, Source::File("rows.json".to_string()));
        assert_eq!(run.total, None);
        assert!(run.columns.is_none());
        assert_eq!(run.exec, vec!["next".to_string()]);
    }

    #[test]
    fn color_flag_overrides_no_color_config() {
        let cfg = ConfigFile {
            no_color: Some(true),
            ..ConfigFile::default()
        };
        let args = CliArgs::parse_from(["pagegrid", "-c"]);
        let run = build_run_config(args, cfg).unwrap();
        assert!(!run.no_color);
    }

    #[test]
    fn help_lists_grid_commands() {
        let help = render_custom_help();
        assert!(help.contains("--page-size"));
        assert!(help.contains("sort+ <KEY>"));
    }
}
