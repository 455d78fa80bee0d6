use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pagegrid",
    version,
    about = "server-paginated data grid for the terminal",
    long_about = "Pagegrid fetches one page of rows at a time from a REST endpoint (?_start=&_limit=) and lets you sort and filter the rows of the current page.\n\nExamples:\n  pagegrid -u https://jsonplaceholder.typicode.com/posts -t 100\n  pagegrid -f ./rows.json -s 20 -x 'sort title' -x next\n  pagegrid --config ~/.pagegrid/config.yml\n\nTip: sorting and filtering only ever apply to the rows of the current page."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "How the grid is printed (text or json)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "ep",
        visible_alias = "endpoint",
        value_name = "URL",
        help_heading = "Source",
        help = "REST endpoint returning a JSON array for ?_start=&_limit=."
    )]
    pub endpoint: Option<String>,

    #[arg(
        short = 't',
        long = "tot",
        visible_alias = "total",
        value_name = "N",
        help_heading = "Source",
        help = "Total number of items behind the endpoint (drives the page count)."
    )]
    pub total: Option<usize>,

    #[arg(
        short = 'f',
        long = "fl",
        visible_alias = "file",
        value_name = "FILE",
        help_heading = "Source",
        help = "Serve pages from a local JSON array instead of an endpoint."
    )]
    pub file: Option<String>,

    #[arg(
        short = 'q',
        long = "qk",
        visible_alias = "query-key",
        value_name = "KEY",
        help_heading = "Source",
        help = "Cache namespace for fetched pages."
    )]
    pub query_key: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Source",
        help = "Path to config file (defaults to ~/.pagegrid/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'k',
        long = "cols",
        visible_alias = "columns",
        value_name = "SPEC",
        help_heading = "Grid",
        help = "Columns as key[:label[:align[:size]]], comma-separated."
    )]
    pub columns: Option<String>,

    #[arg(
        short = 's',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Grid",
        help = "Initial rows per page (10, 20, 30, 50 or 100)."
    )]
    pub page_size: Option<String>,

    #[arg(
        long = "st",
        visible_alias = "stale-time",
        value_name = "SECONDS",
        help_heading = "Grid",
        help = "How long a fetched page is reused before it is fetched again (0 disables)."
    )]
    pub stale_time: Option<u64>,

    #[arg(
        short = 'x',
        long = "exec",
        value_name = "COMMAND",
        action = ArgAction::Append,
        help_heading = "Grid",
        help = "Run a grid command and exit instead of reading stdin (repeatable)."
    )]
    pub exec: Vec<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,
}
