use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::controller::{ApiConfig, GridConfig, GridController, Resolution};
use crate::fetcher::{FetchFailure, HttpOptions, HttpPageFetcher, MemoryPageFetcher, PageFetcher};
use crate::grid::{Column, FetchStatus, GridMessage, PageRequest, Row, SortDirection};
use crate::session::GridSession;

fn row(value: serde_json::Value) -> Row {
    serde_json::from_value(value).unwrap()
}

fn posts(ids: std::ops::RangeInclusive<usize>) -> Vec<Row> {
    ids.map(|i| row(json!({"id": i, "userId": (i - 1) / 10 + 1, "title": format!("post {i}")})))
        .collect()
}

fn post_columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID"),
        Column::new("userId", "User ID"),
        Column::new("title", "Title"),
    ]
}

fn grid_config(total: usize) -> GridConfig {
    GridConfig::new(post_columns(), ApiConfig::new("http://localhost/posts", total))
}

#[test]
fn set_page_requests_matching_window() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    grid.resolve(first.unwrap(), Ok(posts(1..=10)));

    let ticket = grid.set_page(4).unwrap();
    assert_eq!(ticket.request().start(), 40);
    assert_eq!(ticket.request().limit(), 10);
}

#[test]
fn page_count_rounds_up() {
    assert_eq!(crate::grid::page_count(100, 30), 4);
    assert_eq!(crate::grid::page_count(101, 10), 11);
    assert_eq!(crate::grid::page_count(0, 10), 0);

    let (grid, _) = GridController::mount(grid_config(95).page_size(20)).unwrap();
    assert_eq!(grid.page_count(), 5);
}

#[test]
fn latest_request_wins_when_responses_arrive_out_of_order() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    grid.resolve(first.unwrap(), Ok(posts(1..=10)));

    let a = grid.set_page(1).unwrap();
    let b = grid.set_page(2).unwrap();
    assert!(b.seq() > a.seq());

    assert_eq!(grid.resolve(b, Ok(posts(21..=30))), Resolution::Applied);
    assert_eq!(grid.resolve(a, Ok(posts(11..=20))), Resolution::Superseded);

    let view = grid.view();
    assert_eq!(view.page_number, 3);
    assert_eq!(view.rows[0].cell_text("id"), "21");
}

#[test]
fn stale_failure_does_not_raise_error() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    let first = first.unwrap();
    let newer = grid.set_page(1).unwrap();
    let failure = FetchFailure::Status { status: 500 };
    assert_eq!(grid.resolve(first, Err(failure)), Resolution::Superseded);
    assert!(grid.error().is_none());
    assert_eq!(grid.in_flight(), Some(newer));
}

#[test]
fn global_filter_only_sees_current_page() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    grid.resolve(
        first.unwrap(),
        Ok(vec![
            row(json!({"id": 1, "userId": 1, "title": "Apple"})),
            row(json!({"id": 2, "userId": 1, "title": "Banana"})),
        ]),
    );

    grid.set_global_filter("app");
    let view = grid.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].cell_text("title"), "Apple");
    assert_eq!(view.filtered_rows, 1);
    assert_eq!(view.page_rows, 2);
    assert!(view.banner.unwrap().contains("(2 items)"));
    assert!(!grid.is_fetching());
}

#[test]
fn failed_page_keeps_last_good_rows_visible() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    grid.resolve(first.unwrap(), Ok(posts(1..=10)));

    let second = grid.next_page().unwrap();
    let failure = FetchFailure::Status { status: 500 };
    assert_eq!(grid.resolve(second, Err(failure)), Resolution::Failed);

    let page = grid.page().unwrap();
    assert_eq!(page.request.page_index, 0);
    assert_eq!(page.rows[0].cell_text("id"), "1");
    assert_eq!(grid.status(), FetchStatus::Idle);

    let view = grid.view();
    assert_eq!(view.rows.len(), 10);
    assert!(view.error.as_deref().unwrap().contains("500"));
}

#[test]
fn filter_with_no_matches_reports_page_scope() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    grid.resolve(first.unwrap(), Ok(posts(1..=10)));
    grid.set_column_filter("title", "zzz").unwrap();
    let view = grid.view();
    assert!(view.rows.is_empty());
    assert_eq!(
        view.empty_message.as_deref(),
        Some("No data matches your search criteria on this page.")
    );
}

#[test]
fn sort_cycle_returns_to_fetch_order() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    grid.resolve(
        first.unwrap(),
        Ok(vec![
            row(json!({"id": 2, "userId": 1, "title": "b"})),
            row(json!({"id": 1, "userId": 1, "title": "a"})),
            row(json!({"id": 3, "userId": 1, "title": "c"})),
        ]),
    );
    let order = |grid: &GridController| -> Vec<String> {
        grid.view().rows.iter().map(|r| r.cell_text("id")).collect()
    };

    grid.set_sort("id").unwrap();
    assert_eq!(order(&grid), vec!["1", "2", "3"]);
    assert_eq!(grid.view().columns[0].sort, Some(SortDirection::Ascending));

    grid.set_sort("id").unwrap();
    assert_eq!(order(&grid), vec!["3", "2", "1"]);

    grid.set_sort("id").unwrap();
    assert_eq!(order(&grid), vec!["2", "1", "3"]);
    assert!(grid.state().sort().is_empty());
    assert!(!grid.is_fetching());
}

#[test]
fn page_size_change_clamps_index_and_fetches_once() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    grid.resolve(first.unwrap(), Ok(posts(1..=10)));
    let fourth = grid.set_page(3).unwrap();
    grid.resolve(fourth, Ok(posts(31..=40)));

    let ticket = grid.set_page_size(50).unwrap().unwrap();
    assert_eq!(ticket.request(), PageRequest::new(1, 50));
    assert_eq!(grid.in_flight(), Some(ticket));
    assert_eq!(grid.page_count(), 2);
}

#[test]
fn unsupported_page_size_leaves_state_untouched() {
    let (mut grid, _) = GridController::mount(grid_config(100)).unwrap();
    let before = grid.state().clone();
    assert!(grid.set_page_size(25).is_err());
    assert_eq!(grid.state(), &before);
}

#[test]
fn unknown_column_is_rejected() {
    let (mut grid, _) = GridController::mount(grid_config(100)).unwrap();
    assert!(grid.set_sort("missing").is_err());
    assert!(grid.set_column_filter("missing", "x").is_err());
    assert!(grid.resize_column("missing", 10).is_err());
}

#[test]
fn navigation_is_disabled_while_fetching() {
    let (mut grid, first) = GridController::mount(grid_config(100)).unwrap();
    assert!(!grid.can_next_page());
    grid.resolve(first.unwrap(), Ok(posts(1..=10)));
    assert!(grid.can_next_page());
    assert!(!grid.can_previous_page());

    grid.next_page().unwrap();
    assert_eq!(grid.status(), FetchStatus::Fetching);
    assert!(!grid.can_previous_page());
    assert_eq!(grid.page().unwrap().request.page_index, 0);
}

#[test]
fn column_spec_parses_labels_alignment_and_size() {
    let columns = crate::utils::parse_columns_spec("id:ID:right:90, userId, title::center").unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].label, "ID");
    assert_eq!(columns[0].sizing.current, 90);
    assert_eq!(columns[1].label, "User ID");
    assert_eq!(columns[2].label, "Title");
    assert_eq!(columns[2].align, crate::grid::Alignment::Center);
}

#[test]
fn column_spec_rejects_duplicates_and_bad_sizes() {
    assert!(crate::utils::parse_columns_spec("id,id").is_err());
    assert!(crate::utils::parse_columns_spec("id:ID:left:wide").is_err());
    assert!(crate::utils::parse_columns_spec(" , ").is_err());
}

#[test]
fn smart_break_splits_common_styles() {
    assert_eq!(crate::utils::smart_break("userId"), vec!["user", "Id"]);
    assert_eq!(crate::utils::smart_break("created_at"), vec!["created", "at"]);
    assert_eq!(crate::utils::smart_break("HTTPStatus"), vec!["HTTP", "Status"]);
}

#[test]
fn page_size_parser_accepts_only_allowed_sizes() {
    assert_eq!(crate::utils::parse_page_size(" 30 ").unwrap(), 30);
    assert!(crate::utils::parse_page_size("40").is_err());
    assert!(crate::utils::parse_page_size("ten").is_err());
}

/// Answers page 0 slowly and every other page at once.
struct SlowFirstPage;

#[async_trait]
impl PageFetcher for SlowFirstPage {
    async fn fetch(&self, request: PageRequest) -> Result<Vec<Row>, FetchFailure> {
        if request.page_index == 0 {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        let first = request.start() + 1;
        Ok(posts(first..=first + request.limit() - 1))
    }
}

#[tokio::test]
async fn session_discards_slow_superseded_page() {
    let mut session = GridSession::mount(grid_config(100), Arc::new(SlowFirstPage)).unwrap();
    session.dispatch(GridMessage::SetPage(2)).unwrap();

    let resolutions = session.settle().await;
    assert_eq!(resolutions, vec![Resolution::Applied]);
    assert_eq!(session.view().rows[0].cell_text("id"), "21");

    assert_eq!(session.next_resolution().await, Some(Resolution::Superseded));
    assert_eq!(session.outstanding(), 0);
    assert_eq!(session.view().page_number, 3);
    assert_eq!(session.view().rows[0].cell_text("id"), "21");
}

#[tokio::test]
async fn session_over_memory_rows_pages_through_all_items() {
    let fetcher = MemoryPageFetcher::new(posts(1..=25)).with_latency(Duration::from_millis(5));
    let config = GridConfig::new(post_columns(), ApiConfig::new("memory", fetcher.total_items()));
    let mut session = GridSession::mount(config, Arc::new(fetcher)).unwrap();
    session.settle().await;

    session.dispatch(GridMessage::LastPage).unwrap();
    session.settle().await;
    let view = session.view();
    assert_eq!(view.page_number, 3);
    assert_eq!(view.rows.len(), 5);
    assert!(!view.can_next);
    assert!(view.can_previous);
}

struct PanickingFetcher;

#[async_trait]
impl PageFetcher for PanickingFetcher {
    async fn fetch(&self, _request: PageRequest) -> Result<Vec<Row>, FetchFailure> {
        panic!("fetcher blew up");
    }
}

#[tokio::test]
async fn panicking_fetch_still_settles_with_error() {
    let mut session = GridSession::mount(grid_config(100), Arc::new(PanickingFetcher)).unwrap();
    let resolutions = tokio::time::timeout(Duration::from_secs(5), session.settle())
        .await
        .unwrap();
    assert_eq!(resolutions, vec![Resolution::Failed]);
    assert_eq!(session.outstanding(), 0);
    assert!(session.view().error.unwrap().contains("aborted"));
}

struct MiniServer {
    url: String,
    hits: Arc<AtomicUsize>,
    request_lines: Arc<Mutex<Vec<String>>>,
}

fn direct() -> HttpOptions {
    HttpOptions {
        system_proxy: false,
        ..HttpOptions::default()
    }
}

async fn serve(status_line: &'static str, body: &'static str) -> MiniServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let request_lines = Arc::new(Mutex::new(Vec::new()));

    let task_hits = hits.clone();
    let task_lines = request_lines.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            task_hits.fetch_add(1, Ordering::SeqCst);
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let head = String::from_utf8_lossy(&buf[..n]).to_string();
            if let Some(line) = head.lines().next() {
                task_lines.lock().unwrap().push(line.to_string());
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    MiniServer {
        url: format!("http://{addr}/posts"),
        hits,
        request_lines,
    }
}

#[tokio::test]
async fn http_fetcher_sends_start_and_limit() {
    let server = serve("200 OK", r#"[{"id":41,"userId":5,"title":"post 41"}]"#).await;
    let fetcher = HttpPageFetcher::new(&server.url, &direct()).unwrap();

    let rows = fetcher.fetch(PageRequest::new(4, 10)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cell_text("id"), "41");

    let lines = server.request_lines.lock().unwrap().clone();
    assert_eq!(lines, vec!["GET /posts?_start=40&_limit=10 HTTP/1.1".to_string()]);
}

#[tokio::test]
async fn server_error_surfaces_without_retry() {
    let server = serve("500 Internal Server Error", r#"{"error":"boom"}"#).await;
    let fetcher = HttpPageFetcher::new(&server.url, &direct()).unwrap();
    let config = GridConfig::new(post_columns(), ApiConfig::new(server.url.clone(), 100));

    let mut session = GridSession::mount(config, Arc::new(fetcher)).unwrap();
    assert_eq!(session.settle().await, vec![Resolution::Failed]);

    let view = session.view();
    assert!(view.error.as_deref().unwrap().contains("500"));
    assert_eq!(view.status, FetchStatus::Idle);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_payload_is_a_decode_failure() {
    let server = serve("200 OK", r#"{"not":"an array"}"#).await;
    let fetcher = HttpPageFetcher::new(&server.url, &direct()).unwrap();
    let err = fetcher.fetch(PageRequest::new(0, 10)).await.unwrap_err();
    assert!(matches!(err, FetchFailure::Decode { .. }));
}
