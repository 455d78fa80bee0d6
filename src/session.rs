use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task;
use tracing::debug;

use crate::controller::{FetchTicket, GridConfig, GridController, Resolution};
use crate::fetcher::{FetchFailure, PageFetcher};
use crate::grid::{GridError, GridMessage, GridView, Row};

#[derive(Debug)]
struct Completion {
    ticket: FetchTicket,
    outcome: Result<Vec<Row>, FetchFailure>,
}

/// Drives a [`GridController`] against a [`PageFetcher`] on the tokio runtime.
///
/// Fetches run as spawned tasks and report back in completion order, so a
/// slow old request can land after a fast new one; the controller discards
/// it. Must be created inside a runtime.
pub struct GridSession {
    controller: GridController,
    fetcher: Arc<dyn PageFetcher>,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
    outstanding: usize,
}

impl GridSession {
    pub fn mount(config: GridConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self, GridError> {
        let (controller, ticket) = GridController::mount(config)?;
        let (tx, rx) = mpsc::channel::<Completion>(64);
        let mut session = Self {
            controller,
            fetcher,
            tx,
            rx,
            outstanding: 0,
        };
        if let Some(ticket) = ticket {
            session.spawn_fetch(ticket);
        }
        Ok(session)
    }

    pub fn dispatch(&mut self, message: GridMessage) -> Result<(), GridError> {
        if let Some(ticket) = self.controller.dispatch(message)? {
            self.spawn_fetch(ticket);
        }
        Ok(())
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        self.outstanding += 1;
        let request = ticket.request();
        let fetch = task::spawn(async move { fetcher.fetch(request).await });
        // Every spawned fetch reports back, even one that panicked.
        task::spawn(async move {
            let outcome = match fetch.await {
                Ok(outcome) => outcome,
                Err(e) => Err(FetchFailure::Transport {
                    message: format!("page fetch aborted: {e}"),
                }),
            };
            let _ = tx.send(Completion { ticket, outcome }).await;
        });
    }

    /// Waits for the next fetch to finish and applies it. `None` when no
    /// fetch is outstanding.
    pub async fn next_resolution(&mut self) -> Option<Resolution> {
        if self.outstanding == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        self.outstanding -= 1;
        let resolution = self
            .controller
            .resolve(completion.ticket, completion.outcome);
        debug!(
            seq = completion.ticket.seq(),
            ?resolution,
            outstanding = self.outstanding,
            "page fetch finished"
        );
        Some(resolution)
    }

    /// Applies completions until the latest issued fetch has resolved.
    /// Superseded fetches still running are left to land later.
    pub async fn settle(&mut self) -> Vec<Resolution> {
        let mut out = Vec::new();
        while self.controller.is_fetching() {
            match self.next_resolution().await {
                Some(resolution) => out.push(resolution),
                None => break,
            }
        }
        out
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn controller(&self) -> &GridController {
        &self.controller
    }

    pub fn view(&self) -> GridView {
        self.controller.view()
    }
}
