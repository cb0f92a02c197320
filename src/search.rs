//! Debounced, race-safe station search.
//!
//! A pipeline is a spawned actor: inputs arrive over a channel, each one
//! restarting a quiescence timer. Only when the timer elapses does the value
//! "settle" and trigger exactly one remote lookup, tagged with the settled
//! value. A completion whose tag no longer matches the current settled value
//! is discarded, so a slow response for an old query can never overwrite
//! results belonging to a newer one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::debug;

use crate::error::ApiError;
use crate::model::Station;

/// Quiescence window: how long the input must stay unchanged before a
/// lookup is issued.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Seam for the remote lookup, implemented by the REST client and by test
/// mocks.
#[async_trait]
pub trait StationLookup: Send + Sync + 'static {
    async fn search_stations(&self, query: &str) -> Result<Vec<Station>, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Searching,
    Results,
    NoResults,
    Error,
}

/// UI-ready pipeline state, published on every change.
#[derive(Debug, Clone)]
pub struct SearchState {
    /// The value the pipeline considers stable enough to query.
    pub settled: String,
    pub status: SearchStatus,
    pub results: Vec<Station>,
    pub error: Option<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        SearchState {
            settled: String::new(),
            status: SearchStatus::Idle,
            results: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub debounce: Duration,
    /// Minimum trimmed length before a settled value triggers a lookup.
    pub min_chars: usize,
    /// Display cap; remote-supplied order is preserved.
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            debounce: DEFAULT_DEBOUNCE,
            min_chars: 1,
            max_results: 10,
        }
    }
}

/// Handle to a running pipeline. Dropping it stops the actor.
pub struct QueryPipeline {
    input_tx: mpsc::UnboundedSender<String>,
    state_rx: watch::Receiver<SearchState>,
}

impl QueryPipeline {
    pub fn spawn(lookup: Arc<dyn StationLookup>, config: SearchConfig) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SearchState::default());
        tokio::spawn(run_pipeline(input_rx, state_tx, lookup, config));
        QueryPipeline { input_tx, state_rx }
    }

    /// Feeds the current text value. Rapid successive calls within the
    /// debounce window coalesce into a single settled value.
    pub fn set_input(&self, text: impl Into<String>) {
        let _ = self.input_tx.send(text.into());
    }

    /// Latest published state.
    pub fn state(&self) -> SearchState {
        self.state_rx.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state_rx.clone()
    }
}

async fn run_pipeline(
    mut input_rx: mpsc::UnboundedReceiver<String>,
    state_tx: watch::Sender<SearchState>,
    lookup: Arc<dyn StationLookup>,
    config: SearchConfig,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(String, Result<Vec<Station>, ApiError>)>();

    let mut pending: Option<String> = None;
    let mut deadline = Instant::now();
    let mut settled = String::new();

    loop {
        tokio::select! {
            msg = input_rx.recv() => {
                match msg {
                    Some(text) => {
                        // Restart the quiescence timer; the superseded value
                        // never reaches the lookup.
                        pending = Some(text);
                        deadline = Instant::now() + config.debounce;
                    }
                    None => break,
                }
            }

            _ = time::sleep_until(deadline), if pending.is_some() => {
                settled = pending.take().unwrap_or_default();
                let query = settled.trim().to_string();

                if query.chars().count() < config.min_chars {
                    let _ = state_tx.send(SearchState {
                        settled: settled.clone(),
                        ..SearchState::default()
                    });
                    continue;
                }

                debug!(query = %query, "input settled, issuing lookup");
                let _ = state_tx.send(SearchState {
                    settled: settled.clone(),
                    status: SearchStatus::Searching,
                    results: Vec::new(),
                    error: None,
                });

                let tag = settled.clone();
                let lookup = Arc::clone(&lookup);
                let done = done_tx.clone();
                tokio::spawn(async move {
                    let result = lookup.search_stations(&query).await;
                    let _ = done.send((tag, result));
                });
            }

            Some((tag, result)) = done_rx.recv() => {
                if tag != settled {
                    debug!(stale = %tag, current = %settled, "discarding stale lookup response");
                    continue;
                }

                let state = match result {
                    Ok(mut stations) => {
                        stations.truncate(config.max_results);
                        let status = if stations.is_empty() {
                            SearchStatus::NoResults
                        } else {
                            SearchStatus::Results
                        };
                        SearchState {
                            settled: settled.clone(),
                            status,
                            results: stations,
                            error: None,
                        }
                    }
                    Err(e) => SearchState {
                        settled: settled.clone(),
                        status: SearchStatus::Error,
                        results: Vec::new(),
                        error: Some(e.to_string()),
                    },
                };
                let _ = state_tx.send(state);
            }
        }
    }
}
