//! Debounce and cancellation for live queries.
//!
//! The controller coalesces rapid query changes into a single ranking
//! operation: a new value restarts the quiet window, and a value arriving
//! while a ranking is in flight cancels it at its suspension points. At most
//! one ranking runs at a time, and only the winning one publishes state.

use std::{sync::Arc, time::Duration};

use tokio::{select, sync::watch, task::JoinHandle, time::sleep};
use tracing::debug;

use crate::ranker::{SearchRanker, SearchState};

pub struct SearchController {
    query_tx: watch::Sender<String>,
    state_rx: watch::Receiver<Arc<SearchState>>,
    _worker: JoinHandle<()>,
}

impl SearchController {
    /// Spawn the evaluation worker. It shuts down when the controller drops.
    pub fn new(ranker: Arc<SearchRanker>, quiet_window: Duration) -> Self {
        let (query_tx, query_rx) = watch::channel(String::new());
        let (state_tx, state_rx) = watch::channel(Arc::new(SearchState::default()));
        let worker = tokio::spawn(run_worker(ranker, query_rx, state_tx, quiet_window));
        Self {
            query_tx,
            state_rx,
            _worker: worker,
        }
    }

    /// Feed the latest query text. Always wins over anything older, whether
    /// still pending or already being evaluated.
    pub fn set_query(&self, query: impl Into<String>) {
        let _ = self.query_tx.send(query.into());
    }

    /// Subscribe to published search states.
    pub fn states(&self) -> watch::Receiver<Arc<SearchState>> {
        self.state_rx.clone()
    }

    pub fn current_state(&self) -> Arc<SearchState> {
        self.state_rx.borrow().clone()
    }
}

async fn run_worker(
    ranker: Arc<SearchRanker>,
    mut query_rx: watch::Receiver<String>,
    state_tx: watch::Sender<Arc<SearchState>>,
    quiet_window: Duration,
) {
    'idle: loop {
        if query_rx.changed().await.is_err() {
            return;
        }

        'pending: loop {
            // Quiet window; every further update restarts it.
            loop {
                select! {
                    _ = sleep(quiet_window) => break,
                    changed = query_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            let query = query_rx.borrow_and_update().clone();
            debug!("evaluating query {query:?}");

            // Racing the ranking against the query channel drops the search
            // future at its embed/enhance awaits when a newer query lands,
            // so a superseded ranking never touches the published state.
            select! {
                state = ranker.search(&query) => {
                    let _ = state_tx.send(Arc::new(state));
                    continue 'idle;
                }
                changed = query_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    debug!("query superseded mid-evaluation");
                    continue 'pending;
                }
            }
        }
    }
}
