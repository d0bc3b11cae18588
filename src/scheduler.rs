//! Batch embedding scheduler.
//!
//! Brings every unembedded document up to date: snapshot, filter, batch,
//! fan out bounded-concurrency embed calls, fan results back into the store.
//! Partial failures are isolated per document and the run always completes;
//! a later run picks up whatever is still unembedded.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinSet, time::sleep};
use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    document::DocumentId,
    embedder::Embedder,
    store::{DocumentPatch, DocumentStore},
    text::{summarize, SUMMARY_MAX_CHARS},
};

/// Outcome of one scheduler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Documents lacking an embedding when the run started.
    pub attempted: usize,
    pub embedded: usize,
    pub failed: usize,
}

pub struct EmbeddingScheduler {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    batch_pause: Duration,
    in_progress: watch::Sender<bool>,
}

impl EmbeddingScheduler {
    pub fn new(
        store: Arc<DocumentStore>,
        embedder: Arc<dyn Embedder>,
        config: &EngineConfig,
    ) -> Self {
        let (in_progress, _) = watch::channel(false);
        Self {
            store,
            embedder,
            batch_size: config.batch_size.max(1),
            batch_pause: config.batch_pause,
            in_progress,
        }
    }

    /// Observable "in progress" signal for progress UI. Not part of the
    /// engine's correctness.
    pub fn progress(&self) -> watch::Receiver<bool> {
        self.in_progress.subscribe()
    }

    /// Embed every document currently lacking an embedding.
    ///
    /// Idempotent: already-embedded documents are untouched, so re-invoking
    /// after a partial run only processes the remainder.
    pub async fn run(&self) -> RunReport {
        let pending: Vec<PendingDoc> = self
            .store
            .snapshot()
            .into_iter()
            .filter(|doc| doc.embedding.is_none())
            .map(|doc| PendingDoc {
                id: doc.id,
                full_text: doc.full_text(),
                summary: doc
                    .summary
                    .is_none()
                    .then(|| summarize(&doc.raw_text, SUMMARY_MAX_CHARS)),
            })
            .collect();

        let mut report = RunReport {
            attempted: pending.len(),
            embedded: 0,
            failed: 0,
        };
        if pending.is_empty() {
            return report;
        }

        let _ = self.in_progress.send_replace(true);
        debug!("embedding {} documents", pending.len());

        let batches: Vec<&[PendingDoc]> = pending.chunks(self.batch_size).collect();
        let batch_count = batches.len();

        for (i, batch) in batches.into_iter().enumerate() {
            let mut tasks = JoinSet::new();
            for doc in batch.iter().cloned() {
                let embedder = Arc::clone(&self.embedder);
                tasks.spawn(async move {
                    let result = embedder.embed(&doc.full_text).await;
                    (doc.id, doc.summary, result)
                });
            }

            // Settle the whole batch; each success is written back the
            // moment it lands.
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((id, summary, Ok(embedding))) => {
                        let patch = DocumentPatch {
                            embedding: Some(embedding),
                            summary,
                        };
                        match self.store.update(id, patch) {
                            Ok(()) => report.embedded += 1,
                            Err(e) => {
                                warn!("could not store embedding for {id}: {e}");
                                report.failed += 1;
                            }
                        }
                    }
                    Ok((id, _, Err(e))) => {
                        warn!("embedding failed for {id}: {e}");
                        report.failed += 1;
                    }
                    Err(e) => {
                        warn!("embedding worker panicked: {e}");
                        report.failed += 1;
                    }
                }
            }

            if i + 1 < batch_count && !self.batch_pause.is_zero() {
                sleep(self.batch_pause).await;
            }
        }

        let _ = self.in_progress.send_replace(false);
        debug!(
            "embedding run finished: {}/{} embedded, {} failed",
            report.embedded, report.attempted, report.failed
        );
        report
    }
}

#[derive(Clone)]
struct PendingDoc {
    id: DocumentId,
    full_text: String,
    summary: Option<String>,
}
