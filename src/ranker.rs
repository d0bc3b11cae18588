//! Query ranking over the document store.
//!
//! Produces a similarity-ordered view of the store for a query string, and
//! degrades to substring matching whenever semantic search is unavailable.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    document::{Document, DocumentId},
    embedder::{cosine_similarity, Embedder},
    error::Result,
    store::DocumentStore,
};

/// Queries shorter than this never reach the embedding provider; they are
/// too short to carry semantic meaning and get substring matching instead.
pub const MIN_SEMANTIC_QUERY_LEN: usize = 3;

/// Optional query rewriting hook (spelling, expansion, ...) applied before
/// embedding. On failure the query passes through unchanged.
#[async_trait]
pub trait QueryEnhancer: Send + Sync {
    async fn enhance(&self, query: &str) -> Result<String>;
}

/// One entry of a ranked view. `score` is `None` on the unranked and
/// substring paths.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub document: Document,
    pub score: Option<f32>,
}

/// The complete result of one search invocation. Recomputed per query and
/// atomically replaced on supersession; never merged with prior state.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub query_embedding: Option<Vec<f32>>,
    pub hits: Vec<SearchHit>,
}

impl SearchState {
    pub fn ids(&self) -> Vec<DocumentId> {
        self.hits.iter().map(|h| h.document.id).collect()
    }
}

pub struct SearchRanker {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn Embedder>,
    enhancer: Option<Arc<dyn QueryEnhancer>>,
}

impl SearchRanker {
    pub fn new(store: Arc<DocumentStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            enhancer: None,
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn QueryEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    /// Evaluate a query against the current store snapshot.
    ///
    /// The embed and enhance awaits are the only suspension points, so a
    /// caller racing this future against a newer query cancels it cleanly
    /// there without any partial state escaping.
    pub async fn search(&self, query: &str) -> SearchState {
        let snapshot = self.store.snapshot();

        if query.is_empty() {
            return SearchState {
                query: String::new(),
                query_embedding: None,
                hits: unranked(snapshot),
            };
        }

        if query.chars().count() < MIN_SEMANTIC_QUERY_LEN {
            return SearchState {
                query: query.to_string(),
                query_embedding: None,
                hits: substring_hits(snapshot, query, false),
            };
        }

        let enhanced = self.enhance(query).await;
        match self.embedder.embed(&enhanced).await {
            Ok(query_embedding) => {
                let hits = rank(snapshot, &query_embedding);
                SearchState {
                    query: query.to_string(),
                    query_embedding: Some(query_embedding),
                    hits,
                }
            }
            Err(e) => {
                if e.is_provider_failure() {
                    warn!("semantic search unavailable, falling back to substring match: {e}");
                } else {
                    warn!("search failed: {e}");
                }
                SearchState {
                    query: query.to_string(),
                    query_embedding: None,
                    hits: substring_hits(snapshot, query, true),
                }
            }
        }
    }

    async fn enhance(&self, query: &str) -> String {
        let Some(enhancer) = &self.enhancer else {
            return query.to_string();
        };
        match enhancer.enhance(query).await {
            Ok(enhanced) => enhanced,
            Err(e) => {
                debug!("query enhancement failed, using raw query: {e}");
                query.to_string()
            }
        }
    }
}

fn unranked(snapshot: Vec<Document>) -> Vec<SearchHit> {
    snapshot
        .into_iter()
        .map(|document| SearchHit {
            document,
            score: None,
        })
        .collect()
}

fn substring_hits(snapshot: Vec<Document>, query: &str, include_summary: bool) -> Vec<SearchHit> {
    snapshot
        .into_iter()
        .filter(|d| d.matches_substring(query, include_summary))
        .map(|document| SearchHit {
            document,
            score: None,
        })
        .collect()
}

/// Score embedded documents against the query vector, descending. The sort is
/// stable: ties keep their snapshot order, including the degenerate zero
/// score.
fn rank(snapshot: Vec<Document>, query_embedding: &[f32]) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = snapshot
        .into_iter()
        .filter(|d| d.embedding.is_some())
        .map(|document| {
            let score = document
                .embedding
                .as_deref()
                .map(|e| cosine_similarity(query_embedding, e));
            SearchHit { document, score }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits
}
