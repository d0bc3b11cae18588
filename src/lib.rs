//! semdex - semantic file search powered by remote embeddings.
//!
//! semdex ingests heterogeneous files, embeds their textual content through
//! an OpenAI-style embedding provider, and ranks documents by cosine
//! similarity to a free-text query. The moving parts: an insertion-ordered
//! [`DocumentStore`] with snapshot reads, a concurrency-bounded
//! [`EmbeddingScheduler`], a [`SearchRanker`] with substring fallback, and a
//! debouncing [`SearchController`] that cancels superseded queries.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use semdex::{
//!     config::{EngineConfig, ProviderConfig},
//!     DocumentStore, EmbeddingScheduler, RemoteEmbedder, SearchRanker,
//! };
//!
//! # async fn run() -> semdex::Result<()> {
//! let store = Arc::new(DocumentStore::new());
//! let embedder = Arc::new(RemoteEmbedder::new(&ProviderConfig::from_env())?);
//!
//! let scheduler = EmbeddingScheduler::new(
//!     Arc::clone(&store),
//!     embedder.clone(),
//!     &EngineConfig::default(),
//! );
//! let report = scheduler.run().await;
//! println!("embedded {} document(s)", report.embedded);
//!
//! let ranker = SearchRanker::new(store, embedder);
//! let state = ranker.search("dessert recipes").await;
//! for hit in &state.hits {
//!     println!("{} ({:?})", hit.document.name, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod cli;
pub mod config;
pub mod controller;
pub mod data_dir;
pub mod document;
pub mod embedder;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod persist;
pub mod ranker;
pub mod scheduler;
pub mod store;
pub mod text;

pub use access::{AccessToken, FsAccessManager, ResourceAccessManager};
pub use controller::SearchController;
pub use data_dir::DataDir;
pub use document::{Document, DocumentId, FileKind};
pub use embedder::{cosine_similarity, Embedder, RemoteEmbedder};
pub use error::{Error, Result};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use ranker::{QueryEnhancer, SearchRanker, SearchState};
pub use scheduler::{EmbeddingScheduler, RunReport};
pub use store::{DocumentPatch, DocumentStore};
