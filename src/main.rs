use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

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

use access::FsAccessManager;
use cli::{Cli, Command, SearchArgs};
use config::{EngineConfig, ProviderConfig};
use controller::SearchController;
use data_dir::DataDir;
use document::DocumentId;
use embedder::{Embedder, RemoteEmbedder};
use error::Result;
use extract::PlainTextExtractor;
use ranker::{SearchHit, SearchRanker, SearchState};
use scheduler::EmbeddingScheduler;
use store::DocumentStore;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SEMDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn provider_config(cli: &Cli) -> ProviderConfig {
    let mut config = ProviderConfig::from_env();
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let documents_file = data_dir.documents_file();
    let store = Arc::new(DocumentStore::with_documents(persist::load_documents(
        &documents_file,
    )?));
    let provider = provider_config(&cli);

    match cli.command {
        Command::Add(args) => {
            let extractor = PlainTextExtractor::new();
            let access = FsAccessManager::new();
            let mut added = 0usize;
            for path in &args.paths {
                match ingest::add_document(&store, &extractor, &access, path) {
                    Ok(id) => {
                        added += 1;
                        println!("Added {} ({id})", path.display());
                    }
                    Err(e) => eprintln!("Skipped {}: {e}", path.display()),
                }
            }
            persist::save_store(&documents_file, &store)?;
            println!("{added} document(s) added.");
        }
        Command::Embed(args) => {
            let embedder: Arc<dyn Embedder> = Arc::new(RemoteEmbedder::new(&provider)?);
            let engine = EngineConfig {
                batch_size: args.batch_size,
                ..EngineConfig::default()
            };
            let scheduler = EmbeddingScheduler::new(Arc::clone(&store), embedder, &engine);
            let report = scheduler.run().await;
            persist::save_store(&documents_file, &store)?;
            println!(
                "Embedded {}/{} document(s), {} failed.",
                report.embedded, report.attempted, report.failed
            );
        }
        Command::Search(args) => {
            let embedder: Arc<dyn Embedder> = Arc::new(RemoteEmbedder::new(&provider)?);
            let ranker = Arc::new(SearchRanker::new(Arc::clone(&store), embedder));

            if args.live {
                live_search(ranker, &args).await?;
            } else {
                let query = args.query.clone().unwrap_or_default();
                let state = ranker.search(&query).await;
                print_state(&state, &args);
            }
        }
        Command::List { json } => {
            let snapshot = store.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else if snapshot.is_empty() {
                println!("No documents stored.");
            } else {
                for doc in &snapshot {
                    let embedded = if doc.embedding.is_some() { "embedded" } else { "pending" };
                    println!("{}\t{}\t[{}]\t{embedded}", doc.id, doc.name, doc.file_kind);
                }
            }
        }
        Command::Remove { ids } => {
            let parsed: Vec<DocumentId> = ids
                .iter()
                .map(|s| {
                    s.parse().map_err(|_| error::Error::NotFound {
                        kind: "document",
                        name: s.clone(),
                    })
                })
                .collect::<Result<_>>()?;
            let before = store.len();
            store.remove(&parsed);
            persist::save_store(&documents_file, &store)?;
            println!("Removed {} document(s).", before - store.len());
        }
        Command::Clear => {
            let count = store.len();
            store.clear();
            persist::save_store(&documents_file, &store)?;
            println!("Removed {count} document(s).");
        }
        Command::Status { json } => {
            let snapshot = store.snapshot();
            let embedded = snapshot.iter().filter(|d| d.embedding.is_some()).count();
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "data_dir": data_dir.root(),
                        "model": provider.model,
                        "documents": snapshot.len(),
                        "embedded": embedded,
                        "dimension": store.embedding_dimension(),
                    })
                );
            } else {
                println!("Data directory: {}", data_dir.root().display());
                println!("Model: {}", provider.model);
                println!("Documents: {} ({embedded} embedded)", snapshot.len());
                if let Some(dim) = store.embedding_dimension() {
                    println!("Embedding dimension: {dim}");
                }
            }
        }
    }

    Ok(())
}

/// Read query lines from stdin and re-rank as they change. Every line feeds
/// the debounce controller, so only the most recent one is ever evaluated.
async fn live_search(ranker: Arc<SearchRanker>, args: &SearchArgs) -> Result<()> {
    let controller = SearchController::new(ranker, EngineConfig::default().quiet_window);
    let mut states = controller.states();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Some(ref query) = args.query {
        controller.set_query(query.clone());
    }

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => controller.set_query(line.trim().to_string()),
                None => break,
            },
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                print_state(&state, args);
            }
        }
    }

    Ok(())
}

fn print_state(state: &SearchState, args: &SearchArgs) {
    let hits: Vec<&SearchHit> = state.hits.iter().take(args.count).collect();

    if args.json {
        let results: Vec<serde_json::Value> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                serde_json::json!({
                    "rank": i + 1,
                    "score": hit.score,
                    "id": hit.document.id,
                    "name": hit.document.name,
                    "url": hit.document.source_locator,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "query": state.query,
                "result_count": hits.len(),
                "results": results,
            })
        );
        return;
    }

    if hits.is_empty() {
        println!("No results for {:?}.", state.query);
        return;
    }
    for (i, hit) in hits.iter().enumerate() {
        match hit.score {
            Some(score) => println!(
                "{:>3}. [{score:.3}] {} ({})",
                i + 1,
                hit.document.name,
                hit.document.source_locator
            ),
            None => println!(
                "{:>3}. {} ({})",
                i + 1,
                hit.document.name,
                hit.document.source_locator
            ),
        }
    }
    println!("\n{} result(s)", hits.len());
}
