//! # docdex CLI
//!
//! ```bash
//! docdex --config ./config/docdex.toml index
//! docdex --config ./config/docdex.toml search "terminal block" --exact
//! ```
//!
//! `index` runs one full indexing pass over the configured folder, showing
//! progress on stderr once per second. `search` queries the index:
//! space-separated keywords are ANDed, `alpha OR beta` is a union, and
//! `--exact` treats the whole query as one literal phrase.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use docdex::config;
use docdex::extract::PdfExtractor;
use docdex::indexer;
use docdex::query::SearchEngine;
use docdex::store::DocumentStore;

/// docdex — full-text index and search for PDF folder trees.
#[derive(Parser)]
#[command(
    name = "docdex",
    about = "Full-text index and search for PDF folder trees",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one indexing pass over the configured source folder.
    ///
    /// Creates the index store on first run. Incremental: only new files
    /// and files modified since the last pass are re-extracted. Existing
    /// entries remain searchable while the pass runs.
    Index,

    /// Search the index.
    ///
    /// Keywords separated by spaces must all match (AND). `alpha OR beta`
    /// matches either. With --exact the whole query is one literal
    /// substring; a single word is padded with spaces so it only matches
    /// as a standalone word.
    Search {
        /// The query string.
        query: String,

        /// Match the query as one literal substring.
        #[arg(long)]
        exact: bool,

        /// Include documents in subfolders of the source folder.
        #[arg(long)]
        subfolders: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Index => {
            let store = DocumentStore::open(&cfg.index.path).await?;
            let mut run = indexer::spawn(store, cfg, Arc::new(PdfExtractor));

            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.tick().await;
            while !run.is_complete() {
                ticker.tick().await;
                let snap = run.progress();
                if snap.complete {
                    break;
                }
                if snap.total > 0 {
                    eprintln!("{} ({}/{})", snap.status, snap.current, snap.total);
                } else {
                    eprintln!("{}", snap.status);
                }
            }
            run.wait().await;
            println!("{}", run.progress().status);
        }
        Commands::Search {
            query,
            exact,
            subfolders,
        } => {
            let store = DocumentStore::open(&cfg.index.path).await?;
            let engine = SearchEngine::new(store, cfg);

            // Exact-mode single words are padded so the literal only
            // matches as a standalone word, not inside a longer one.
            // Multi-word exact queries pass through unpadded.
            let query = if exact {
                let words: Vec<&str> = query.split_whitespace().collect();
                if words.len() == 1 {
                    format!(" {} ", words[0])
                } else {
                    query
                }
            } else {
                query
            };

            let started = Instant::now();
            let hits = engine.search(&query, exact, subfolders).await?;
            let elapsed = started.elapsed();

            if hits.is_empty() {
                println!("No results.");
                return Ok(());
            }

            println!("{} results ({:.2}s)", hits.len(), elapsed.as_secs_f64());
            println!();
            for (i, hit) in hits.iter().enumerate() {
                println!("{}. {}", i + 1, hit.file_name);
                println!("    path: {}", hit.path);
                println!("    modified: {}", hit.last_modified);
                println!("    context: \"{}\"", hit.context.replace('\n', " "));
                println!();
            }
        }
    }

    Ok(())
}
