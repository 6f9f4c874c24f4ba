use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use docsearch_core::config::{expand_path, Config, Settings};
use docsearch_core::logging::init_logging;
use docsearch_core::types::QueryResult;
use docsearch_embed::default_embedder;
use docsearch_retriever::Retriever;

#[derive(Parser)]
#[command(name = "docsearch", version, about = "Chunk, embed and search a directory of text files")]
struct Cli {
    /// Use the hashing embedder instead of loading a model
    #[arg(long, global = true)]
    fake: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a directory and report how many chunks were stored
    Index { dir: Option<PathBuf> },
    /// Index a directory, then run one query
    Search {
        query: String,
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(short = 'n', long)]
        n_results: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Index once, then answer queries read from stdin
    Repl {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(short = 'n', long)]
        n_results: Option<usize>,
    },
}

fn validate_count(n_results: usize, max_results: usize) -> anyhow::Result<()> {
    if n_results == 0 || n_results > max_results { bail!("n_results must be between 1 and {}", max_results); }
    Ok(())
}

fn validate_request(query: &str, n_results: usize, max_results: usize) -> anyhow::Result<()> {
    if query.trim().is_empty() { bail!("query must not be empty"); }
    validate_count(n_results, max_results)
}

fn build_and_index(settings: &Settings, dir: Option<PathBuf>) -> anyhow::Result<Retriever> {
    let dir = dir.unwrap_or_else(|| expand_path(&settings.data.source_dir));
    let embedder = default_embedder(&settings.embedding)?;
    let retriever = Retriever::from_settings(settings, embedder)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("indexing {}", dir.display()));
    pb.enable_steady_tick(Duration::from_millis(120));
    let added = retriever.index_documents(&dir).with_context(|| format!("indexing {}", dir.display()));
    pb.finish_and_clear();
    let added = added?;
    eprintln!("Indexed {} new chunks from {} ({} total)", added, dir.display(), retriever.document_count());
    Ok(retriever)
}

fn print_results(query: &str, results: &[QueryResult], json: bool) -> anyhow::Result<()> {
    if json {
        let body = serde_json::json!({ "query": query, "count": results.len(), "results": results });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }
    println!("Found {} results for: \"{}\"", results.len(), query);
    for (i, r) in results.iter().enumerate() {
        let source = r.metadata.get("filename").map(String::as_str).unwrap_or("-");
        println!("\n  {}. distance={:.4}  id={}  file={}", i + 1, r.distance, r.id, source);
        println!("     {}", r.text.chars().take(200).collect::<String>());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;
    let mut settings = config.settings()?;
    if cli.fake { settings.embedding.use_fake = true; }
    debug!(?settings, "settings loaded");

    match cli.command {
        Command::Index { dir } => {
            build_and_index(&settings, dir)?;
        }
        Command::Search { query, dir, n_results, json } => {
            let n = n_results.unwrap_or(settings.search.default_results);
            validate_request(&query, n, settings.search.max_results)?;
            let retriever = build_and_index(&settings, dir)?;
            let results = retriever.search(&query, n)?;
            print_results(&query, &results, json)?;
        }
        Command::Repl { dir, n_results } => {
            let n = n_results.unwrap_or(settings.search.default_results);
            validate_count(n, settings.search.max_results)?;
            let retriever = build_and_index(&settings, dir)?;
            let stdin = io::stdin();
            loop {
                print!("query> ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 { break; }
                let query = line.trim();
                if query.is_empty() { continue; }
                if query == ":q" || query == "exit" { break; }
                let results = retriever.search(query, n)?;
                print_results(query, &results, false)?;
            }
        }
    }
    Ok(())
}
