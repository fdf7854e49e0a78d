use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lexis_core::{EngineConfig, SearchEngine};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "lexis")]
#[command(about = "Boolean and proximity retrieval over a directory of text documents", long_about = None)]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Directory holding the documents
    #[arg(long, env = "LEXIS_CORPUS", default_value = "Abstracts", global = true)]
    corpus: PathBuf,
    /// Newline-delimited stop word file
    #[arg(long, env = "LEXIS_STOP_WORDS", default_value = "stop_words.txt", global = true)]
    stop_words: PathBuf,
    /// Index snapshot file
    #[arg(long, env = "LEXIS_SNAPSHOT", default_value = "indexes.json", global = true)]
    snapshot: PathBuf,
    /// Extension of document files
    #[arg(long, env = "LEXIS_EXTENSION", default_value = "txt", global = true)]
    extension: String,
}

impl From<EngineArgs> for EngineConfig {
    fn from(args: EngineArgs) -> Self {
        EngineConfig {
            corpus_dir: args.corpus,
            stop_words_path: args.stop_words,
            snapshot_path: args.snapshot,
            extension: args.extension,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index, or load it from the snapshot
    Build {
        /// Rebuild from the corpus even when a valid snapshot exists
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Run one or more queries and print their result sets
    Query {
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Interactive query prompt
    Repl,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config: EngineConfig = cli.engine.into();

    if let Commands::Build { force: true } = cli.command {
        let (engine, report) = SearchEngine::rebuilt(config)?;
        println!("Successfully processed: {} documents", report.processed);
        for failed in &report.failed {
            println!("- {}: {}", failed.filename, failed.error);
        }
        let index = engine.index();
        println!("Index ready: {} documents, {} terms", index.num_docs(), index.num_terms());
        return Ok(());
    }

    let engine = SearchEngine::open(config)?;
    match cli.command {
        Commands::Build { .. } => {
            let index = engine.index();
            println!("Index ready: {} documents, {} terms", index.num_docs(), index.num_terms());
            Ok(())
        }
        Commands::Query { queries } => {
            for query in queries {
                println!("Query: {query}");
                run_query(&engine, &query);
            }
            Ok(())
        }
        Commands::Repl => repl(&engine),
    }
}

fn run_query(engine: &SearchEngine, query: &str) {
    match engine.process_query(query) {
        Ok(doc_ids) => println!("{}", engine.render_results(&doc_ids)),
        Err(e) => {
            println!("Invalid query: {e}");
            println!("{}", engine.render_results(&[]));
        }
    }
}

fn repl(engine: &SearchEngine) -> Result<()> {
    println!("Query syntax:");
    println!("- Simple term query: term");
    println!("- Boolean query: term1 AND term2, term1 OR term2, term1 NOT term2");
    println!("- Grouping: term1 AND (term2 OR term3)");
    println!("- Proximity query: term1 term2 /k (where k is the maximum distance)");
    println!("- Enter 'exit' to quit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("Enter your query: ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }
        run_query(engine, query);
        println!();
    }
    Ok(())
}
