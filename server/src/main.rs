use anyhow::Result;
use axum::Router;
use clap::Parser;
use lexis_core::EngineConfig;
use lexis_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory holding the documents
    #[arg(long, env = "LEXIS_CORPUS", default_value = "Abstracts")]
    corpus: PathBuf,
    /// Newline-delimited stop word file
    #[arg(long, env = "LEXIS_STOP_WORDS", default_value = "stop_words.txt")]
    stop_words: PathBuf,
    /// Index snapshot file
    #[arg(long, env = "LEXIS_SNAPSHOT", default_value = "indexes.json")]
    snapshot: PathBuf,
    /// Extension of document files
    #[arg(long, env = "LEXIS_EXTENSION", default_value = "txt")]
    extension: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = EngineConfig {
        corpus_dir: args.corpus,
        stop_words_path: args.stop_words,
        snapshot_path: args.snapshot,
        extension: args.extension,
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
