use std::path::PathBuf;

use clap::Parser;
use sagemath_lsp_core::DataPaths;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

mod capabilities;
mod config;
mod document;
mod handlers;
mod server;

#[derive(Parser)]
#[command(name = "sagemath-lsp")]
#[command(about = "Language Server for SageMath")]
struct Cli {
    /// Use stdio for communication (required)
    #[arg(long)]
    stdio: bool,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Symbol file (classes, functions, constants)
    #[arg(long, value_name = "FILE")]
    symbols: Option<PathBuf>,

    /// Keyword file (JSON array of strings)
    #[arg(long, value_name = "FILE")]
    keywords: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if !args.stdio {
        eprintln!("Error: --stdio flag is required");
        std::process::exit(1);
    }

    // stdout carries the protocol, so logs go to stderr
    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let paths = DataPaths {
        symbols: args.symbols,
        keywords: args.keywords,
    };

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(|client| server::Backend::new(client, paths, args.debug));

    Server::new(stdin, stdout, socket).serve(service).await;
}
