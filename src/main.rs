//! Fluxon language server - CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use fluxon_language_server::config::default_fallback_catalog;
use fluxon_language_server::logging::init_logger;
use fluxon_language_server::lsp::backend::FluxonBackend;

/// Completion server for the Fluxon scripting language
#[derive(Parser, Debug)]
#[command(name = "fluxon-language-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Disable ANSI colors in stderr logs
    #[arg(long)]
    no_color: bool,

    /// Log filter for stderr (overrides RUST_LOG), e.g. "debug" or "fluxon_language_server=trace"
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Do not write a session log to the user cache directory
    #[arg(long)]
    no_file_logging: bool,

    /// Built-in catalog used when the configured one is empty or missing
    #[arg(long, value_name = "FILE")]
    fallback_catalog: Option<PathBuf>,

    /// Communicate over stdin/stdout; accepted for editor compatibility, stdio is the only transport
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_logging)
        .context("Failed to initialize logging")?;

    let fallback_catalog = args.fallback_catalog.unwrap_or_else(default_fallback_catalog);
    info!(
        "Starting {} {} (fallback catalog {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        fallback_catalog.display()
    );

    if !args.stdio {
        info!("No transport selected, serving over stdio");
    }

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| FluxonBackend::new(client, fallback_catalog));
    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Language server stopped");
    Ok(())
}
