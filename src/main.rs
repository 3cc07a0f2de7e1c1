// src/main.rs
// symdex command-line entry point

use anyhow::Result;
use clap::Parser;
use symdex::cli::{self, Cli, Commands, HookAction};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet on the MCP stdio channel; chatty while indexing.
    let log_level = match &cli.command {
        Commands::Serve { .. } => Level::WARN,
        Commands::Index { .. } => Level::INFO,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Commands::Init { path } => cli::run_init(path).await?,
        Commands::Index {
            full,
            reembed,
            files,
            path,
        } => cli::run_index(path, full, reembed, files).await?,
        Commands::Status { path } => cli::run_status(path).await?,
        Commands::Search {
            query,
            limit,
            semantic_only,
            text_only,
            path,
        } => cli::run_search(path, query, limit, semantic_only, text_only).await?,
        Commands::Lookup { name, path } => cli::run_lookup(path, name).await?,
        Commands::Callers { name, depth, path } => cli::run_callers(path, name, depth).await?,
        Commands::Callees { name, depth, path } => cli::run_callees(path, name, depth).await?,
        Commands::Serve { path } => cli::run_serve(path).await?,
        Commands::Hooks { action } => match action {
            HookAction::Install { path } => {
                let root = std::fs::canonicalize(&path)?;
                symdex::hooks::install_hooks(&root)?;
            }
        },
    }

    Ok(())
}
