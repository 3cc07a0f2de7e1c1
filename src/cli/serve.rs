// src/cli/serve.rs
// MCP server initialization and stdio main loop

use super::load_config;
use crate::db::DatabasePool;
use crate::embeddings::EmbeddingClient;
use crate::mcp::SymdexServer;
use crate::search::Searcher;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Run the MCP server with stdio transport.
pub async fn run_serve(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path)?;
    let db_path = config.require_db()?;
    let pool = Arc::new(DatabasePool::open(&db_path, config.embeddings.dimensions).await?);

    let embedder = if config.embeddings.enabled {
        info!("Semantic search enabled (model={})", config.embeddings.model);
        Some(Arc::new(EmbeddingClient::new(&config.embeddings)))
    } else {
        info!("Semantic search disabled");
        None
    };

    let searcher = Arc::new(Searcher::new(pool, embedder));
    let server = SymdexServer::new(searcher);

    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;
    Ok(())
}
