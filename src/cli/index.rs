// src/cli/index.rs
// init and index commands

use super::load_config;
use crate::config::{DEFAULT_CONFIG_TOML, STATE_DIR, SymdexConfig};
use crate::db::DatabasePool;
use crate::embeddings::EmbeddingClient;
use crate::indexer::Indexer;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Create the per-repo state directory, default config, and database schema.
pub async fn run_init(path: PathBuf) -> Result<()> {
    let root = std::fs::canonicalize(&path)?;
    let config_dir = root.join(STATE_DIR);
    let config_file = config_dir.join("config.toml");

    if config_dir.exists() {
        println!("Already initialised at {}", config_dir.display());
    } else {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created {}", config_dir.display());
    }

    if config_file.exists() {
        println!("Config already exists: {}", config_file.display());
    } else {
        std::fs::write(&config_file, DEFAULT_CONFIG_TOML)?;
        println!("Created {}", config_file.display());
    }

    let config = SymdexConfig::load(&root);
    let db_path = config.db_path();
    DatabasePool::open(&db_path, config.embeddings.dimensions).await?;
    println!("Initialised database at {}", db_path.display());
    println!("Done. Run `symdex index` to index the codebase.");
    Ok(())
}

/// Run the indexer. Per-file errors are reported textually and do not fail
/// the command; fatal errors (unopenable database, dimension mismatch)
/// propagate and exit non-zero.
pub async fn run_index(
    path: Option<PathBuf>,
    full: bool,
    reembed: bool,
    files: Vec<PathBuf>,
) -> Result<()> {
    let config = load_config(path)?;
    let pool = Arc::new(DatabasePool::open(&config.db_path(), config.embeddings.dimensions).await?);

    let embedder = if config.embeddings.enabled {
        let client = EmbeddingClient::new(&config.embeddings);
        let (ok, detail) = client.check_connection().await;
        if ok {
            tracing::info!("Embeddings enabled: {detail}");
            Some(Arc::new(client))
        } else {
            eprintln!("Warning: embeddings disabled — {detail}");
            None
        }
    } else {
        None
    };

    let indexer = Indexer::new(pool, Arc::new(config), embedder);
    let stats = if files.is_empty() {
        indexer.index_root(full, reembed).await?
    } else {
        indexer.index_files(&files, full).await?
    };

    println!("\nIndex complete: {stats}");
    if !stats.errors.is_empty() {
        eprintln!("\nErrors ({}):", stats.errors.len());
        for error in stats.errors.iter().take(10) {
            eprintln!("  {error}");
        }
    }
    Ok(())
}
