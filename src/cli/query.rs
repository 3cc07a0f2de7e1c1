// src/cli/query.rs
// Read-only commands: status, search, lookup, callers, callees

use super::load_config;
use crate::db::{self, DatabasePool};
use crate::embeddings::EmbeddingClient;
use crate::search::Searcher;
use crate::types::{SymbolKind, SymbolRecord};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Open the pool for a command that requires an existing index.
async fn open_existing(path: Option<PathBuf>) -> Result<(Arc<DatabasePool>, crate::config::SymdexConfig)> {
    let config = load_config(path)?;
    let db_path = config.require_db()?;
    let pool = Arc::new(DatabasePool::open(&db_path, config.embeddings.dimensions).await?);
    Ok((pool, config))
}

pub async fn run_status(path: Option<PathBuf>) -> Result<()> {
    let (pool, config) = open_existing(path).await?;
    let stats = pool
        .interact(|conn| db::stats_sync(conn).map_err(Into::into))
        .await?;

    println!("Database: {}", config.db_path().display());
    println!("Files indexed:   {}", stats.files);
    println!("Symbols:");
    for kind in SymbolKind::all() {
        println!(
            "  {:<12} {:>6}",
            kind.as_str(),
            stats.symbols.get(kind).copied().unwrap_or(0)
        );
    }
    println!("Embeddings:      {}", stats.embeddings);
    Ok(())
}

pub async fn run_search(
    path: Option<PathBuf>,
    query: String,
    limit: usize,
    semantic_only: bool,
    text_only: bool,
) -> Result<()> {
    let (pool, config) = open_existing(path).await?;

    let embedder = if config.embeddings.enabled && !text_only {
        Some(Arc::new(EmbeddingClient::new(&config.embeddings)))
    } else {
        None
    };

    let searcher = Searcher::new(pool, embedder);
    let results = searcher.search(&query, limit, semantic_only, text_only).await?;

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("{:>6}  {:<8}  {:<40}  Location", "Score", "Kind", "Symbol");
    println!("{}", "-".repeat(80));
    for result in &results {
        let sym = &result.symbol;
        let location = format!("{}:{}", sym.relative_path, sym.line_start.unwrap_or(0));
        println!(
            "{:6.3}  {:<8}  {:<40}  {}",
            result.score, sym.kind, sym.qualified_name, location
        );
    }
    Ok(())
}

pub async fn run_lookup(path: Option<PathBuf>, name: String) -> Result<()> {
    let (pool, _config) = open_existing(path).await?;
    let searcher = Searcher::new(pool, None);
    let results = searcher.lookup_symbol(&name).await?;

    if results.is_empty() {
        println!("Symbol '{name}' not found.");
        return Ok(());
    }

    for sym in &results {
        println!("\n{}", "=".repeat(60));
        println!("Name:      {}", sym.name);
        println!("Qualified: {}", sym.qualified_name);
        println!("Kind:      {}", sym.kind);
        println!(
            "File:      {}:{}-{}",
            sym.relative_path,
            sym.line_start.unwrap_or(0),
            sym.line_end.unwrap_or(0)
        );
        if let Some(signature) = &sym.signature
            && !signature.is_empty()
        {
            println!("Signature: {signature}");
        }
        if let Some(return_type) = &sym.return_type {
            println!("Returns:   {return_type}");
        }
        if !sym.parameters.is_empty() {
            println!("Parameters:");
            for param in &sym.parameters {
                let mut line = format!("  {}", param.name);
                if let Some(ty) = &param.type_annotation {
                    line.push_str(&format!(": {ty}"));
                }
                if let Some(default) = &param.default {
                    line.push_str(&format!(" = {default}"));
                }
                println!("{line}");
            }
        }
        if !sym.decorators.is_empty() {
            println!("Decorators: {}", sym.decorators.join(", "));
        }
        if let Some(docstring) = &sym.docstring
            && !docstring.is_empty()
        {
            let shown: String = docstring.chars().take(500).collect();
            println!("\nDocstring:\n  {shown}");
        }
    }
    Ok(())
}

fn print_symbol_table(symbols: &[SymbolRecord]) {
    println!("{:<10}  {:<45}  Location", "Kind", "Symbol");
    println!("{}", "-".repeat(80));
    for sym in symbols {
        let location = format!("{}:{}", sym.relative_path, sym.line_start.unwrap_or(0));
        println!("{:<10}  {:<45}  {}", sym.kind, sym.qualified_name, location);
    }
}

pub async fn run_callers(path: Option<PathBuf>, name: String, depth: u32) -> Result<()> {
    let (pool, _config) = open_existing(path).await?;
    let searcher = Searcher::new(pool, None);
    let results = searcher.get_callers(&name, depth).await?;

    if results.is_empty() {
        println!("No callers found for '{name}'.");
        return Ok(());
    }
    print_symbol_table(&results);
    Ok(())
}

pub async fn run_callees(path: Option<PathBuf>, name: String, depth: u32) -> Result<()> {
    let (pool, _config) = open_existing(path).await?;
    let searcher = Searcher::new(pool, None);
    let results = searcher.get_callees(&name, depth).await?;

    if results.is_empty() {
        println!("No callees found for '{name}'.");
        return Ok(());
    }
    print_symbol_table(&results);
    Ok(())
}
