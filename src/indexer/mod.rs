// src/indexer/mod.rs
// Indexing pipeline: discovery, change detection, parsing, storage, and the
// embedding pass

pub mod noise;

use crate::config::SymdexConfig;
use crate::db::{self, DatabasePool};
use crate::embeddings::EmbeddingClient;
use crate::parsers::{self, LanguageParser};
use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

pub use noise::is_noise_call;

/// Statistics for a single index run.
#[derive(Debug, Default)]
pub struct IndexStats {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub symbols_added: usize,
    pub embeddings_added: usize,
    pub errors: Vec<String>,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scanned: {}, Indexed: {}, Skipped (unchanged): {}, Symbols: {}, Embeddings: {}",
            self.files_scanned,
            self.files_indexed,
            self.files_skipped,
            self.symbols_added,
            self.embeddings_added
        )
    }
}

/// Orchestrates end-to-end indexing: walks the root, parses changed files,
/// persists symbols and edges, resolves cross-file references, and fills in
/// missing embeddings.
pub struct Indexer {
    pool: Arc<DatabasePool>,
    config: Arc<SymdexConfig>,
    embedder: Option<Arc<EmbeddingClient>>,
}

impl Indexer {
    pub fn new(
        pool: Arc<DatabasePool>,
        config: Arc<SymdexConfig>,
        embedder: Option<Arc<EmbeddingClient>>,
    ) -> Self {
        Self {
            pool,
            config,
            embedder,
        }
    }

    /// Index the entire project root.
    pub async fn index_root(&self, full: bool, reembed: bool) -> Result<IndexStats> {
        let root = self.config.index_root();
        let files = self.discover_files(&root);
        self.index_file_list(files, &root, full, reembed).await
    }

    /// Index a specific list of files (e.g. from git hooks). Relative paths
    /// are resolved against the project root; missing files are ignored.
    pub async fn index_files(&self, file_paths: &[PathBuf], full: bool) -> Result<IndexStats> {
        let root = self.config.index_root();
        let project_root = self.config.project_root();
        let files: Vec<PathBuf> = file_paths
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    project_root.join(p)
                }
            })
            .filter(|p| p.exists())
            .collect();
        self.index_file_list(files, &root, full, false).await
    }

    /// Depth-first walk with in-place pruning: excluded directories are never
    /// descended, then files are kept only when their extension maps to an
    /// enabled language.
    fn discover_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            // Never prune the root itself, even if a pattern happens to match
            entry.path() == root || !self.config.is_excluded(entry.path())
        });

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if self.config.language_for_file(entry.path()).is_some() {
                        files.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Failed to access path during discovery: {e}");
                }
            }
        }
        files.sort();
        files
    }

    async fn index_file_list(
        &self,
        files: Vec<PathBuf>,
        root: &Path,
        full: bool,
        reembed: bool,
    ) -> Result<IndexStats> {
        let mut stats = IndexStats {
            files_scanned: files.len(),
            ..Default::default()
        };

        for path in &files {
            match self.index_single_file(path, root, full).await {
                Ok(Some(symbol_count)) => {
                    stats.files_indexed += 1;
                    stats.symbols_added += symbol_count;
                }
                Ok(None) => stats.files_skipped += 1,
                Err(e) => {
                    tracing::warn!("Failed to index {}: {e}", path.display());
                    stats.errors.push(format!("{}: {e}", path.display()));
                }
            }
        }

        // Cross-file resolution sees the post-state of every file in the run
        self.pool
            .interact(|conn| db::resolve_graph_edges_sync(conn).map_err(Into::into))
            .await?;

        if let Some(embedder) = &self.embedder {
            if reembed {
                let dims = embedder.dimensions();
                self.pool
                    .interact(move |conn| db::recreate_vec_table_sync(conn, dims).map_err(Into::into))
                    .await?;
            }
            stats.embeddings_added = self.embed_pending(embedder).await?;
        }

        Ok(stats)
    }

    /// Index one file. Returns the number of symbols inserted, or None when
    /// the stored content hash matches (nothing to do).
    async fn index_single_file(
        &self,
        path: &Path,
        root: &Path,
        full: bool,
    ) -> Result<Option<usize>> {
        let Some(language) = self.config.language_for_file(path) else {
            return Ok(None);
        };

        let bytes = std::fs::read(path)?;
        let content_hash = file_hash(&bytes);
        let path_str = path.to_string_lossy().to_string();

        if !full {
            let check_path = path_str.clone();
            let stored = self
                .pool
                .interact(move |conn| db::get_file_hash_sync(conn, &check_path).map_err(Into::into))
                .await?;
            if stored.as_deref() == Some(content_hash.as_str()) {
                return Ok(None);
            }
        }

        tracing::info!("Indexing {}", path.display());

        let source = String::from_utf8_lossy(&bytes).into_owned();
        let relative = path
            .strip_prefix(root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default());
        let rel_path = relative.to_string_lossy().to_string();
        let module_name = parsers::derive_module_name(&relative);

        let parser: &'static dyn LanguageParser = parsers::parser_for(language)
            .ok_or_else(|| anyhow::anyhow!("No parser for language {language}"))?;
        let result = parser.parse(&source, &module_name);

        let last_modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let language_owned = language.to_string();
        let symbol_count = self
            .pool
            .interact(move |conn| {
                let tx = conn.unchecked_transaction()?;

                let file_id = db::upsert_file_sync(
                    &tx,
                    &path_str,
                    &rel_path,
                    Some(&language_owned),
                    last_modified,
                    &content_hash,
                )?;
                db::delete_file_symbols_sync(&tx, file_id)?;

                // Parents come before children in the parse order, so one
                // pass suffices to resolve parent ids. The map is per-file:
                // a parent in another file would violate the symbol model.
                let mut id_by_qualified: std::collections::HashMap<String, i64> =
                    std::collections::HashMap::new();
                let mut symbol_count = 0usize;

                for mut sym in result.symbols {
                    sym.file_path = path_str.clone();
                    let parent_id = sym
                        .parent_qualified_name
                        .as_ref()
                        .and_then(|qn| id_by_qualified.get(qn))
                        .copied();
                    let sym_id = db::insert_symbol_sync(&tx, &sym, file_id, parent_id)?;
                    id_by_qualified.insert(sym.qualified_name.clone(), sym_id);
                    symbol_count += 1;
                }

                for (_, to_module, import_name) in &result.edges.imports {
                    db::insert_import_sync(&tx, file_id, to_module, import_name.as_deref())?;
                }

                for (caller_qn, callee_name) in &result.edges.calls {
                    if is_noise_call(&language_owned, callee_name) {
                        continue;
                    }
                    if let Some(caller_id) = id_by_qualified.get(caller_qn) {
                        db::insert_call_sync(&tx, *caller_id, callee_name)?;
                    }
                }

                for (child_qn, parent_name) in &result.edges.inherits {
                    if let Some(child_id) = id_by_qualified.get(child_qn) {
                        db::insert_inherit_sync(&tx, *child_id, parent_name)?;
                    }
                }

                tx.commit()?;
                Ok(symbol_count)
            })
            .await?;

        Ok(Some(symbol_count))
    }

    /// Fetch pages of symbols lacking vectors, embed `signature\ndocstring`,
    /// and write results back. Stops when nothing is pending, or after an
    /// iteration that wrote nothing (a dead endpoint must not loop forever —
    /// the remaining symbols are retried next run).
    async fn embed_pending(&self, embedder: &Arc<EmbeddingClient>) -> Result<usize> {
        let page_size = (embedder.batch_size() * 4).min(db::EMBED_BATCH_CEILING);
        let mut total = 0usize;

        loop {
            let pending = self
                .pool
                .interact(move |conn| {
                    db::symbols_without_embeddings_sync(conn, page_size).map_err(Into::into)
                })
                .await?;
            if pending.is_empty() {
                break;
            }

            let texts: Vec<String> = pending
                .iter()
                .map(|(_, signature, docstring)| format!("{signature}\n{docstring}").trim().to_string())
                .collect();
            let vectors = embedder.embed_texts(&texts).await;

            let batch: Vec<(i64, Vec<f32>)> = pending
                .iter()
                .zip(vectors)
                .filter_map(|((id, _, _), vector)| vector.map(|v| (*id, v)))
                .collect();

            let written = self
                .pool
                .interact(move |conn| {
                    let tx = conn.unchecked_transaction()?;
                    let mut written = 0usize;
                    for (symbol_id, vector) in &batch {
                        db::upsert_embedding_sync(&tx, *symbol_id, vector)?;
                        written += 1;
                    }
                    tx.commit()?;
                    Ok(written)
                })
                .await?;

            if written == 0 {
                tracing::warn!(
                    "Embedding endpoint returned no vectors; deferring {} symbols to the next run",
                    pending.len()
                );
                break;
            }
            total += written;
        }

        Ok(total)
    }
}

/// SHA-256 hex digest of file bytes.
pub fn file_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
