// src/search/mod.rs
// User-facing query API: hybrid retrieval with graph intent routing

pub mod intent;
pub mod query;

use crate::db::{self, DatabasePool};
use crate::embeddings::EmbeddingClient;
use crate::error::Result;
use crate::types::{MatchType, SearchResult, SymbolKind, SymbolRecord};
use intent::{GraphIntent, classify_intent};
use std::collections::HashMap;
use std::sync::Arc;

/// BM25 magnitudes for short documents rarely exceed this; dividing by it
/// brings typical scores into [0, 1].
const BM25_SCALE: f64 = 10.0;

/// Read-only query facade over the store. Stateless with respect to writes.
pub struct Searcher {
    pool: Arc<DatabasePool>,
    embedder: Option<Arc<EmbeddingClient>>,
}

impl Searcher {
    pub fn new(pool: Arc<DatabasePool>, embedder: Option<Arc<EmbeddingClient>>) -> Self {
        Self { pool, embedder }
    }

    /// Hybrid search: graph intent routing first, then lexical BM25 and
    /// vector similarity merged by arithmetic mean of the present sources.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        semantic_only: bool,
        text_only: bool,
    ) -> Result<Vec<SearchResult>> {
        if let Some((intent, symbol_name)) = classify_intent(query) {
            if let Some(results) = self.dispatch_graph(intent, &symbol_name, limit).await? {
                return Ok(results);
            }
        }

        let mut vec_hits: HashMap<i64, f32> = HashMap::new();
        if !text_only && let Some(embedder) = &self.embedder {
            if let Some(query_vec) = embedder.embed_one(query).await {
                let fetch = limit * 2;
                let rows = self
                    .pool
                    .run(move |conn| db::vector_search_sync(conn, &query_vec, fetch))
                    .await?;
                for (symbol_id, distance) in rows {
                    // Cosine distance spans [0, 2]; map to a 0-1 similarity
                    let similarity = (1.0 - distance / 2.0).max(0.0) as f32;
                    vec_hits.insert(symbol_id, similarity);
                }
            }
        }

        let mut fts_hits: HashMap<i64, f32> = HashMap::new();
        if !semantic_only {
            let and_query = query::fts5_query(query, false);
            let or_query = query::fts5_query(query, true);
            let fetch = limit * 2;
            let rows = self
                .pool
                .run(move |conn| {
                    let mut hits: Vec<(i64, f64)> = Vec::new();
                    if !and_query.is_empty() {
                        hits = db::fts_search_sync(conn, &and_query, fetch)?;
                    }
                    // AND matched nothing: retry with OR so partial matches
                    // still surface.
                    if hits.is_empty() && !or_query.is_empty() && or_query != and_query {
                        hits = db::fts_search_sync(conn, &or_query, fetch)?;
                    }
                    Ok::<_, rusqlite::Error>(hits)
                })
                .await?;
            for (symbol_id, score) in rows {
                let normalized = (score / BM25_SCALE).clamp(0.0, 1.0) as f32;
                fts_hits.insert(symbol_id, normalized);
            }
        }

        // Merge: mean of the sources that actually contributed.
        let mut scored: Vec<(i64, f32, MatchType)> = Vec::new();
        let all_ids: std::collections::HashSet<i64> =
            fts_hits.keys().chain(vec_hits.keys()).copied().collect();
        for symbol_id in all_ids {
            let fts_score = fts_hits.get(&symbol_id).copied().unwrap_or(0.0);
            let vec_score = vec_hits.get(&symbol_id).copied().unwrap_or(0.0);
            let sources = (fts_score > 0.0) as u32 + (vec_score > 0.0) as u32;
            if sources == 0 {
                continue;
            }
            let combined = (fts_score + vec_score) / sources as f32;
            let match_type = if fts_score > 0.0 && vec_score > 0.0 {
                MatchType::Hybrid
            } else if fts_score > 0.0 {
                MatchType::Fulltext
            } else {
                MatchType::Semantic
            };
            scored.push((symbol_id, combined, match_type));
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(limit);

        let results = self
            .pool
            .run(move |conn| {
                let mut results = Vec::with_capacity(scored.len());
                for (symbol_id, score, match_type) in &scored {
                    if let Some(symbol) = db::get_symbol_by_id_sync(conn, *symbol_id)? {
                        results.push(SearchResult {
                            symbol,
                            score: *score,
                            match_type: *match_type,
                        });
                    }
                }
                Ok::<_, rusqlite::Error>(results)
            })
            .await?;

        Ok(results)
    }

    /// Exact lookup first, then prefix/substring fallback.
    pub async fn lookup_symbol(&self, name: &str) -> Result<Vec<SymbolRecord>> {
        let name = name.to_string();
        self.pool
            .run(move |conn| {
                let exact = db::lookup_symbol_sync(conn, &name)?;
                if !exact.is_empty() {
                    return Ok(exact);
                }
                db::lookup_symbol_prefix_sync(conn, &name)
            })
            .await
            .map_err(Into::into)
    }

    pub async fn get_callers(&self, qualified_name: &str, depth: u32) -> Result<Vec<SymbolRecord>> {
        let name = qualified_name.to_string();
        self.pool
            .run(move |conn| db::get_callers_sync(conn, &name, depth))
            .await
            .map_err(Into::into)
    }

    pub async fn get_callees(&self, qualified_name: &str, depth: u32) -> Result<Vec<SymbolRecord>> {
        let name = qualified_name.to_string();
        self.pool
            .run(move |conn| db::get_callees_sync(conn, &name, depth))
            .await
            .map_err(Into::into)
    }

    pub async fn count_callers(&self, qualified_name: &str, depth: u32) -> Result<usize> {
        Ok(self.get_callers(qualified_name, depth).await?.len())
    }

    pub async fn count_callees(&self, qualified_name: &str, depth: u32) -> Result<usize> {
        Ok(self.get_callees(qualified_name, depth).await?.len())
    }

    pub async fn get_file_imports(&self, file_path: &str) -> Result<db::FileImports> {
        let path = file_path.to_string();
        self.pool
            .run(move |conn| db::get_file_imports_sync(conn, &path))
            .await
            .map_err(Into::into)
    }

    pub async fn list_symbols(
        &self,
        kind: Option<SymbolKind>,
        pattern: Option<String>,
        file_path: Option<String>,
    ) -> Result<Vec<SymbolRecord>> {
        self.pool
            .run(move |conn| {
                db::list_symbols_sync(conn, kind, pattern.as_deref(), file_path.as_deref())
            })
            .await
            .map_err(Into::into)
    }

    pub async fn get_class_hierarchy(&self, class_name: &str) -> Result<db::ClassHierarchy> {
        let name = class_name.to_string();
        self.pool
            .run(move |conn| db::get_class_hierarchy_sync(conn, &name))
            .await
            .map_err(Into::into)
    }

    /// Dispatch a classified graph intent. Returns None when the captured
    /// symbol is unknown, abandoning the classification so normal retrieval
    /// proceeds.
    async fn dispatch_graph(
        &self,
        intent: GraphIntent,
        symbol_name: &str,
        limit: usize,
    ) -> Result<Option<Vec<SearchResult>>> {
        match intent {
            GraphIntent::Callers | GraphIntent::Callees => {
                if self.lookup_symbol(symbol_name).await?.is_empty() {
                    return Ok(None);
                }
                let symbols = match intent {
                    GraphIntent::Callers => self.get_callers(symbol_name, 1).await?,
                    _ => self.get_callees(symbol_name, 1).await?,
                };
                Ok(Some(as_graph_results(symbols, limit)))
            }
            GraphIntent::Hierarchy => {
                let hierarchy = self.get_class_hierarchy(symbol_name).await?;
                if hierarchy.class.is_none() {
                    return Ok(None);
                }
                let mut results = Vec::new();
                for entry in hierarchy.parents.iter().chain(hierarchy.children.iter()) {
                    let found = self.lookup_symbol(&entry.qualified_name).await?;
                    if let Some(symbol) = found.into_iter().next() {
                        results.push(SearchResult {
                            symbol,
                            score: 1.0,
                            match_type: MatchType::Graph,
                        });
                    }
                }
                results.truncate(limit);
                Ok(if results.is_empty() { None } else { Some(results) })
            }
        }
    }
}

fn as_graph_results(symbols: Vec<SymbolRecord>, limit: usize) -> Vec<SearchResult> {
    symbols
        .into_iter()
        .take(limit)
        .map(|symbol| SearchResult {
            symbol,
            score: 1.0,
            match_type: MatchType::Graph,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SymdexConfig;
    use crate::indexer::Indexer;
    use tempfile::TempDir;

    const MODELS_PY: &str = r#"class Animal:
    """Base class for all animals."""

    def speak(self) -> str:
        """Return the sound this animal makes."""
        raise NotImplementedError


class Dog(Animal):
    """A dog that can fetch and speak."""

    def speak(self) -> str:
        return "Woof!"

    def fetch(self, item: str) -> str:
        """Fetch the given item and return a status string."""
        return item


class Cat(Animal):
    def speak(self) -> str:
        return "Meow!"


def find_oldest(animals):
    """Return the oldest animal from a list."""
    if not animals:
        return None
    return max(animals, key=lambda a: a.age)


def shelter_report(shelter):
    """Summarise the oldest animal in a shelter."""
    return find_oldest(shelter)
"#;

    async fn fixture() -> (TempDir, Searcher) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("models.py"), MODELS_PY).unwrap();

        let config = Arc::new(SymdexConfig::for_tests(dir.path()));
        let pool = Arc::new(DatabasePool::open_in_memory(4).await.unwrap());
        let indexer = Indexer::new(pool.clone(), config, None);
        indexer.index_root(false, false).await.unwrap();

        (dir, Searcher::new(pool, None))
    }

    #[tokio::test]
    async fn test_fulltext_search_finds_docstring() {
        let (_dir, searcher) = fixture().await;
        let results = searcher.search("oldest animal", 10, false, true).await.unwrap();
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .any(|r| r.symbol.name.contains("oldest") || r.symbol.name == "Animal"));
    }

    #[tokio::test]
    async fn test_fulltext_search_finds_by_name() {
        let (_dir, searcher) = fixture().await;
        let results = searcher.search("fetch", 10, false, true).await.unwrap();
        assert!(results.iter().any(|r| r.symbol.name == "fetch"));
        assert!(results.iter().all(|r| r.match_type == MatchType::Fulltext));
    }

    #[tokio::test]
    async fn test_scores_stay_in_unit_interval() {
        let (_dir, searcher) = fixture().await;
        let results = searcher.search("oldest animal shelter", 10, false, true).await.unwrap();
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    }

    #[tokio::test]
    async fn test_and_falls_back_to_or() {
        let (_dir, searcher) = fixture().await;
        // "fetch" matches, "zzzqqq" never does: the AND form is empty, the
        // OR retry must still surface the partial match as fulltext.
        let results = searcher.search("fetch zzzqqq", 10, false, true).await.unwrap();
        assert!(results.iter().any(|r| r.symbol.name == "fetch"));
        assert!(results.iter().all(|r| r.match_type == MatchType::Fulltext));
    }

    #[tokio::test]
    async fn test_limit_is_respected() {
        let (_dir, searcher) = fixture().await;
        let results = searcher.search("speak", 2, false, true).await.unwrap();
        assert!(results.len() <= 2);
    }

    #[tokio::test]
    async fn test_lookup_exact_then_prefix() {
        let (_dir, searcher) = fixture().await;

        let exact = searcher.lookup_symbol("Dog").await.unwrap();
        assert_eq!(exact[0].kind, SymbolKind::Class);

        let qualified = searcher.lookup_symbol("models.Dog.fetch").await.unwrap();
        assert_eq!(qualified[0].name, "fetch");

        let prefix = searcher.lookup_symbol("find_old").await.unwrap();
        assert!(prefix.iter().any(|s| s.qualified_name.contains("find_oldest")));
    }

    #[tokio::test]
    async fn test_list_symbols_by_kind() {
        let (_dir, searcher) = fixture().await;
        let classes = searcher
            .list_symbols(Some(SymbolKind::Class), None, None)
            .await
            .unwrap();
        assert!(classes.iter().all(|s| s.kind == SymbolKind::Class));
        assert!(classes.iter().any(|s| s.name == "Animal"));
    }

    #[tokio::test]
    async fn test_class_hierarchy_through_searcher() {
        let (_dir, searcher) = fixture().await;
        let hierarchy = searcher.get_class_hierarchy("Animal").await.unwrap();
        assert!(hierarchy.class.is_some());
        let children: Vec<&str> = hierarchy.children.iter().map(|c| c.name.as_str()).collect();
        assert!(children.contains(&"Dog"));
        assert!(children.contains(&"Cat"));
    }

    #[tokio::test]
    async fn test_graph_intent_routes_to_callers() {
        let (_dir, searcher) = fixture().await;
        let results = searcher.search("who calls find_oldest", 10, false, false).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.match_type == MatchType::Graph));
        assert!(results.iter().all(|r| (r.score - 1.0).abs() < f32::EPSILON));
        assert!(results.iter().any(|r| r.symbol.name == "shelter_report"));
    }

    #[tokio::test]
    async fn test_graph_intent_abandoned_for_unknown_symbol() {
        let (_dir, searcher) = fixture().await;
        let results = searcher
            .search("who calls completely_unknown_zzz", 10, false, false)
            .await
            .unwrap();
        assert!(results.iter().all(|r| r.match_type != MatchType::Graph));
    }

    #[tokio::test]
    async fn test_subclass_query_routes_to_hierarchy() {
        let (_dir, searcher) = fixture().await;
        let results = searcher.search("subclasses of Animal", 10, false, false).await.unwrap();
        assert!(results.iter().all(|r| r.match_type == MatchType::Graph));
        let names: Vec<&str> = results.iter().map(|r| r.symbol.name.as_str()).collect();
        assert!(names.contains(&"Dog"));
        assert!(names.contains(&"Cat"));
    }

    #[tokio::test]
    async fn test_counts() {
        let (_dir, searcher) = fixture().await;
        assert_eq!(searcher.count_callers("models.find_oldest", 1).await.unwrap(), 1);
        assert_eq!(searcher.count_callees("models.shelter_report", 1).await.unwrap(), 1);
    }
}
