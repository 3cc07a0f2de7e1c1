// src/db/mod.rs
// Embedded store: SQLite with an FTS5 mirror and a sqlite-vec vector table
//
// Layout follows a sync-core/async-edge split: every operation is a plain
// `*_sync(conn, …)` function over a borrowed connection, and async callers
// reach them through `DatabasePool::interact`/`run`. Keeping the SQL layer
// synchronous makes it directly testable without a runtime.

pub mod files;
pub mod graph;
pub mod pool;
pub mod schema;
pub mod search;
pub mod symbols;

pub use files::{delete_file_symbols_sync, get_file_hash_sync, upsert_file_sync};
pub use graph::{
    ClassHierarchy, EdgeDirection, FileImports, HierarchyEntry, ImportEntry, get_call_edges_sync,
    get_callees_sync, get_callers_sync, get_class_hierarchy_sync, get_file_imports_sync,
    insert_call_sync, insert_import_sync, insert_inherit_sync, resolve_graph_edges_sync,
};
pub use pool::DatabasePool;
pub use schema::{SCHEMA_VERSION, recreate_vec_table_sync, stored_vec_dimensions};
pub use search::{embedding_to_bytes, fts_search_sync, upsert_embedding_sync, vector_search_sync};
pub use symbols::{
    EMBED_BATCH_CEILING, LIST_LIMIT, LOOKUP_LIMIT, StoreStats, get_methods_for_class_sync,
    get_symbol_by_id_sync, insert_symbol_sync, list_symbols_sync, lookup_symbol_prefix_sync,
    lookup_symbol_sync, stats_sync, symbols_without_embeddings_sync,
};
