// src/db/schema.rs
// Schema DDL and setup for the index database

use crate::error::SymdexError;
use rusqlite::Connection;

/// Schema version this build reads and writes. A database carrying any other
/// version is refused.
pub const SCHEMA_VERSION: i64 = 1;

/// Core schema: files, symbols (+FTS5 mirror with sync triggers), and the
/// three graph edge tables.
///
/// The FTS index uses the external-content pattern: `content=symbols` with
/// `content_rowid=id`, so the FTS rowid *is* the symbol id and the triggers
/// below keep the two in lockstep on insert/update/delete.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);

CREATE TABLE IF NOT EXISTS files (
    id            INTEGER PRIMARY KEY,
    path          TEXT UNIQUE NOT NULL,
    relative_path TEXT NOT NULL,
    language      TEXT,
    last_modified REAL,
    content_hash  TEXT
);

CREATE TABLE IF NOT EXISTS symbols (
    id             INTEGER PRIMARY KEY,
    file_id        INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    qualified_name TEXT NOT NULL,
    kind           TEXT NOT NULL,
    line_start     INTEGER,
    line_end       INTEGER,
    signature      TEXT,
    docstring      TEXT,
    parameters     TEXT DEFAULT '[]',
    return_type    TEXT,
    decorators     TEXT DEFAULT '[]',
    parent_id      INTEGER REFERENCES symbols(id)
);

CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
CREATE INDEX IF NOT EXISTS idx_symbols_qualified ON symbols(qualified_name);
CREATE INDEX IF NOT EXISTS idx_symbols_kind ON symbols(kind);
CREATE INDEX IF NOT EXISTS idx_symbols_file_id ON symbols(file_id);

CREATE VIRTUAL TABLE IF NOT EXISTS symbols_fts USING fts5(
    name,
    qualified_name,
    signature,
    docstring,
    content=symbols,
    content_rowid=id
);

CREATE TRIGGER IF NOT EXISTS symbols_ai AFTER INSERT ON symbols BEGIN
    INSERT INTO symbols_fts(rowid, name, qualified_name, signature, docstring)
    VALUES (new.id, new.name, new.qualified_name,
            COALESCE(new.signature, ''), COALESCE(new.docstring, ''));
END;

CREATE TRIGGER IF NOT EXISTS symbols_ad AFTER DELETE ON symbols BEGIN
    INSERT INTO symbols_fts(symbols_fts, rowid, name, qualified_name, signature, docstring)
    VALUES ('delete', old.id, old.name, old.qualified_name,
            COALESCE(old.signature, ''), COALESCE(old.docstring, ''));
END;

CREATE TRIGGER IF NOT EXISTS symbols_au AFTER UPDATE ON symbols BEGIN
    INSERT INTO symbols_fts(symbols_fts, rowid, name, qualified_name, signature, docstring)
    VALUES ('delete', old.id, old.name, old.qualified_name,
            COALESCE(old.signature, ''), COALESCE(old.docstring, ''));
    INSERT INTO symbols_fts(rowid, name, qualified_name, signature, docstring)
    VALUES (new.id, new.name, new.qualified_name,
            COALESCE(new.signature, ''), COALESCE(new.docstring, ''));
END;

CREATE TABLE IF NOT EXISTS imports (
    from_file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    to_module    TEXT NOT NULL,
    to_file_id   INTEGER REFERENCES files(id),
    import_name  TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (from_file_id, to_module, import_name)
);

CREATE TABLE IF NOT EXISTS calls (
    caller_id   INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    callee_name TEXT NOT NULL,
    callee_id   INTEGER REFERENCES symbols(id),
    PRIMARY KEY (caller_id, callee_name)
);

CREATE TABLE IF NOT EXISTS inherits (
    child_id    INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    parent_name TEXT NOT NULL,
    parent_id   INTEGER REFERENCES symbols(id),
    PRIMARY KEY (child_id, parent_name)
);
"#;

/// SQL to create the symbol_embeddings vec0 table for a given dimension.
///
/// The metric is declared explicitly so the stored distances match the
/// `1 - d/2` cosine similarity conversion in the searcher.
pub fn vec_table_sql(dimensions: usize) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS symbol_embeddings USING vec0(
    symbol_id INTEGER PRIMARY KEY,
    embedding float[{dimensions}] distance_metric=cosine
)"
    )
}

/// Create all tables, verify the schema version, and verify that an existing
/// vector table matches the configured dimension. Idempotent; wraps the DDL
/// in a transaction.
pub fn init_schema_sync(conn: &Connection, dimensions: usize) -> Result<(), SymdexError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute(&vec_table_sql(dimensions), [])?;
    tx.execute(
        "INSERT OR IGNORE INTO schema_version VALUES (?1)",
        [SCHEMA_VERSION],
    )?;
    tx.commit()?;

    let found: i64 = conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?;
    if found != SCHEMA_VERSION {
        return Err(SymdexError::SchemaVersion {
            found,
            expected: SCHEMA_VERSION,
        });
    }

    if let Some(stored) = stored_vec_dimensions(conn)?
        && stored != dimensions
    {
        return Err(SymdexError::DimensionMismatch {
            stored,
            configured: dimensions,
        });
    }

    Ok(())
}

/// Parse the declared embedding dimension back out of the vec0 table's DDL in
/// sqlite_master. Returns None if the table does not exist.
pub fn stored_vec_dimensions(conn: &Connection) -> Result<Option<usize>, SymdexError> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type='table' AND name='symbol_embeddings'",
            [],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    let Some(sql) = sql else { return Ok(None) };
    let dims = sql
        .split("float[")
        .nth(1)
        .and_then(|rest| rest.split(']').next())
        .and_then(|n| n.trim().parse::<usize>().ok());
    Ok(dims)
}

/// Drop and recreate the vector table with the given dimension.
///
/// Used by `index --reembed` and by recovery from a dimension mismatch. All
/// stored vectors are lost; the next embedding pass regenerates them.
pub fn recreate_vec_table_sync(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute("DROP TABLE IF EXISTS symbol_embeddings", [])?;
    conn.execute(&vec_table_sql(dimensions), [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::ensure_sqlite_vec_registered;

    fn memory_conn() -> Connection {
        ensure_sqlite_vec_registered();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        conn
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = memory_conn();
        init_schema_sync(&conn, 4).unwrap();
        init_schema_sync(&conn, 4).unwrap();
    }

    #[test]
    fn test_stored_vec_dimensions_parsed() {
        let conn = memory_conn();
        init_schema_sync(&conn, 768).unwrap();
        assert_eq!(stored_vec_dimensions(&conn).unwrap(), Some(768));
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let conn = memory_conn();
        init_schema_sync(&conn, 4).unwrap();
        let err = init_schema_sync(&conn, 8).unwrap_err();
        assert!(matches!(
            err,
            SymdexError::DimensionMismatch {
                stored: 4,
                configured: 8
            }
        ));
    }

    #[test]
    fn test_foreign_schema_version_refused() {
        let conn = memory_conn();
        init_schema_sync(&conn, 4).unwrap();
        conn.execute("DELETE FROM schema_version", []).unwrap();
        conn.execute("INSERT INTO schema_version VALUES (99)", [])
            .unwrap();
        let err = init_schema_sync(&conn, 4).unwrap_err();
        assert!(matches!(err, SymdexError::SchemaVersion { found: 99, .. }));
    }

    #[test]
    fn test_recreate_vec_table_changes_dimension() {
        let conn = memory_conn();
        init_schema_sync(&conn, 4).unwrap();
        recreate_vec_table_sync(&conn, 16).unwrap();
        assert_eq!(stored_vec_dimensions(&conn).unwrap(), Some(16));
    }
}
