// src/db/files.rs
// File-row operations: upsert, hash lookup, cascade deletion of symbols

use rusqlite::{Connection, OptionalExtension, params};

/// Insert or update a file row, idempotent by absolute path. Returns the row id.
pub fn upsert_file_sync(
    conn: &Connection,
    path: &str,
    relative_path: &str,
    language: Option<&str>,
    last_modified: f64,
    content_hash: &str,
) -> rusqlite::Result<i64> {
    conn.query_row(
        "INSERT INTO files (path, relative_path, language, last_modified, content_hash)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(path) DO UPDATE SET
             relative_path = excluded.relative_path,
             language      = excluded.language,
             last_modified = excluded.last_modified,
             content_hash  = excluded.content_hash
         RETURNING id",
        params![path, relative_path, language, last_modified, content_hash],
        |row| row.get(0),
    )
}

/// Stored content hash for a file, if the file is known.
pub fn get_file_hash_sync(conn: &Connection, path: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT content_hash FROM files WHERE path = ?1",
        [path],
        |row| row.get(0),
    )
    .optional()
}

/// Remove all symbols and outgoing imports for a file, prior to re-inserting
/// a fresh parse.
///
/// Resolved edge references into this file are nulled first so symbol deletion
/// cannot violate foreign keys, and child symbols go before parents because of
/// the self-referencing parent_id column. The FTS mirror follows via triggers.
pub fn delete_file_symbols_sync(conn: &Connection, file_id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM imports WHERE from_file_id = ?1", [file_id])?;
    conn.execute(
        "UPDATE calls SET callee_id = NULL WHERE callee_id IN
         (SELECT id FROM symbols WHERE file_id = ?1)",
        [file_id],
    )?;
    conn.execute(
        "UPDATE inherits SET parent_id = NULL WHERE parent_id IN
         (SELECT id FROM symbols WHERE file_id = ?1)",
        [file_id],
    )?;
    conn.execute(
        "DELETE FROM symbols WHERE file_id = ?1 AND parent_id IS NOT NULL",
        [file_id],
    )?;
    conn.execute("DELETE FROM symbols WHERE file_id = ?1", [file_id])?;
    // Embeddings for the deleted symbols: vec0 tables have no FK support, so
    // orphaned rows are removed explicitly.
    conn.execute(
        "DELETE FROM symbol_embeddings WHERE symbol_id NOT IN (SELECT id FROM symbols)",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema_sync;
    use crate::db::symbols::insert_symbol_sync;
    use crate::types::{Symbol, SymbolKind};

    fn test_conn() -> Connection {
        crate::db::pool::ensure_sqlite_vec_registered();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema_sync(&conn, 4).unwrap();
        conn
    }

    #[test]
    fn test_upsert_file_is_idempotent() {
        let conn = test_conn();
        let id1 = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "hash1").unwrap();
        let id2 = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 2.0, "hash2").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(
            get_file_hash_sync(&conn, "/a/b.py").unwrap(),
            Some("hash2".to_string())
        );
    }

    #[test]
    fn test_get_file_hash_missing_is_none() {
        let conn = test_conn();
        assert_eq!(get_file_hash_sync(&conn, "/nope.py").unwrap(), None);
    }

    #[test]
    fn test_delete_file_symbols_children_before_parents() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();

        let cls = Symbol::new("C", "m.C", SymbolKind::Class);
        let cls_id = insert_symbol_sync(&conn, &cls, fid, None).unwrap();
        let method = Symbol::new("f", "m.C.f", SymbolKind::Method);
        insert_symbol_sync(&conn, &method, fid, Some(cls_id)).unwrap();

        delete_file_symbols_sync(&conn, fid).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM symbols", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_delete_nulls_inbound_call_refs() {
        let conn = test_conn();
        let f1 = upsert_file_sync(&conn, "/a/one.py", "one.py", Some("python"), 1.0, "x").unwrap();
        let f2 = upsert_file_sync(&conn, "/a/two.py", "two.py", Some("python"), 1.0, "y").unwrap();

        let caller = Symbol::new("caller", "one.caller", SymbolKind::Function);
        let caller_id = insert_symbol_sync(&conn, &caller, f1, None).unwrap();
        let callee = Symbol::new("callee", "two.callee", SymbolKind::Function);
        let callee_id = insert_symbol_sync(&conn, &callee, f2, None).unwrap();

        conn.execute(
            "INSERT INTO calls (caller_id, callee_name, callee_id) VALUES (?1, 'two.callee', ?2)",
            params![caller_id, callee_id],
        )
        .unwrap();

        // Deleting file 2 must null the resolved reference, not fail
        delete_file_symbols_sync(&conn, f2).unwrap();
        let resolved: Option<i64> = conn
            .query_row("SELECT callee_id FROM calls WHERE caller_id = ?1", [caller_id], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(resolved, None);
    }
}
