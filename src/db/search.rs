// src/db/search.rs
// Full-text (FTS5/BM25) and vector (sqlite-vec k-NN) retrieval primitives

use rusqlite::{Connection, params};

/// Convert an embedding vector to little-endian f32 bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// MATCH against the FTS5 mirror, BM25-ordered.
///
/// Raw bm25() is negative with more-negative = better; the score is negated
/// on the way out so callers can treat larger as better.
pub fn fts_search_sync(
    conn: &Connection,
    query: &str,
    limit: usize,
) -> rusqlite::Result<Vec<(i64, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT rowid, bm25(symbols_fts) AS score
         FROM symbols_fts
         WHERE symbols_fts MATCH ?1
         ORDER BY score
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![query, limit as i64], |row| {
            let score: f64 = row.get(1)?;
            Ok((row.get::<_, i64>(0)?, -score))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Insert or replace a symbol's embedding.
pub fn upsert_embedding_sync(
    conn: &Connection,
    symbol_id: i64,
    embedding: &[f32],
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO symbol_embeddings(symbol_id, embedding) VALUES (?1, ?2)",
        params![symbol_id, embedding_to_bytes(embedding)],
    )?;
    Ok(())
}

/// k-NN over the vec0 table. Returns (symbol_id, cosine distance) ascending.
pub fn vector_search_sync(
    conn: &Connection,
    query_embedding: &[f32],
    limit: usize,
) -> rusqlite::Result<Vec<(i64, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT symbol_id, distance
         FROM symbol_embeddings
         WHERE embedding MATCH ?1 AND k = ?2
         ORDER BY distance",
    )?;
    let rows = stmt
        .query_map(
            params![embedding_to_bytes(query_embedding), limit as i64],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::files::{delete_file_symbols_sync, upsert_file_sync};
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

    fn add_symbol(conn: &Connection, fid: i64, name: &str, qualified: &str, doc: &str) -> i64 {
        let mut sym = Symbol::new(name, qualified, SymbolKind::Function);
        sym.signature = format!("def {name}()");
        sym.docstring = doc.to_string();
        insert_symbol_sync(conn, &sym, fid, None).unwrap()
    }

    #[test]
    fn test_fts_search_finds_by_name() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let sym_id = add_symbol(
            &conn,
            fid,
            "authenticate_user",
            "auth.authenticate_user",
            "Validates user credentials and returns a session token",
        );

        let results = fts_search_sync(&conn, "\"authenticate_user\"", 10).unwrap();
        assert!(results.iter().any(|(id, _)| *id == sym_id));
        // Negated BM25: better matches have larger values, all positive here
        assert!(results[0].1 > 0.0);
    }

    #[test]
    fn test_fts_search_finds_by_docstring() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        add_symbol(
            &conn,
            fid,
            "connect_db",
            "db.connect_db",
            "Establishes a database migration connection",
        );

        let results = fts_search_sync(&conn, "\"migration\"", 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_fts_rows_follow_symbol_deletion() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        add_symbol(&conn, fid, "special_func", "m.special_func", "unique_token_xyz");

        assert!(!fts_search_sync(&conn, "\"unique_token_xyz\"", 10).unwrap().is_empty());

        delete_file_symbols_sync(&conn, fid).unwrap();
        assert!(fts_search_sync(&conn, "\"unique_token_xyz\"", 10).unwrap().is_empty());
    }

    #[test]
    fn test_embedding_roundtrip_and_knn() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let near = add_symbol(&conn, fid, "vec_a", "m.vec_a", "");
        let far = add_symbol(&conn, fid, "vec_b", "m.vec_b", "");

        upsert_embedding_sync(&conn, near, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        upsert_embedding_sync(&conn, far, &[0.0, 1.0, 0.0, 0.0]).unwrap();

        let results = vector_search_sync(&conn, &[1.0, 0.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, near);
        assert!(results[0].1 < results[1].1, "distances must ascend");
        assert!(results[0].1.abs() < 1e-5, "identical vector has ~zero cosine distance");
    }

    #[test]
    fn test_upsert_embedding_replaces() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let sym_id = add_symbol(&conn, fid, "f", "m.f", "");

        upsert_embedding_sync(&conn, sym_id, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        upsert_embedding_sync(&conn, sym_id, &[0.0, 0.0, 0.0, 1.0]).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM symbol_embeddings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let results = vector_search_sync(&conn, &[0.0, 0.0, 0.0, 1.0], 1).unwrap();
        assert_eq!(results[0].0, sym_id);
        assert!(results[0].1.abs() < 1e-5);
    }

    #[test]
    fn test_embedding_to_bytes_little_endian() {
        let bytes = embedding_to_bytes(&[1.0f32]);
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
        assert_eq!(embedding_to_bytes(&[0.5, 0.25]).len(), 8);
    }
}
