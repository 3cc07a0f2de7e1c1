// src/db/symbols.rs
// Symbol CRUD and structural queries

use crate::types::{Parameter, Symbol, SymbolKind, SymbolRecord};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;

/// Maximum rows returned by exact/prefix symbol look-ups.
pub const LOOKUP_LIMIT: usize = 20;
/// Maximum rows returned by `list_symbols_sync`.
pub const LIST_LIMIT: usize = 200;
/// Maximum symbols fetched per embedding batch cycle.
pub const EMBED_BATCH_CEILING: usize = 1000;

/// Columns selected for every SymbolRecord hydration; `record_from_row`
/// reads them positionally in this exact order.
pub(crate) const RECORD_COLUMNS: &str = "s.id, s.file_id, s.name, s.qualified_name, s.kind, \
     s.line_start, s.line_end, s.signature, s.docstring, s.parameters, \
     s.return_type, s.decorators, s.parent_id, f.path, f.relative_path";

pub(crate) fn record_from_row(row: &Row) -> rusqlite::Result<SymbolRecord> {
    let kind_str: String = row.get(4)?;
    let params_raw: Option<String> = row.get(9)?;
    let decs_raw: Option<String> = row.get(11)?;

    let parameters: Vec<Parameter> = params_raw
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();
    let decorators: Vec<String> = decs_raw
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();

    Ok(SymbolRecord {
        id: row.get(0)?,
        file_id: row.get(1)?,
        name: row.get(2)?,
        qualified_name: row.get(3)?,
        kind: SymbolKind::parse(&kind_str).unwrap_or(SymbolKind::Function),
        line_start: row.get(5)?,
        line_end: row.get(6)?,
        signature: row.get(7)?,
        docstring: row.get(8)?,
        parameters,
        return_type: row.get(10)?,
        decorators,
        parent_id: row.get(12)?,
        file_path: row.get(13)?,
        relative_path: row.get(14)?,
    })
}

/// Insert a parsed symbol and return its row id.
pub fn insert_symbol_sync(
    conn: &Connection,
    sym: &Symbol,
    file_id: i64,
    parent_id: Option<i64>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO symbols
            (file_id, name, qualified_name, kind,
             line_start, line_end, signature, docstring,
             parameters, return_type, decorators, parent_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            file_id,
            sym.name,
            sym.qualified_name,
            sym.kind.as_str(),
            sym.line_start,
            sym.line_end,
            sym.signature,
            sym.docstring,
            sym.parameters_json(),
            sym.return_type,
            sym.decorators_json(),
            parent_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_symbol_by_id_sync(
    conn: &Connection,
    symbol_id: i64,
) -> rusqlite::Result<Option<SymbolRecord>> {
    conn.query_row(
        &format!(
            "SELECT {RECORD_COLUMNS}
             FROM symbols s JOIN files f ON s.file_id = f.id
             WHERE s.id = ?1"
        ),
        [symbol_id],
        record_from_row,
    )
    .optional()
}

/// Exact match on name or qualified name, shortest qualified name first.
pub fn lookup_symbol_sync(conn: &Connection, name: &str) -> rusqlite::Result<Vec<SymbolRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS}
         FROM symbols s JOIN files f ON s.file_id = f.id
         WHERE s.name = ?1 OR s.qualified_name = ?1
         ORDER BY length(s.qualified_name)
         LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(params![name, LOOKUP_LIMIT as i64], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Prefix match on name, substring match on qualified name.
pub fn lookup_symbol_prefix_sync(
    conn: &Connection,
    name: &str,
) -> rusqlite::Result<Vec<SymbolRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS}
         FROM symbols s JOIN files f ON s.file_id = f.id
         WHERE s.name LIKE ?1 OR s.qualified_name LIKE ?2
         ORDER BY length(s.qualified_name)
         LIMIT ?3"
    ))?;
    let rows = stmt
        .query_map(
            params![format!("{name}%"), format!("%{name}%"), LOOKUP_LIMIT as i64],
            record_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Conjunctive filter over kind, name pattern (SQL LIKE), and file path.
pub fn list_symbols_sync(
    conn: &Connection,
    kind: Option<SymbolKind>,
    pattern: Option<&str>,
    file_path: Option<&str>,
) -> rusqlite::Result<Vec<SymbolRecord>> {
    let mut conditions: Vec<&str> = Vec::new();
    let mut bound: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(kind) = kind {
        conditions.push("s.kind = ?");
        bound.push(Box::new(kind.as_str().to_string()));
    }
    if let Some(pattern) = pattern {
        conditions.push("s.name LIKE ?");
        bound.push(Box::new(pattern.to_string()));
    }
    if let Some(file_path) = file_path {
        conditions.push("(f.path = ? OR f.relative_path = ?)");
        bound.push(Box::new(file_path.to_string()));
        bound.push(Box::new(file_path.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    bound.push(Box::new(LIST_LIMIT as i64));

    let sql = format!(
        "SELECT {RECORD_COLUMNS}
         FROM symbols s JOIN files f ON s.file_id = f.id
         {where_clause}
         ORDER BY s.qualified_name
         LIMIT ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params_from_iter(bound.iter().map(|b| b.as_ref())),
            record_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All methods whose parent is the class with the given qualified name.
pub fn get_methods_for_class_sync(
    conn: &Connection,
    class_qualified_name: &str,
) -> rusqlite::Result<Vec<SymbolRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS}
         FROM symbols s
         JOIN files f ON s.file_id = f.id
         JOIN symbols parent ON s.parent_id = parent.id
         WHERE parent.qualified_name = ?1 AND s.kind = 'method'
         ORDER BY s.name"
    ))?;
    let rows = stmt
        .query_map([class_qualified_name], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Left-anti-join against the embedding table: (id, signature, docstring)
/// triples for symbols that still need a vector.
pub fn symbols_without_embeddings_sync(
    conn: &Connection,
    limit: usize,
) -> rusqlite::Result<Vec<(i64, String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, COALESCE(s.signature, ''), COALESCE(s.docstring, '')
         FROM symbols s
         LEFT JOIN symbol_embeddings e ON s.id = e.symbol_id
         WHERE e.symbol_id IS NULL
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Index statistics: file count, per-kind symbol counts, embedding count.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub files: i64,
    pub symbols: HashMap<SymbolKind, i64>,
    pub embeddings: i64,
}

pub fn stats_sync(conn: &Connection) -> rusqlite::Result<StoreStats> {
    let mut symbols = HashMap::new();
    for kind in SymbolKind::all() {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM symbols WHERE kind = ?1",
            [kind.as_str()],
            |r| r.get(0),
        )?;
        symbols.insert(*kind, count);
    }

    let files: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?;
    let embeddings: i64 =
        conn.query_row("SELECT COUNT(*) FROM symbol_embeddings", [], |r| r.get(0))?;

    Ok(StoreStats {
        files,
        symbols,
        embeddings,
    })
}
