// src/db/graph.rs
// Graph edges: inserts, name resolution, and bounded recursive traversal
//
// Cyclic call graphs and inheritance diamonds are stored flat as edge rows.
// Traversal happens inside SQLite with recursive CTEs; UNION (not UNION ALL)
// gives set semantics, so revisiting a node produces no new rows and the
// recursion terminates on cycles. The depth column bounds hop count.

use crate::db::symbols::{RECORD_COLUMNS, record_from_row};
use crate::types::SymbolRecord;
use rusqlite::{Connection, params};

/// Default recursion bound for ancestor/descendant class-hierarchy queries.
pub const HIERARCHY_DEPTH: u32 = 5;

/// Direction for `get_call_edges_sync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Callers,
    Callees,
}

// ------------------------------------------------------------------ //
// Edge inserts (idempotent on natural keys)
// ------------------------------------------------------------------ //

pub fn insert_import_sync(
    conn: &Connection,
    from_file_id: i64,
    to_module: &str,
    import_name: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO imports (from_file_id, to_module, import_name)
         VALUES (?1, ?2, ?3)",
        params![from_file_id, to_module, import_name.unwrap_or("")],
    )?;
    Ok(())
}

pub fn insert_call_sync(
    conn: &Connection,
    caller_id: i64,
    callee_name: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO calls (caller_id, callee_name) VALUES (?1, ?2)",
        params![caller_id, callee_name],
    )?;
    Ok(())
}

pub fn insert_inherit_sync(
    conn: &Connection,
    child_id: i64,
    parent_name: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO inherits (child_id, parent_name) VALUES (?1, ?2)",
        params![child_id, parent_name],
    )?;
    Ok(())
}

// ------------------------------------------------------------------ //
// Edge resolution
// ------------------------------------------------------------------ //

/// Bind textual callee/parent/module names to symbol/file ids where a
/// conservative string match exists. Unresolvable names stay NULL.
pub fn resolve_graph_edges_sync(conn: &Connection) -> rusqlite::Result<()> {
    // Pass 1: exact match on qualified_name or name.
    conn.execute(
        "UPDATE calls SET callee_id = (
            SELECT id FROM symbols
            WHERE qualified_name = calls.callee_name
               OR name = calls.callee_name
            LIMIT 1
        )
        WHERE callee_id IS NULL",
        [],
    )?;

    // Pass 2: dotted callee names like `obj.method` or `self.store.method`.
    // The variable prefix never matches a symbol name, but the last dotted
    // component often does. No type inference; first name match wins.
    resolve_dotted_calls(conn)?;

    conn.execute(
        "UPDATE inherits SET parent_id = (
            SELECT id FROM symbols
            WHERE (qualified_name = inherits.parent_name
                OR name = inherits.parent_name)
              AND kind = 'class'
            LIMIT 1
        )
        WHERE parent_id IS NULL",
        [],
    )?;

    resolve_import_files(conn)?;
    Ok(())
}

fn resolve_dotted_calls(conn: &Connection) -> rusqlite::Result<()> {
    let unresolved: Vec<(i64, String)> = {
        let mut stmt = conn.prepare(
            "SELECT caller_id, callee_name FROM calls
             WHERE callee_id IS NULL AND callee_name LIKE '%.%'",
        )?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?
    };

    for (caller_id, callee_name) in unresolved {
        let suffix = callee_name.rsplit('.').next().unwrap_or(&callee_name);
        let matched: Option<i64> = conn
            .query_row(
                "SELECT id FROM symbols WHERE name = ?1 LIMIT 1",
                [suffix],
                |row| row.get(0),
            )
            .ok();
        if let Some(id) = matched {
            conn.execute(
                "UPDATE calls SET callee_id = ?1 WHERE caller_id = ?2 AND callee_name = ?3",
                params![id, caller_id, callee_name],
            )?;
        }
    }
    Ok(())
}

/// Match unresolved import modules to files. The relative path with its
/// extension stripped must equal the slashed module path or end with
/// `/<module path>` — a plain substring test misresolves short module names.
fn resolve_import_files(conn: &Connection) -> rusqlite::Result<()> {
    let unresolved: Vec<(i64, String, String)> = {
        let mut stmt = conn.prepare(
            "SELECT from_file_id, to_module, import_name FROM imports
             WHERE to_file_id IS NULL",
        )?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>, _>>()?
    };
    if unresolved.is_empty() {
        return Ok(());
    }

    let files: Vec<(i64, String)> = {
        let mut stmt = conn.prepare("SELECT id, relative_path FROM files")?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?
    };

    for (from_file_id, to_module, import_name) in unresolved {
        let needle = to_module.trim_start_matches('.').replace('.', "/");
        if needle.is_empty() {
            continue;
        }
        let matched = files.iter().find(|(_, rel)| {
            let stem = rel.rsplit_once('.').map(|(s, _)| s).unwrap_or(rel);
            stem == needle || stem.ends_with(&format!("/{needle}"))
        });
        if let Some((file_id, _)) = matched {
            conn.execute(
                "UPDATE imports SET to_file_id = ?1
                 WHERE from_file_id = ?2 AND to_module = ?3 AND import_name = ?4",
                params![file_id, from_file_id, to_module, import_name],
            )?;
        }
    }
    Ok(())
}

// ------------------------------------------------------------------ //
// Traversal
// ------------------------------------------------------------------ //

/// Symbols that (transitively) call the named symbol, bounded by depth.
pub fn get_callers_sync(
    conn: &Connection,
    qualified_name: &str,
    depth: u32,
) -> rusqlite::Result<Vec<SymbolRecord>> {
    let mut stmt = conn.prepare(&format!(
        "WITH RECURSIVE caller_tree(id, depth) AS (
            SELECT c.caller_id, 1
            FROM calls c
            JOIN symbols s ON c.callee_id = s.id
            WHERE s.qualified_name = ?1 OR s.name = ?1
            UNION
            SELECT c2.caller_id, ct.depth + 1
            FROM calls c2
            JOIN caller_tree ct ON c2.callee_id = ct.id
            WHERE ct.depth < ?2
        )
        SELECT DISTINCT {RECORD_COLUMNS}
        FROM caller_tree ct
        JOIN symbols s ON ct.id = s.id
        JOIN files f ON s.file_id = f.id"
    ))?;
    let rows = stmt
        .query_map(params![qualified_name, depth], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Symbols (transitively) called by the named symbol, bounded by depth.
pub fn get_callees_sync(
    conn: &Connection,
    qualified_name: &str,
    depth: u32,
) -> rusqlite::Result<Vec<SymbolRecord>> {
    let mut stmt = conn.prepare(&format!(
        "WITH RECURSIVE callee_tree(id, depth) AS (
            SELECT c.callee_id, 1
            FROM calls c
            JOIN symbols s ON c.caller_id = s.id
            WHERE s.qualified_name = ?1 OR s.name = ?1
            UNION
            SELECT c2.callee_id, ct.depth + 1
            FROM calls c2
            JOIN callee_tree ct ON c2.caller_id = ct.id
            WHERE ct.depth < ?2
        )
        SELECT DISTINCT {RECORD_COLUMNS}
        FROM callee_tree ct
        JOIN symbols s ON ct.id = s.id
        JOIN files f ON s.file_id = f.id"
    ))?;
    let rows = stmt
        .query_map(params![qualified_name, depth], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Directed (caller_qname, callee_qname) pairs confined to the node set
/// reachable within `depth` hops from the root in the given direction.
///
/// The reachable set is collected first (bounded, cycle-safe via UNION), then
/// every call edge with both endpoints inside the set is returned.
pub fn get_call_edges_sync(
    conn: &Connection,
    qualified_name: &str,
    depth: u32,
    direction: EdgeDirection,
) -> rusqlite::Result<Vec<(String, String)>> {
    let sql = match direction {
        EdgeDirection::Callees => {
            "WITH RECURSIVE reachable(id, d) AS (
                SELECT s.id, 0
                FROM symbols s
                WHERE s.qualified_name = ?1 OR s.name = ?1
                UNION
                SELECT c.callee_id, r.d + 1
                FROM calls c
                JOIN reachable r ON c.caller_id = r.id
                WHERE r.d < ?2 AND c.callee_id IS NOT NULL
            )
            SELECT DISTINCT
                s1.qualified_name AS caller_qname,
                s2.qualified_name AS callee_qname
            FROM calls c
            JOIN reachable r1 ON c.caller_id = r1.id
            JOIN reachable r2 ON c.callee_id = r2.id
            JOIN symbols s1 ON c.caller_id = s1.id
            JOIN symbols s2 ON c.callee_id = s2.id
            WHERE c.callee_id IS NOT NULL"
        }
        EdgeDirection::Callers => {
            "WITH RECURSIVE reachable(id, d) AS (
                SELECT s.id, 0
                FROM symbols s
                WHERE s.qualified_name = ?1 OR s.name = ?1
                UNION
                SELECT c.caller_id, r.d + 1
                FROM calls c
                JOIN reachable r ON c.callee_id = r.id
                WHERE r.d < ?2 AND c.caller_id IS NOT NULL
            )
            SELECT DISTINCT
                s1.qualified_name AS caller_qname,
                s2.qualified_name AS callee_qname
            FROM calls c
            JOIN reachable r1 ON c.caller_id = r1.id
            JOIN reachable r2 ON c.callee_id = r2.id
            JOIN symbols s1 ON c.caller_id = s1.id
            JOIN symbols s2 ON c.callee_id = s2.id
            WHERE c.caller_id IS NOT NULL"
        }
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![qualified_name, depth], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ------------------------------------------------------------------ //
// Class hierarchy
// ------------------------------------------------------------------ //

/// A class plus its bounded ancestor and descendant sets.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ClassHierarchy {
    pub class: Option<HierarchyEntry>,
    pub parents: Vec<HierarchyEntry>,
    pub children: Vec<HierarchyEntry>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HierarchyEntry {
    pub name: String,
    pub qualified_name: String,
    pub relative_path: String,
}

pub fn get_class_hierarchy_sync(
    conn: &Connection,
    class_name: &str,
) -> rusqlite::Result<ClassHierarchy> {
    let target: Option<(i64, String, String, String)> = {
        let mut stmt = conn.prepare(
            "SELECT s.id, s.name, s.qualified_name, f.relative_path
             FROM symbols s JOIN files f ON s.file_id = f.id
             WHERE (s.name = ?1 OR s.qualified_name = ?1) AND s.kind = 'class'
             LIMIT 1",
        )?;
        let mut rows = stmt.query_map([class_name], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.next().transpose()?
    };

    let Some((class_id, name, qualified_name, relative_path)) = target else {
        return Ok(ClassHierarchy::default());
    };

    let parents = hierarchy_query(
        conn,
        class_id,
        "WITH RECURSIVE ancestor(id, depth) AS (
            SELECT i.parent_id, 1
            FROM inherits i
            WHERE i.child_id = ?1 AND i.parent_id IS NOT NULL
            UNION
            SELECT i2.parent_id, a.depth + 1
            FROM inherits i2
            JOIN ancestor a ON i2.child_id = a.id
            WHERE a.depth < ?2 AND i2.parent_id IS NOT NULL
        )
        SELECT DISTINCT s.name, s.qualified_name, f.relative_path
        FROM ancestor a
        JOIN symbols s ON a.id = s.id
        JOIN files f ON s.file_id = f.id",
    )?;

    let children = hierarchy_query(
        conn,
        class_id,
        "WITH RECURSIVE descendant(id, depth) AS (
            SELECT i.child_id, 1
            FROM inherits i
            WHERE i.parent_id = ?1
            UNION
            SELECT i2.child_id, d.depth + 1
            FROM inherits i2
            JOIN descendant d ON i2.parent_id = d.id
            WHERE d.depth < ?2
        )
        SELECT DISTINCT s.name, s.qualified_name, f.relative_path
        FROM descendant d
        JOIN symbols s ON d.id = s.id
        JOIN files f ON s.file_id = f.id",
    )?;

    Ok(ClassHierarchy {
        class: Some(HierarchyEntry {
            name,
            qualified_name,
            relative_path,
        }),
        parents,
        children,
    })
}

fn hierarchy_query(
    conn: &Connection,
    class_id: i64,
    sql: &str,
) -> rusqlite::Result<Vec<HierarchyEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![class_id, HIERARCHY_DEPTH], |row| {
            Ok(HierarchyEntry {
                name: row.get(0)?,
                qualified_name: row.get(1)?,
                relative_path: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ------------------------------------------------------------------ //
// File imports
// ------------------------------------------------------------------ //

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FileImports {
    pub imports: Vec<ImportEntry>,
    pub imported_by: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportEntry {
    pub to_module: String,
    pub import_name: String,
    pub resolved_path: Option<String>,
}

/// What a file imports, and which files import it. Accepts absolute or
/// relative paths; unknown files yield empty lists.
pub fn get_file_imports_sync(conn: &Connection, file_path: &str) -> rusqlite::Result<FileImports> {
    let file_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM files WHERE path = ?1 OR relative_path = ?1",
            [file_path],
            |row| row.get(0),
        )
        .ok();
    let Some(file_id) = file_id else {
        return Ok(FileImports::default());
    };

    let imports = {
        let mut stmt = conn.prepare(
            "SELECT i.to_module, i.import_name, f.relative_path
             FROM imports i
             LEFT JOIN files f ON i.to_file_id = f.id
             WHERE i.from_file_id = ?1
             ORDER BY i.to_module",
        )?;
        stmt.query_map([file_id], |row| {
            Ok(ImportEntry {
                to_module: row.get(0)?,
                import_name: row.get(1)?,
                resolved_path: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?
    };

    let imported_by = {
        let mut stmt = conn.prepare(
            "SELECT f.relative_path
             FROM imports i
             JOIN files f ON i.from_file_id = f.id
             WHERE i.to_file_id = ?1
             ORDER BY f.relative_path",
        )?;
        stmt.query_map([file_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(FileImports {
        imports,
        imported_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::files::upsert_file_sync;
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

    fn add_symbol(conn: &Connection, fid: i64, name: &str, qualified: &str, kind: SymbolKind) -> i64 {
        insert_symbol_sync(conn, &Symbol::new(name, qualified, kind), fid, None).unwrap()
    }

    #[test]
    fn test_call_graph_resolution_and_traversal() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let caller_id = add_symbol(&conn, fid, "caller_fn", "m.caller_fn", SymbolKind::Function);
        add_symbol(&conn, fid, "callee_fn", "m.callee_fn", SymbolKind::Function);

        insert_call_sync(&conn, caller_id, "m.callee_fn").unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let callees = get_callees_sync(&conn, "m.caller_fn", 1).unwrap();
        assert!(callees.iter().any(|s| s.name == "callee_fn"));

        let callers = get_callers_sync(&conn, "m.callee_fn", 1).unwrap();
        assert!(callers.iter().any(|s| s.name == "caller_fn"));
    }

    #[test]
    fn test_insert_call_is_idempotent() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let caller_id = add_symbol(&conn, fid, "f", "m.f", SymbolKind::Function);

        insert_call_sync(&conn, caller_id, "g").unwrap();
        insert_call_sync(&conn, caller_id, "g").unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM calls", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_dotted_callee_resolves_via_suffix() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let caller_id = add_symbol(&conn, fid, "my_func", "m.my_func", SymbolKind::Function);
        add_symbol(&conn, fid, "do_work", "m.SomeClass.do_work", SymbolKind::Method);

        // Parser extracts "obj.do_work" — the variable prefix won't match any
        // qualified_name or name directly, but the suffix "do_work" should.
        insert_call_sync(&conn, caller_id, "obj.do_work").unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let callees = get_callees_sync(&conn, "m.my_func", 1).unwrap();
        assert!(callees.iter().any(|s| s.name == "do_work"));
    }

    #[test]
    fn test_deeply_dotted_callee_resolves() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let caller_id = add_symbol(&conn, fid, "handler", "m.handler", SymbolKind::Function);
        add_symbol(&conn, fid, "execute", "m.DB.execute", SymbolKind::Method);

        insert_call_sync(&conn, caller_id, "self.db.execute").unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let callees = get_callees_sync(&conn, "m.handler", 1).unwrap();
        assert!(callees.iter().any(|s| s.name == "execute"));
    }

    #[test]
    fn test_unresolvable_callee_stays_null() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let caller_id = add_symbol(&conn, fid, "f", "m.f", SymbolKind::Function);

        insert_call_sync(&conn, caller_id, "totally_unknown").unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let resolved: Option<i64> = conn
            .query_row("SELECT callee_id FROM calls", [], |r| r.get(0))
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_cyclic_call_graph_terminates() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let a_id = add_symbol(&conn, fid, "alpha", "m.alpha", SymbolKind::Function);
        let b_id = add_symbol(&conn, fid, "beta", "m.beta", SymbolKind::Function);

        insert_call_sync(&conn, a_id, "m.beta").unwrap();
        insert_call_sync(&conn, b_id, "m.alpha").unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let callees = get_callees_sync(&conn, "m.alpha", 5).unwrap();
        let names: Vec<&str> = callees.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"alpha"));
        assert!(names.contains(&"beta"));
        assert_eq!(callees.len(), 2);

        let edges = get_call_edges_sync(&conn, "m.alpha", 5, EdgeDirection::Callees).unwrap();
        assert!(edges.contains(&("m.alpha".to_string(), "m.beta".to_string())));
        assert!(edges.contains(&("m.beta".to_string(), "m.alpha".to_string())));
    }

    #[test]
    fn test_call_edges_depth_bound() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        let a_id = add_symbol(&conn, fid, "a_fn", "m.a_fn", SymbolKind::Function);
        let b_id = add_symbol(&conn, fid, "b_fn", "m.b_fn", SymbolKind::Function);
        add_symbol(&conn, fid, "c_fn", "m.c_fn", SymbolKind::Function);

        insert_call_sync(&conn, a_id, "m.b_fn").unwrap();
        insert_call_sync(&conn, b_id, "m.c_fn").unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let edges = get_call_edges_sync(&conn, "m.a_fn", 1, EdgeDirection::Callees).unwrap();
        assert!(edges.contains(&("m.a_fn".to_string(), "m.b_fn".to_string())));
        assert!(!edges.contains(&("m.b_fn".to_string(), "m.c_fn".to_string())));

        let edges = get_call_edges_sync(&conn, "m.a_fn", 2, EdgeDirection::Callees).unwrap();
        assert!(edges.contains(&("m.b_fn".to_string(), "m.c_fn".to_string())));

        let edges = get_call_edges_sync(&conn, "m.c_fn", 2, EdgeDirection::Callers).unwrap();
        assert!(edges.contains(&("m.a_fn".to_string(), "m.b_fn".to_string())));
        assert!(edges.contains(&("m.b_fn".to_string(), "m.c_fn".to_string())));
    }

    #[test]
    fn test_inheritance_hierarchy() {
        let conn = test_conn();
        let fid = upsert_file_sync(&conn, "/a/b.py", "b.py", Some("python"), 1.0, "x").unwrap();
        add_symbol(&conn, fid, "Base", "m.Base", SymbolKind::Class);
        let child_id = add_symbol(&conn, fid, "Child", "m.Child", SymbolKind::Class);

        insert_inherit_sync(&conn, child_id, "m.Base").unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let hierarchy = get_class_hierarchy_sync(&conn, "Base").unwrap();
        assert!(hierarchy.class.is_some());
        assert!(hierarchy.children.iter().any(|c| c.name == "Child"));

        let hierarchy = get_class_hierarchy_sync(&conn, "Child").unwrap();
        assert!(hierarchy.parents.iter().any(|p| p.name == "Base"));
    }

    #[test]
    fn test_hierarchy_unknown_class_is_empty() {
        let conn = test_conn();
        let hierarchy = get_class_hierarchy_sync(&conn, "Ghost").unwrap();
        assert!(hierarchy.class.is_none());
        assert!(hierarchy.parents.is_empty());
        assert!(hierarchy.children.is_empty());
    }

    #[test]
    fn test_import_resolution_strict_suffix() {
        let conn = test_conn();
        let f1 = upsert_file_sync(&conn, "/a/src/app.py", "src/app.py", Some("python"), 1.0, "x")
            .unwrap();
        let f2 = upsert_file_sync(
            &conn,
            "/a/src/models.py",
            "src/models.py",
            Some("python"),
            1.0,
            "y",
        )
        .unwrap();
        // A file that merely *contains* the module name must not match.
        upsert_file_sync(
            &conn,
            "/a/src/models_test.py",
            "src/models_test.py",
            Some("python"),
            1.0,
            "z",
        )
        .unwrap();

        insert_import_sync(&conn, f1, "models", Some("Animal")).unwrap();
        resolve_graph_edges_sync(&conn).unwrap();

        let resolved: Option<i64> = conn
            .query_row("SELECT to_file_id FROM imports", [], |r| r.get(0))
            .unwrap();
        assert_eq!(resolved, Some(f2));
    }

    #[test]
    fn test_get_file_imports_both_directions() {
        let conn = test_conn();
        let f1 = upsert_file_sync(&conn, "/a/app.py", "app.py", Some("python"), 1.0, "x").unwrap();
        let f2 = upsert_file_sync(&conn, "/a/models.py", "models.py", Some("python"), 1.0, "y")
            .unwrap();

        insert_import_sync(&conn, f1, "models", Some("Animal")).unwrap();
        conn.execute(
            "UPDATE imports SET to_file_id = ?1 WHERE from_file_id = ?2",
            params![f2, f1],
        )
        .unwrap();

        let imports = get_file_imports_sync(&conn, "app.py").unwrap();
        assert_eq!(imports.imports.len(), 1);
        assert_eq!(imports.imports[0].to_module, "models");
        assert_eq!(imports.imports[0].resolved_path.as_deref(), Some("models.py"));

        let imported_by = get_file_imports_sync(&conn, "models.py").unwrap();
        assert_eq!(imported_by.imported_by, vec!["app.py".to_string()]);
    }
}
