// src/types.rs
// Shared data model: parsed symbols, graph edges, stored records, search results

use serde::{Deserialize, Serialize};

/// Kind of a source-located declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Module => "module",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "class" => Some(SymbolKind::Class),
            "module" => Some(SymbolKind::Module),
            _ => None,
        }
    }

    pub fn all() -> &'static [SymbolKind] {
        &[
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Class,
            SymbolKind::Module,
        ]
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A function or method parameter. `self`/`cls` receivers are elided by parsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_annotation: Option<String>,
    pub default: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: None,
            default: None,
        }
    }

    pub fn with_type(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: Some(ty.into()),
            default: None,
        }
    }
}

/// A symbol as produced by a parser, before it has a database identity.
///
/// `file_path` is left empty by parsers; the indexer fills it in.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub signature: String,
    pub docstring: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub decorators: Vec<String>,
    /// Qualified name of the containing class, if any.
    pub parent_qualified_name: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            kind,
            file_path: String::new(),
            line_start: 1,
            line_end: 1,
            signature: String::new(),
            docstring: String::new(),
            parameters: Vec::new(),
            return_type: None,
            decorators: Vec::new(),
            parent_qualified_name: None,
        }
    }

    pub fn parameters_json(&self) -> String {
        serde_json::to_string(&self.parameters).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn decorators_json(&self) -> String {
        serde_json::to_string(&self.decorators).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Graph relationships extracted from a single file.
///
/// Edge endpoints are qualified names; the indexer maps them to row ids.
#[derive(Debug, Clone, Default)]
pub struct GraphEdges {
    /// (from_qualified_module, to_module, imported_name)
    pub imports: Vec<(String, String, Option<String>)>,
    /// (caller_qualified_name, callee_name as written at the call site)
    pub calls: Vec<(String, String)>,
    /// (child_qualified_name, parent_name)
    pub inherits: Vec<(String, String)>,
}

/// Output from a parser for a single file.
///
/// Symbols are ordered with containing classes before their methods so the
/// indexer can resolve parent ids in a single pass.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub symbols: Vec<Symbol>,
    pub edges: GraphEdges,
}

/// A symbol as stored in and retrieved from the database.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolRecord {
    pub id: i64,
    pub file_id: i64,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub relative_path: String,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub decorators: Vec<String>,
    #[serde(skip)]
    pub parent_id: Option<i64>,
}

/// Which retrieval source(s) produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Semantic,
    Fulltext,
    Hybrid,
    Graph,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchType::Semantic => "semantic",
            MatchType::Fulltext => "fulltext",
            MatchType::Hybrid => "hybrid",
            MatchType::Graph => "graph",
        };
        write!(f, "{s}")
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub symbol: SymbolRecord,
    pub score: f32,
    pub match_type: MatchType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in SymbolKind::all() {
            assert_eq!(SymbolKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(SymbolKind::parse("struct"), None);
    }

    #[test]
    fn test_parameters_json_roundtrip() {
        let mut sym = Symbol::new("f", "m.f", SymbolKind::Function);
        sym.parameters = vec![
            Parameter {
                name: "a".into(),
                type_annotation: Some("int".into()),
                default: Some("0".into()),
            },
            Parameter::new("b"),
        ];
        let json = sym.parameters_json();
        let back: Vec<Parameter> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sym.parameters);
    }

    #[test]
    fn test_empty_decorators_serialize_as_list() {
        let sym = Symbol::new("f", "m.f", SymbolKind::Function);
        assert_eq!(sym.decorators_json(), "[]");
    }
}
