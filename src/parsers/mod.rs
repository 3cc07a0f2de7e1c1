// src/parsers/mod.rs
// Language-specific symbol extraction using tree-sitter

pub mod cfamily;
pub mod kotlin;
pub mod python;
pub mod rust;
pub mod swift;
pub mod typescript;

use crate::types::ParseResult;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Language, Node, Parser};

pub use cfamily::{CppParser, JavaParser};
pub use kotlin::KotlinParser;
pub use python::PythonParser;
pub use rust::RustParser;
pub use swift::SwiftParser;
pub use typescript::{JavaScriptParser, TypeScriptParser};

/// Trait for language-specific parsers.
///
/// `parse` is infallible by contract: sources with syntax errors (or a
/// grammar that fails to load) yield an empty ParseResult rather than an
/// error. Symbols come back with containing classes before their methods.
pub trait LanguageParser: Send + Sync {
    /// Language identifier (e.g. "rust", "python")
    fn language_id(&self) -> &'static str;

    /// Extract symbols and graph edges from source code.
    fn parse(&self, source: &str, module_name: &str) -> ParseResult;
}

/// Grammar handles, converted from their `LanguageFn`s once and reused for
/// every parse. The cache lives for the life of the process.
static LANGUAGES: Lazy<HashMap<&'static str, Language>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, Language> = HashMap::new();
    map.insert("python", tree_sitter_python::LANGUAGE.into());
    map.insert("rust", tree_sitter_rust::LANGUAGE.into());
    map.insert(
        "typescript",
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    );
    map.insert("javascript", tree_sitter_javascript::LANGUAGE.into());
    map.insert("java", tree_sitter_java::LANGUAGE.into());
    map.insert("cpp", tree_sitter_cpp::LANGUAGE.into());
    map.insert("kotlin", tree_sitter_kotlin_ng::LANGUAGE.into());
    map.insert("swift", tree_sitter_swift::LANGUAGE.into());
    map
});

static PYTHON_PARSER: PythonParser = PythonParser;
static TYPESCRIPT_PARSER: TypeScriptParser = TypeScriptParser;
static JAVASCRIPT_PARSER: JavaScriptParser = JavaScriptParser;
static RUST_PARSER: RustParser = RustParser;
static JAVA_PARSER: JavaParser = JavaParser;
static CPP_PARSER: CppParser = CppParser;
static KOTLIN_PARSER: KotlinParser = KotlinParser;
static SWIFT_PARSER: SwiftParser = SwiftParser;

/// Look up the parser back-end for a language name.
pub fn parser_for(language: &str) -> Option<&'static dyn LanguageParser> {
    match language {
        "python" => Some(&PYTHON_PARSER),
        "typescript" => Some(&TYPESCRIPT_PARSER),
        "javascript" => Some(&JAVASCRIPT_PARSER),
        "rust" => Some(&RUST_PARSER),
        "java" => Some(&JAVA_PARSER),
        "cpp" => Some(&CPP_PARSER),
        "kotlin" => Some(&KOTLIN_PARSER),
        "swift" => Some(&SWIFT_PARSER),
        _ => None,
    }
}

/// Parse source with the cached grammar for `language`. Returns None when
/// the grammar is unknown or refuses the source outright.
pub(crate) fn parse_tree(language: &str, source: &str) -> Option<tree_sitter::Tree> {
    let grammar = LANGUAGES.get(language)?;
    let mut parser = Parser::new();
    parser.set_language(grammar).ok()?;
    parser.parse(source, None)
}

/// Convert a file path (relative to the index root) to a dot-separated
/// module name. Extension is stripped; `__init__` and `mod` package markers
/// are elided.
pub fn derive_module_name(relative_path: &Path) -> String {
    let mut parts: Vec<String> = relative_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    if let Some(last) = parts.pop() {
        let stem = last.rsplit_once('.').map(|(s, _)| s.to_string()).unwrap_or(last);
        if stem != "__init__" && stem != "mod" {
            parts.push(stem);
        }
    }

    if parts.is_empty() {
        relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    } else {
        parts.join(".")
    }
}

// ------------------------------------------------------------------ //
// Node helpers shared by the extractors
// ------------------------------------------------------------------ //

/// Source text spanned by a node.
pub(crate) fn node_text(node: Node, source: &[u8]) -> String {
    std::str::from_utf8(&source[node.byte_range()])
        .unwrap_or("")
        .to_string()
}

/// First direct child whose kind is one of `kinds`.
pub(crate) fn child_by_kind<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| kinds.contains(&child.kind()))
}

/// Text of the named field, if present.
pub(crate) fn field_text(node: Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field).map(|n| node_text(n, source))
}

/// 1-based start line of a node.
pub(crate) fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-based end line of a node.
pub(crate) fn end_line(node: Node) -> u32 {
    node.end_position().row as u32 + 1
}

/// Best-effort doc comment: the contiguous block of line/block comments
/// immediately preceding `node` among its siblings. A non-comment sibling
/// in between resets the block.
pub(crate) fn leading_comment_doc(node: Node, source: &[u8]) -> String {
    let Some(parent) = node.parent() else {
        return String::new();
    };

    let mut lines: Vec<String> = Vec::new();
    let mut cursor = parent.walk();
    for sibling in parent.children(&mut cursor) {
        if sibling == node {
            break;
        }
        match sibling.kind() {
            "line_comment" | "comment" => {
                let text = node_text(sibling, source);
                lines.push(strip_comment_markers(&text));
            }
            "block_comment" => {
                let text = node_text(sibling, source);
                lines.clear();
                lines.push(strip_comment_markers(&text));
            }
            _ => lines.clear(),
        }
    }

    lines.join("\n").trim().to_string()
}

/// Strip `//`, `///`, `//!`, `/* */`, and leading `*` gutter markers.
pub(crate) fn strip_comment_markers(text: &str) -> String {
    let text = text.trim();
    let text = text
        .strip_prefix("/**")
        .or_else(|| text.strip_prefix("/*"))
        .unwrap_or(text);
    let text = text.strip_suffix("*/").unwrap_or(text);

    text.lines()
        .map(|line| {
            let line = line.trim();
            let line = line
                .strip_prefix("///")
                .or_else(|| line.strip_prefix("//!"))
                .or_else(|| line.strip_prefix("//"))
                .unwrap_or(line);
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
