// src/parsers/kotlin.rs
// Kotlin extractor: classes (incl. data/sealed/enum), interfaces, objects,
// functions, supertype and import edges

use super::{
    LanguageParser, child_by_kind, end_line, leading_comment_doc, node_text, parse_tree,
    start_line,
};
use crate::types::{GraphEdges, ParseResult, Symbol, SymbolKind};
use tree_sitter::Node;

pub struct KotlinParser;

impl LanguageParser for KotlinParser {
    fn language_id(&self) -> &'static str {
        "kotlin"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        let Some(tree) = parse_tree("kotlin", source) else {
            return ParseResult::default();
        };

        let mut visitor = Visitor {
            source: source.as_bytes(),
            module_name,
            class_stack: Vec::new(),
            symbols: Vec::new(),
            edges: GraphEdges::default(),
        };
        visitor.walk(tree.root_node());

        ParseResult {
            symbols: visitor.symbols,
            edges: visitor.edges,
        }
    }
}

struct Visitor<'a> {
    source: &'a [u8],
    module_name: &'a str,
    class_stack: Vec<String>,
    symbols: Vec<Symbol>,
    edges: GraphEdges,
}

impl<'a> Visitor<'a> {
    fn walk(&mut self, node: Node) {
        match node.kind() {
            "class_declaration" | "enum_declaration" | "interface_declaration"
            | "object_declaration" => {
                self.handle_class(node);
                return;
            }
            "function_declaration" => {
                self.handle_function(node);
                return;
            }
            "import" | "import_header" => self.handle_import(node),
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn qualify(&self, name: &str) -> String {
        match self.class_stack.last() {
            Some(class) => format!("{class}.{name}"),
            None => format!("{}.{name}", self.module_name),
        }
    }

    fn handle_class(&mut self, node: Node) {
        let Some(name_node) = child_by_kind(node, &["identifier", "simple_identifier"]) else {
            return;
        };
        let name = node_text(name_node, self.source);
        let qualified = self.qualify(&name);
        let parent_qn = self.class_stack.last().cloned();

        let keyword = match node.kind() {
            "interface_declaration" => "interface",
            "object_declaration" => "object",
            "enum_declaration" => "enum class",
            _ => "class",
        };
        let bases = super_types(node, self.source);
        let signature = if bases.is_empty() {
            format!("{keyword} {name}")
        } else {
            format!("{keyword} {name} : {}", bases.join(", "))
        };

        let mut sym = Symbol::new(&name, &qualified, SymbolKind::Class);
        sym.line_start = start_line(node);
        sym.line_end = end_line(node);
        sym.signature = signature;
        sym.docstring = leading_comment_doc(node, self.source);
        sym.parent_qualified_name = parent_qn;
        self.symbols.push(sym);

        for base in bases {
            self.edges.inherits.push((qualified.clone(), base));
        }

        self.class_stack.push(qualified);
        if let Some(body) = child_by_kind(node, &["class_body", "enum_class_body"]) {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
        self.class_stack.pop();
    }

    fn handle_function(&mut self, node: Node) {
        let Some(name_node) = child_by_kind(node, &["identifier", "simple_identifier"]) else {
            return;
        };
        let name = node_text(name_node, self.source);
        let kind = if self.class_stack.is_empty() {
            SymbolKind::Function
        } else {
            SymbolKind::Method
        };
        let qualified = self.qualify(&name);

        let full_text = node_text(node, self.source);
        let signature = full_text
            .split('{')
            .next()
            .unwrap_or(&full_text)
            .trim()
            .chars()
            .take(300)
            .collect::<String>();

        let mut sym = Symbol::new(&name, &qualified, kind);
        sym.line_start = start_line(node);
        sym.line_end = end_line(node);
        sym.signature = signature;
        sym.docstring = leading_comment_doc(node, self.source);
        sym.parent_qualified_name = self.class_stack.last().cloned();
        self.symbols.push(sym);

        collect_calls(node, self.source, &qualified, &mut self.edges.calls);
    }

    fn handle_import(&mut self, node: Node) {
        if let Some(path) = child_by_kind(node, &["qualified_identifier", "identifier"]) {
            self.edges.imports.push((
                self.module_name.to_string(),
                node_text(path, self.source),
                None,
            ));
        }
    }
}

/// Supertype names from delegation specifiers, with constructor arguments
/// and generic parameters stripped: `Animal(name)` and `Result<T>` both
/// yield their bare type name.
fn super_types(node: Node, source: &[u8]) -> Vec<String> {
    let mut bases = Vec::new();
    collect_delegation_specifiers(node, source, &mut bases);
    bases
}

fn collect_delegation_specifiers(node: Node, source: &[u8], out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "delegation_specifier" => {
                let text = node_text(child, source);
                let bare = text
                    .split(|c| c == '(' || c == '<')
                    .next()
                    .unwrap_or(&text)
                    .trim()
                    .to_string();
                if !bare.is_empty() {
                    out.push(bare);
                }
            }
            // Don't descend into nested class bodies
            "class_body" | "enum_class_body" => {}
            _ => collect_delegation_specifiers(child, source, out),
        }
    }
}

fn collect_calls(node: Node, source: &[u8], caller: &str, calls: &mut Vec<(String, String)>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration" | "class_declaration" | "object_declaration" => continue,
            "call_expression" => {
                if let Some(target) =
                    child_by_kind(child, &["identifier", "simple_identifier", "navigation_expression"])
                {
                    let name = node_text(target, source);
                    if name.len() <= 100 {
                        calls.push((caller.to_string(), name));
                    }
                }
                collect_calls(child, source, caller, calls);
            }
            _ => collect_calls(child, source, caller, calls),
        }
    }
}
