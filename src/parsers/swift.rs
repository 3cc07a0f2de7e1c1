// src/parsers/swift.rs
// Swift extractor: classes/structs/enums, protocols, functions, inheritance
// and import edges

use super::{
    LanguageParser, child_by_kind, end_line, leading_comment_doc, node_text, parse_tree,
    start_line,
};
use crate::types::{GraphEdges, ParseResult, Symbol, SymbolKind};
use tree_sitter::Node;

pub struct SwiftParser;

impl LanguageParser for SwiftParser {
    fn language_id(&self) -> &'static str {
        "swift"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        let Some(tree) = parse_tree("swift", source) else {
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
            // The Swift grammar parses class, struct, enum, and extension
            // declarations as class_declaration with a keyword child.
            "class_declaration" | "struct_declaration" | "protocol_declaration" => {
                self.handle_class(node);
                return;
            }
            "function_declaration" | "protocol_function_declaration" | "init_declaration" => {
                self.handle_function(node);
                return;
            }
            "import_declaration" => self.handle_import(node),
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
        let Some(name_node) =
            child_by_kind(node, &["type_identifier", "user_type", "simple_identifier"])
        else {
            return;
        };
        let name = node_text(name_node, self.source);
        let qualified = self.qualify(&name);
        let parent_qn = self.class_stack.last().cloned();

        let keyword = if node.kind() == "protocol_declaration" {
            "protocol"
        } else if child_by_kind(node, &["struct"]).is_some() {
            "struct"
        } else if child_by_kind(node, &["enum"]).is_some() {
            "enum"
        } else if child_by_kind(node, &["extension"]).is_some() {
            "extension"
        } else {
            "class"
        };

        let bases = inherited_types(node, self.source);
        let signature = if bases.is_empty() {
            format!("{keyword} {name}")
        } else {
            format!("{keyword} {name}: {}", bases.join(", "))
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
        if let Some(body) = child_by_kind(
            node,
            &["class_body", "protocol_body", "enum_class_body", "struct_body"],
        ) {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
        self.class_stack.pop();
    }

    fn handle_function(&mut self, node: Node) {
        let name = match child_by_kind(node, &["simple_identifier"]) {
            Some(name_node) => node_text(name_node, self.source),
            None if node.kind() == "init_declaration" => "init".to_string(),
            None => return,
        };
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
        if let Some(path) = child_by_kind(node, &["identifier", "simple_identifier"]) {
            self.edges.imports.push((
                self.module_name.to_string(),
                node_text(path, self.source),
                None,
            ));
        }
    }
}

/// Inherited type names from the type inheritance clause, generics stripped.
fn inherited_types(node: Node, source: &[u8]) -> Vec<String> {
    let mut bases = Vec::new();
    collect_inheritance(node, source, &mut bases);
    bases
}

fn collect_inheritance(node: Node, source: &[u8], out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "inheritance_specifier" => {
                let text = node_text(child, source);
                let bare = text.split('<').next().unwrap_or(&text).trim().to_string();
                if !bare.is_empty() {
                    out.push(bare);
                }
            }
            "class_body" | "protocol_body" | "enum_class_body" | "struct_body" => {}
            _ => collect_inheritance(child, source, out),
        }
    }
}

fn collect_calls(node: Node, source: &[u8], caller: &str, calls: &mut Vec<(String, String)>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration" | "class_declaration" => continue,
            "call_expression" => {
                if let Some(target) =
                    child_by_kind(child, &["simple_identifier", "navigation_expression"])
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

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
import Foundation

protocol Greetable {
    func greet() -> String
}

class Animal {
    let name: String

    init(name: String) {
        self.name = name
    }

    func speak() -> String {
        return "..."
    }
}

class Dog: Animal {
    override func speak() -> String {
        return "Woof!"
    }

    func fetch(item: String) -> String {
        return item
    }
}

struct Greeting {
    let text: String
}

enum Color {
    case red, green, blue
}
"#;

    fn parse(source: &str) -> ParseResult {
        SwiftParser.parse(source, "Models")
    }

    #[test]
    fn test_finds_classes_structs_enums() {
        let result = parse(SAMPLE);
        let classes: Vec<&str> = result
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Class)
            .map(|s| s.name.as_str())
            .collect();
        assert!(classes.contains(&"Animal"));
        assert!(classes.contains(&"Dog"));
        assert!(classes.contains(&"Greeting"), "struct missing: {classes:?}");
        assert!(classes.contains(&"Color"), "enum missing: {classes:?}");
    }

    #[test]
    fn test_finds_protocol() {
        let result = parse(SAMPLE);
        assert!(result
            .symbols
            .iter()
            .any(|s| s.name == "Greetable" && s.kind == SymbolKind::Class));
    }

    #[test]
    fn test_finds_methods() {
        let result = parse(SAMPLE);
        let methods: Vec<&str> = result
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Method)
            .map(|s| s.name.as_str())
            .collect();
        assert!(methods.contains(&"speak"));
        assert!(methods.contains(&"fetch"));

        let fetch = result.symbols.iter().find(|s| s.name == "fetch").unwrap();
        assert_eq!(fetch.qualified_name, "Models.Dog.fetch");
    }

    #[test]
    fn test_inheritance_edge() {
        let result = parse(SAMPLE);
        assert!(
            result
                .edges
                .inherits
                .contains(&("Models.Dog".to_string(), "Animal".to_string())),
            "inherits: {:?}",
            result.edges.inherits
        );
    }

    #[test]
    fn test_import_edge() {
        let result = parse(SAMPLE);
        assert!(result.edges.imports.iter().any(|(_, m, _)| m == "Foundation"));
    }
}
