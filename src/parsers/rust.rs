// src/parsers/rust.rs
// Rust extractor: functions, impl methods, structs/enums/traits, use edges

use super::{
    LanguageParser, end_line, field_text, leading_comment_doc, node_text, parse_tree, start_line,
};
use crate::types::{GraphEdges, Parameter, ParseResult, Symbol, SymbolKind};
use tree_sitter::Node;

pub struct RustParser;

impl LanguageParser for RustParser {
    fn language_id(&self) -> &'static str {
        "rust"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        let Some(tree) = parse_tree("rust", source) else {
            return ParseResult::default();
        };

        let mut visitor = Visitor {
            source: source.as_bytes(),
            module_name,
            impl_stack: Vec::new(),
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
    impl_stack: Vec<String>,
    symbols: Vec<Symbol>,
    edges: GraphEdges,
}

impl<'a> Visitor<'a> {
    fn walk(&mut self, node: Node) {
        match node.kind() {
            "function_item" => {
                self.handle_fn(node);
                return;
            }
            "struct_item" | "enum_item" | "trait_item" => {
                self.handle_type(node);
                return;
            }
            "impl_item" => {
                self.handle_impl(node);
                return;
            }
            "use_declaration" => self.handle_use(node),
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn handle_fn(&mut self, node: Node) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let (kind, qualified, parent_qn) = match self.impl_stack.last() {
            Some(impl_type) => (
                SymbolKind::Method,
                format!("{impl_type}::{name}"),
                Some(impl_type.clone()),
            ),
            None => (
                SymbolKind::Function,
                format!("{}::{name}", self.module_name),
                None,
            ),
        };

        let full_text = node_text(node, self.source);
        let signature = full_text
            .split('{')
            .next()
            .unwrap_or(&full_text)
            .trim()
            .chars()
            .take(500)
            .collect::<String>();

        let mut sym = Symbol::new(&name, &qualified, kind);
        sym.line_start = start_line(node);
        sym.line_end = end_line(node);
        sym.signature = signature;
        sym.docstring = leading_comment_doc(node, self.source);
        sym.parameters = extract_params(node, self.source);
        sym.return_type = field_text(node, "return_type", self.source);
        sym.parent_qualified_name = parent_qn;
        self.symbols.push(sym);

        if let Some(body) = node.child_by_field_name("body") {
            collect_calls(body, self.source, &qualified, &mut self.edges.calls);

            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
    }

    fn handle_type(&mut self, node: Node) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = format!("{}::{name}", self.module_name);
        let keyword = node.kind().trim_end_matches("_item");

        let mut sym = Symbol::new(&name, &qualified, SymbolKind::Class);
        sym.line_start = start_line(node);
        sym.line_end = end_line(node);
        sym.signature = format!("{keyword} {name}");
        sym.docstring = leading_comment_doc(node, self.source);
        self.symbols.push(sym);

        // Default methods inside trait bodies
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn handle_impl(&mut self, node: Node) {
        let Some(type_name) = field_text(node, "type", self.source) else {
            return;
        };
        // Strip generic arguments: `Foo<T>` declares methods on `Foo`
        let type_name = type_name.split('<').next().unwrap_or(&type_name).to_string();
        let qualified = format!("{}::{type_name}", self.module_name);

        // `impl Trait for Type` records an inheritance-like edge so trait
        // implementations show up in hierarchy queries.
        if let Some(trait_name) = field_text(node, "trait", self.source) {
            let trait_name = trait_name.split('<').next().unwrap_or(&trait_name).to_string();
            self.edges.inherits.push((qualified.clone(), trait_name));
        }

        self.impl_stack.push(qualified);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
        self.impl_stack.pop();
    }

    fn handle_use(&mut self, node: Node) {
        let text = node_text(node, self.source);
        let path = text
            .trim()
            .trim_start_matches("pub ")
            .trim_start_matches("use")
            .trim()
            .trim_end_matches(';')
            .to_string();
        if !path.is_empty() {
            self.edges
                .imports
                .push((self.module_name.to_string(), path, None));
        }
    }
}

fn collect_calls(node: Node, source: &[u8], caller: &str, calls: &mut Vec<(String, String)>) {
    match node.kind() {
        "function_item" | "closure_expression" => return,
        "call_expression" => {
            if let Some(function) = node.child_by_field_name("function") {
                let name = match function.kind() {
                    "identifier" | "scoped_identifier" | "field_expression" => {
                        Some(node_text(function, source))
                    }
                    _ => None,
                };
                if let Some(name) = name {
                    calls.push((caller.to_string(), name));
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, caller, calls);
    }
}

fn extract_params(node: Node, source: &[u8]) -> Vec<Parameter> {
    let Some(param_list) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut params = Vec::new();
    let mut cursor = param_list.walk();
    for child in param_list.named_children(&mut cursor) {
        if child.kind() == "parameter" {
            let name = field_text(child, "pattern", source).unwrap_or_else(|| "_".to_string());
            params.push(Parameter {
                name,
                type_annotation: field_text(child, "type", source),
                default: None,
            });
        }
        // self_parameter is a receiver, elided like Python's self
    }
    params
}
