// src/parsers/typescript.rs
// TypeScript / JavaScript extractor

use super::{
    LanguageParser, child_by_kind, end_line, field_text, leading_comment_doc, node_text,
    parse_tree, start_line,
};
use crate::types::{GraphEdges, Parameter, ParseResult, Symbol, SymbolKind};
use tree_sitter::Node;

/// Member expressions longer than this are noise, not call targets.
const MAX_CALLEE_LEN: usize = 100;

pub struct TypeScriptParser;

impl LanguageParser for TypeScriptParser {
    fn language_id(&self) -> &'static str {
        "typescript"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        extract("typescript", source, module_name)
    }
}

pub struct JavaScriptParser;

impl LanguageParser for JavaScriptParser {
    fn language_id(&self) -> &'static str {
        "javascript"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        extract("javascript", source, module_name)
    }
}

fn extract(language: &str, source: &str, module_name: &str) -> ParseResult {
    let Some(tree) = parse_tree(language, source) else {
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
            "class_declaration" => {
                self.handle_class(node);
                return;
            }
            "function_declaration" | "generator_function_declaration" | "method_definition" => {
                self.handle_function(node);
                return;
            }
            "import_statement" => self.handle_import(node),
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
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let qualified = self.qualify(&name);
        let parent_qn = self.class_stack.last().cloned();

        let bases = heritage_bases(node, self.source);
        let signature = match child_by_kind(node, &["class_heritage"]) {
            Some(heritage) => format!("class {name} {}", node_text(heritage, self.source)),
            None => format!("class {name}"),
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
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
        self.class_stack.pop();
    }

    fn handle_function(&mut self, node: Node) {
        let Some(name) = field_text(node, "name", self.source) else {
            return;
        };
        let is_method = node.kind() == "method_definition";
        let kind = if is_method {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let qualified = self.qualify(&name);

        let parameters = extract_params(node, self.source);
        let return_type = field_text(node, "return_type", self.source)
            .map(|t| t.trim_start_matches(':').trim().to_string());
        let is_async = child_by_kind(node, &["async"]).is_some();

        let mut sym = Symbol::new(&name, &qualified, kind);
        sym.line_start = start_line(node);
        sym.line_end = end_line(node);
        sym.signature = build_signature(&name, &parameters, return_type.as_deref(), is_async);
        sym.docstring = leading_comment_doc(node, self.source);
        sym.parameters = parameters;
        sym.return_type = return_type;
        sym.parent_qualified_name = if is_method {
            self.class_stack.last().cloned()
        } else {
            None
        };
        self.symbols.push(sym);

        if let Some(body) = node.child_by_field_name("body") {
            collect_calls(body, self.source, &qualified, &mut self.edges.calls);

            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
    }

    fn handle_import(&mut self, node: Node) {
        let Some(source_node) = node.child_by_field_name("source") else {
            return;
        };
        let module = node_text(source_node, self.source)
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string();

        let mut any = false;
        if let Some(clause) = child_by_kind(node, &["import_clause"]) {
            let mut cursor = clause.walk();
            for child in clause.children(&mut cursor) {
                match child.kind() {
                    "named_imports" => {
                        let mut sc = child.walk();
                        for spec in child.named_children(&mut sc) {
                            if spec.kind() == "import_specifier"
                                && let Some(name) = field_text(spec, "name", self.source)
                            {
                                any = true;
                                self.edges.imports.push((
                                    self.module_name.to_string(),
                                    module.clone(),
                                    Some(name),
                                ));
                            }
                        }
                    }
                    "identifier" => {
                        any = true;
                        self.edges.imports.push((
                            self.module_name.to_string(),
                            module.clone(),
                            Some(node_text(child, self.source)),
                        ));
                    }
                    _ => {}
                }
            }
        }
        if !any {
            self.edges
                .imports
                .push((self.module_name.to_string(), module, None));
        }
    }
}

fn collect_calls(node: Node, source: &[u8], caller: &str, calls: &mut Vec<(String, String)>) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_expression"
        | "arrow_function" | "method_definition" | "class_declaration" => return,
        "call_expression" => {
            if let Some(function) = node.child_by_field_name("function") {
                let name = match function.kind() {
                    "identifier" | "member_expression" => Some(node_text(function, source)),
                    _ => None,
                };
                if let Some(name) = name
                    && name.len() <= MAX_CALLEE_LEN
                {
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

fn heritage_bases(node: Node, source: &[u8]) -> Vec<String> {
    let Some(heritage) = child_by_kind(node, &["class_heritage"]) else {
        return Vec::new();
    };

    let mut bases = Vec::new();
    // TypeScript wraps bases in an extends_clause; the JavaScript grammar
    // puts the expression directly under class_heritage.
    let mut cursor = heritage.walk();
    for child in heritage.children(&mut cursor) {
        match child.kind() {
            "extends_clause" => {
                let mut ec = child.walk();
                for base in child.named_children(&mut ec) {
                    if matches!(base.kind(), "identifier" | "member_expression" | "type_identifier")
                    {
                        bases.push(node_text(base, source));
                    }
                }
            }
            "identifier" | "member_expression" => bases.push(node_text(child, source)),
            _ => {}
        }
    }
    bases
}

fn extract_params(node: Node, source: &[u8]) -> Vec<Parameter> {
    let Some(param_list) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut params = Vec::new();
    let mut cursor = param_list.walk();
    for child in param_list.named_children(&mut cursor) {
        let param = match child.kind() {
            "identifier" => Some(Parameter::new(node_text(child, source))),
            "required_parameter" | "optional_parameter" => {
                child_by_kind(child, &["identifier", "rest_pattern"]).map(|n| Parameter {
                    name: node_text(n, source),
                    type_annotation: field_text(child, "type", source)
                        .map(|t| t.trim_start_matches(':').trim().to_string()),
                    default: field_text(child, "value", source),
                })
            }
            "assignment_pattern" => Some(Parameter {
                name: field_text(child, "left", source).unwrap_or_default(),
                type_annotation: None,
                default: field_text(child, "right", source),
            }),
            "rest_pattern" => Some(Parameter::new(node_text(child, source))),
            _ => None,
        };
        if let Some(param) = param
            && !param.name.is_empty()
        {
            params.push(param);
        }
    }
    params
}

fn build_signature(
    name: &str,
    params: &[Parameter],
    return_type: Option<&str>,
    is_async: bool,
) -> String {
    let prefix = if is_async { "async function" } else { "function" };
    let rendered: Vec<String> = params
        .iter()
        .map(|p| {
            let mut part = p.name.clone();
            if let Some(ty) = &p.type_annotation {
                part.push_str(&format!(": {ty}"));
            }
            if let Some(default) = &p.default {
                part.push_str(&format!(" = {default}"));
            }
            part
        })
        .collect();

    let mut sig = format!("{prefix} {name}({})", rendered.join(", "));
    if let Some(ret) = return_type {
        sig.push_str(&format!(": {ret}"));
    }
    sig
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ts(source: &str) -> ParseResult {
        TypeScriptParser.parse(source, "utils")
    }

    #[test]
    fn test_finds_classes_and_methods() {
        let result = parse_ts(
            r#"
export class Animal {
    speak(): string {
        return "...";
    }
}

class Dog extends Animal {
    fetch(item: string): string {
        return item;
    }
}
"#,
        );
        let classes: Vec<&str> = result
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Class)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(classes, vec!["Animal", "Dog"]);

        let fetch = result.symbols.iter().find(|s| s.name == "fetch").unwrap();
        assert_eq!(fetch.kind, SymbolKind::Method);
        assert_eq!(fetch.qualified_name, "utils.Dog.fetch");
        assert_eq!(fetch.return_type.as_deref(), Some("string"));

        assert!(result
            .edges
            .inherits
            .contains(&("utils.Dog".to_string(), "Animal".to_string())));
    }

    #[test]
    fn test_function_parameters_and_types() {
        let result = parse_ts("function greet(name: string, count: number): void {}\n");
        let greet = result.symbols.iter().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.kind, SymbolKind::Function);
        assert_eq!(greet.parameters.len(), 2);
        assert_eq!(greet.parameters[0].name, "name");
        assert_eq!(greet.parameters[0].type_annotation.as_deref(), Some("string"));
        assert!(greet.signature.contains("greet(name: string, count: number)"));
    }

    #[test]
    fn test_named_imports() {
        let result = parse_ts("import { join, resolve } from 'path';\nimport fs from 'fs';\n");
        assert!(result
            .edges
            .imports
            .iter()
            .any(|(_, m, n)| m == "path" && n.as_deref() == Some("join")));
        assert!(result
            .edges
            .imports
            .iter()
            .any(|(_, m, n)| m == "fs" && n.as_deref() == Some("fs")));
    }

    #[test]
    fn test_calls_attributed_to_enclosing_function() {
        let result = parse_ts(
            r#"
function outer() {
    helper();
    this.store.load();
}
"#,
        );
        assert!(result
            .edges
            .calls
            .contains(&("utils.outer".to_string(), "helper".to_string())));
        assert!(result
            .edges
            .calls
            .contains(&("utils.outer".to_string(), "this.store.load".to_string())));
    }

    #[test]
    fn test_javascript_grammar() {
        let result = JavaScriptParser.parse(
            "class Greeter {\n  greet(name) {\n    return name;\n  }\n}\nfunction main() { }\n",
            "app",
        );
        assert!(result.symbols.iter().any(|s| s.name == "Greeter"));
        assert!(result
            .symbols
            .iter()
            .any(|s| s.name == "greet" && s.kind == SymbolKind::Method));
        assert!(result.symbols.iter().any(|s| s.name == "main"));
    }

    #[test]
    fn test_doc_comment_before_function() {
        let result = parse_ts("/** Adds two numbers. */\nfunction add(a: number, b: number) { return a + b; }\n");
        let add = result.symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(add.docstring, "Adds two numbers.");
    }
}
