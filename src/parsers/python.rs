// src/parsers/python.rs
// Python extractor: the richest back-end — parameters, defaults, return
// types, decorators, docstrings, plus call/import/inherits edges.

use super::{LanguageParser, child_by_kind, end_line, field_text, node_text, parse_tree, start_line};
use crate::types::{GraphEdges, Parameter, ParseResult, Symbol, SymbolKind};
use tree_sitter::Node;

pub struct PythonParser;

impl LanguageParser for PythonParser {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        let Some(tree) = parse_tree("python", source) else {
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
            "class_definition" => {
                self.handle_class(node);
                return;
            }
            "function_definition" => {
                self.handle_function(node);
                return;
            }
            "import_statement" => self.handle_import(node),
            "import_from_statement" => self.handle_import_from(node),
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

        let bases = class_bases(node, self.source);
        let signature = if bases.is_empty() {
            format!("class {name}")
        } else {
            format!("class {name}({})", bases.join(", "))
        };

        let mut sym = Symbol::new(&name, &qualified, SymbolKind::Class);
        sym.line_start = start_line(node);
        sym.line_end = end_line(node);
        sym.signature = signature;
        sym.docstring = get_docstring(node, self.source);
        sym.decorators = get_decorators(node, self.source);
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
        let kind = if self.class_stack.is_empty() {
            SymbolKind::Function
        } else {
            SymbolKind::Method
        };
        let qualified = self.qualify(&name);
        let parent_qn = self.class_stack.last().cloned();

        let parameters = extract_params(node, self.source);
        let return_type = field_text(node, "return_type", self.source);
        let is_async = child_by_kind(node, &["async"]).is_some();

        let mut sym = Symbol::new(&name, &qualified, kind);
        sym.line_start = start_line(node);
        sym.line_end = end_line(node);
        sym.signature = build_signature(&name, &parameters, return_type.as_deref(), is_async);
        sym.docstring = get_docstring(node, self.source);
        sym.parameters = parameters;
        sym.return_type = return_type;
        sym.decorators = get_decorators(node, self.source);
        sym.parent_qualified_name = parent_qn;
        self.symbols.push(sym);

        // Calls within this body, attributed to this function. The collector
        // stops at nested definitions; their calls belong to them.
        if let Some(body) = node.child_by_field_name("body") {
            collect_calls(body, self.source, &qualified, &mut self.edges.calls);
        }

        // Nested classes and functions still produce symbols of their own.
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
    }

    fn handle_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "dotted_name" => {
                    self.edges.imports.push((
                        self.module_name.to_string(),
                        node_text(child, self.source),
                        None,
                    ));
                }
                "aliased_import" => {
                    if let Some(name) = field_text(child, "name", self.source) {
                        self.edges
                            .imports
                            .push((self.module_name.to_string(), name, None));
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_import_from(&mut self, node: Node) {
        let Some(module) = field_text(node, "module_name", self.source) else {
            return;
        };

        let mut any = false;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            // The module_name field is itself a named child; skip it.
            if Some(child) == node.child_by_field_name("module_name") {
                continue;
            }
            let imported = match child.kind() {
                "dotted_name" => Some(node_text(child, self.source)),
                "aliased_import" => field_text(child, "name", self.source),
                "wildcard_import" => Some("*".to_string()),
                _ => None,
            };
            if let Some(imported) = imported {
                any = true;
                self.edges.imports.push((
                    self.module_name.to_string(),
                    module.clone(),
                    Some(imported),
                ));
            }
        }
        if !any {
            self.edges
                .imports
                .push((self.module_name.to_string(), module, None));
        }
    }
}

/// Collect call-site names inside `node`, without descending into nested
/// function or class definitions.
fn collect_calls(node: Node, source: &[u8], caller: &str, calls: &mut Vec<(String, String)>) {
    match node.kind() {
        "function_definition" | "class_definition" => return,
        "call" => {
            if let Some(function) = node.child_by_field_name("function")
                && let Some(name) = callable_name(function, source)
            {
                calls.push((caller.to_string(), name));
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, caller, calls);
    }
}

/// Stringify a callable expression: a plain identifier or a dotted attribute
/// chain. Chains that bottom out in something else (a call, a subscript)
/// reduce to their final attribute name.
fn callable_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, source)),
        "attribute" => {
            let attr = field_text(node, "attribute", source)?;
            let object = node.child_by_field_name("object")?;
            match callable_name(object, source) {
                Some(prefix) => Some(format!("{prefix}.{attr}")),
                None => Some(attr),
            }
        }
        _ => None,
    }
}

/// The first string expression of a body block, with quote markers stripped.
fn get_docstring(node: Node, source: &[u8]) -> String {
    let Some(body) = node.child_by_field_name("body") else {
        return String::new();
    };
    let mut cursor = body.walk();
    let Some(first) = body.named_children(&mut cursor).next() else {
        return String::new();
    };
    if first.kind() != "expression_statement" {
        return String::new();
    }
    let mut ec = first.walk();
    let Some(expr) = first.named_children(&mut ec).next() else {
        return String::new();
    };
    if expr.kind() != "string" {
        return String::new();
    }

    let raw = node_text(expr, source);
    strip_string_quotes(&raw)
}

fn strip_string_quotes(raw: &str) -> String {
    for marker in ["\"\"\"", "'''"] {
        if let Some(inner) = raw
            .strip_prefix(marker)
            .and_then(|rest| rest.strip_suffix(marker))
        {
            return inner.trim().to_string();
        }
    }
    raw.trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

/// Decorator names from an enclosing decorated_definition, without the `@`
/// and without call arguments.
fn get_decorators(node: Node, source: &[u8]) -> Vec<String> {
    let Some(parent) = node.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }

    let mut cursor = parent.walk();
    parent
        .children(&mut cursor)
        .filter(|n| n.kind() == "decorator")
        .map(|n| {
            let text = node_text(n, source);
            let text = text.trim_start_matches('@');
            text.split('(').next().unwrap_or(text).trim().to_string()
        })
        .collect()
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
            "typed_parameter" => {
                let name = child_by_kind(child, &["identifier"])
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                let ty = field_text(child, "type", source);
                Some(Parameter {
                    name,
                    type_annotation: ty,
                    default: None,
                })
            }
            "default_parameter" => Some(Parameter {
                name: field_text(child, "name", source).unwrap_or_default(),
                type_annotation: None,
                default: field_text(child, "value", source),
            }),
            "typed_default_parameter" => Some(Parameter {
                name: field_text(child, "name", source).unwrap_or_default(),
                type_annotation: field_text(child, "type", source),
                default: field_text(child, "value", source),
            }),
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                Some(Parameter::new(node_text(child, source)))
            }
            _ => None,
        };

        if let Some(param) = param {
            // Receivers carry no information
            if param.name == "self" || param.name == "cls" || param.name.is_empty() {
                continue;
            }
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
    let prefix = if is_async { "async def" } else { "def" };
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
        sig.push_str(&format!(" -> {ret}"));
    }
    sig
}

fn class_bases(node: Node, source: &[u8]) -> Vec<String> {
    let Some(superclasses) = node.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = superclasses.walk();
    superclasses
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "identifier" | "attribute"))
        .map(|n| node_text(n, source))
        .collect()
}
