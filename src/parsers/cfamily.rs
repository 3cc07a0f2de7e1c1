// src/parsers/cfamily.rs
// Java / C++ extractor: classes, interfaces, methods, inheritance, imports
//
// Lighter than the Python back-end: no parameter defaults or decorators,
// doc comments by the leading-comment heuristic only.

use super::{
    LanguageParser, child_by_kind, end_line, field_text, leading_comment_doc, node_text,
    parse_tree, start_line,
};
use crate::types::{GraphEdges, ParseResult, Symbol, SymbolKind};
use tree_sitter::Node;

pub struct JavaParser;

impl LanguageParser for JavaParser {
    fn language_id(&self) -> &'static str {
        "java"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        extract("java", source, module_name)
    }
}

pub struct CppParser;

impl LanguageParser for CppParser {
    fn language_id(&self) -> &'static str {
        "cpp"
    }

    fn parse(&self, source: &str, module_name: &str) -> ParseResult {
        extract("cpp", source, module_name)
    }
}

fn extract(language: &'static str, source: &str, module_name: &str) -> ParseResult {
    let Some(tree) = parse_tree(language, source) else {
        return ParseResult::default();
    };

    let mut visitor = Visitor {
        language,
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
    language: &'static str,
    source: &'a [u8],
    module_name: &'a str,
    class_stack: Vec<String>,
    symbols: Vec<Symbol>,
    edges: GraphEdges,
}

impl<'a> Visitor<'a> {
    fn walk(&mut self, node: Node) {
        match node.kind() {
            "class_declaration" | "interface_declaration" | "class_specifier"
            | "struct_specifier" => {
                self.handle_class(node);
                return;
            }
            "method_declaration" | "constructor_declaration" | "function_definition" => {
                self.handle_method(node);
                return;
            }
            "import_declaration" => self.handle_java_import(node),
            "preproc_include" => self.handle_include(node),
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

        let bases = self.base_classes(node);
        let signature = if bases.is_empty() {
            format!("class {name}")
        } else {
            format!("class {name} : {}", bases.join(", "))
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

    fn base_classes(&self, node: Node) -> Vec<String> {
        let mut bases = Vec::new();
        // Java: `extends X` under a superclass node, `implements A, B` under
        // super_interfaces. C++: base_class_clause.
        if let Some(superclass) = child_by_kind(node, &["superclass"])
            && let Some(ty) = child_by_kind(superclass, &["type_identifier", "generic_type"])
        {
            let text = node_text(ty, self.source);
            bases.push(text.split('<').next().unwrap_or(&text).to_string());
        }
        if let Some(interfaces) = child_by_kind(node, &["super_interfaces"]) {
            collect_type_identifiers(interfaces, self.source, &mut bases);
        }
        if let Some(clause) = child_by_kind(node, &["base_class_clause"]) {
            collect_type_identifiers(clause, self.source, &mut bases);
        }
        bases
    }

    fn handle_method(&mut self, node: Node) {
        let Some(name) = self.method_name(node) else {
            return;
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
        sym.return_type = field_text(node, "type", self.source);
        sym.parent_qualified_name = self.class_stack.last().cloned();
        self.symbols.push(sym);

        if let Some(body) = node.child_by_field_name("body") {
            collect_calls(self.language, body, self.source, &qualified, &mut self.edges.calls);

            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk(child);
            }
        }
    }

    fn method_name(&self, node: Node) -> Option<String> {
        if let Some(name) = field_text(node, "name", self.source) {
            return Some(name);
        }
        // C++ function_definition: name lives inside the declarator chain
        let mut declarator = node.child_by_field_name("declarator")?;
        loop {
            match declarator.kind() {
                "function_declarator" => {
                    declarator = declarator.child_by_field_name("declarator")?;
                }
                "identifier" | "field_identifier" | "qualified_identifier"
                | "destructor_name" => {
                    let text = node_text(declarator, self.source);
                    return Some(
                        text.rsplit("::").next().unwrap_or(&text).to_string(),
                    );
                }
                _ => {
                    declarator = declarator.child_by_field_name("declarator")?;
                }
            }
        }
    }

    fn handle_java_import(&mut self, node: Node) {
        if let Some(path) = child_by_kind(node, &["scoped_identifier", "identifier"]) {
            self.edges.imports.push((
                self.module_name.to_string(),
                node_text(path, self.source),
                None,
            ));
        }
    }

    fn handle_include(&mut self, node: Node) {
        if let Some(path) = field_text(node, "path", self.source) {
            let trimmed = path
                .trim_matches(|c| c == '"' || c == '<' || c == '>')
                .to_string();
            if !trimmed.is_empty() {
                self.edges
                    .imports
                    .push((self.module_name.to_string(), trimmed, None));
            }
        }
    }
}

fn collect_type_identifiers(node: Node, source: &[u8], out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "type_identifier" => out.push(node_text(child, source)),
            _ => collect_type_identifiers(child, source, out),
        }
    }
}

fn collect_calls(
    language: &str,
    node: Node,
    source: &[u8],
    caller: &str,
    calls: &mut Vec<(String, String)>,
) {
    match node.kind() {
        "method_declaration" | "constructor_declaration" | "function_definition"
        | "lambda_expression" | "class_declaration" | "class_specifier" => return,
        "method_invocation" => {
            // Java: object.name(...) or name(...)
            if let Some(name) = field_text(node, "name", source) {
                let callee = match field_text(node, "object", source) {
                    Some(object) if object.len() <= 80 => format!("{object}.{name}"),
                    _ => name,
                };
                calls.push((caller.to_string(), callee));
            }
        }
        "call_expression" if language == "cpp" => {
            if let Some(function) = node.child_by_field_name("function") {
                let name = match function.kind() {
                    "identifier" | "field_expression" | "qualified_identifier" => {
                        Some(node_text(function, source))
                    }
                    _ => None,
                };
                if let Some(name) = name
                    && name.len() <= 100
                {
                    calls.push((caller.to_string(), name));
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(language, child, source, caller, calls);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_classes_methods_and_extends() {
        let result = JavaParser.parse(
            r#"
import java.util.List;

public class Animal {
    public String speak() {
        return "...";
    }
}

public class Dog extends Animal {
    public String fetch(String item) {
        return helper(item);
    }
}
"#,
            "Models",
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
        assert_eq!(fetch.qualified_name, "Models.Dog.fetch");

        assert!(result
            .edges
            .inherits
            .contains(&("Models.Dog".to_string(), "Animal".to_string())));
        assert!(result
            .edges
            .imports
            .iter()
            .any(|(_, m, _)| m == "java.util.List"));
        assert!(result
            .edges
            .calls
            .contains(&("Models.Dog.fetch".to_string(), "helper".to_string())));
    }

    #[test]
    fn test_java_interface() {
        let result = JavaParser.parse(
            "public interface Greetable {\n    String greet();\n}\n",
            "Models",
        );
        let greetable = result.symbols.iter().find(|s| s.name == "Greetable").unwrap();
        assert_eq!(greetable.kind, SymbolKind::Class);
    }

    #[test]
    fn test_cpp_classes_and_methods() {
        let result = CppParser.parse(
            r#"
#include "animal.h"

class Animal {
public:
    virtual std::string speak() {
        return "...";
    }
};

class Dog : public Animal {
public:
    std::string fetch(std::string item) {
        return item;
    }
};
"#,
            "models",
        );

        let classes: Vec<&str> = result
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Class)
            .map(|s| s.name.as_str())
            .collect();
        assert!(classes.contains(&"Animal"));
        assert!(classes.contains(&"Dog"));

        assert!(result
            .symbols
            .iter()
            .any(|s| s.name == "fetch" && s.kind == SymbolKind::Method));
        assert!(result
            .edges
            .inherits
            .contains(&("models.Dog".to_string(), "Animal".to_string())));
        assert!(result.edges.imports.iter().any(|(_, m, _)| m == "animal.h"));
    }

    #[test]
    fn test_cpp_free_function() {
        let result = CppParser.parse(
            "int add(int a, int b) {\n    return a + b;\n}\n",
            "math",
        );
        let add = result.symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(add.kind, SymbolKind::Function);
        assert_eq!(add.qualified_name, "math.add");
    }
}
