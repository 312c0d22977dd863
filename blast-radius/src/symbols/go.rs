//! Go symbol extraction backed by tree-sitter.
//!
//! Unlike the heuristic languages, Go source must parse cleanly: any ERROR or
//! MISSING node fails extraction. Signatures are rebuilt from the syntax tree
//! rather than copied, so reformatting a declaration never looks like an API
//! change.

use super::extractor::LanguageExtractor;
use super::{Language, Symbol, SymbolKind};
use crate::error::{AnalysisError, Result};
use tree_sitter::{Node, Parser, Point};

pub struct GoExtractor;

impl LanguageExtractor for GoExtractor {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| AnalysisError::grammar("go", e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::parse(file_path, 1, 1, "parser produced no tree"))?;
        let root = tree.root_node();

        if root.has_error() {
            let point = first_error_position(root).unwrap_or(root.start_position());
            return Err(AnalysisError::parse(
                file_path,
                point.row as u32 + 1,
                point.column as u32 + 1,
                "syntax error",
            ));
        }
        if let Some(point) = missing_package_clause(root) {
            return Err(AnalysisError::parse(
                file_path,
                point.row as u32 + 1,
                point.column as u32 + 1,
                "expected 'package' clause",
            ));
        }

        let mut symbols = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "function_declaration" | "method_declaration" => {
                    if let Some(sym) = extract_function(child, source, file_path) {
                        symbols.push(sym);
                    }
                }
                "type_declaration" => extract_type_declaration(child, source, file_path, &mut symbols),
                "var_declaration" => {
                    extract_value_specs(child, source, file_path, SymbolKind::Variable, &mut symbols);
                }
                "const_declaration" => {
                    extract_value_specs(child, source, file_path, SymbolKind::Constant, &mut symbols);
                }
                _ => {}
            }
        }

        Ok(symbols)
    }
}

/// Locate the first ERROR or MISSING node in document order.
fn first_error_position(node: Node) -> Option<Point> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position());
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_position)
}

/// Where a package clause was expected, when the first declaration is not one.
fn missing_package_clause(root: Node) -> Option<Point> {
    let mut cursor = root.walk();
    let first = root.named_children(&mut cursor).find(|child| child.kind() != "comment");
    match first {
        Some(node) if node.kind() == "package_clause" => None,
        Some(node) => Some(node.start_position()),
        None => Some(root.start_position()),
    }
}

fn extract_function(node: Node, source: &str, file_path: &str) -> Option<Symbol> {
    let name = find_child_text(node, "name", source)?;
    let mut sym = Symbol::new(name, SymbolKind::Function, file_path, line_of(node.start_position()));
    sym.end_line = line_of(node.end_position());
    sym.exported = is_exported(&sym.name);

    let mut receiver_text = None;
    if let Some(receiver) = node.child_by_field_name("receiver") {
        if let Some((names, type_text)) = first_parameter(receiver, source) {
            sym.kind = SymbolKind::Method;
            sym.parent = receiver_parent(&type_text);
            receiver_text = Some(match names.first() {
                Some(recv_name) => format!("{recv_name} {type_text}"),
                None => type_text,
            });
        }
    }

    if let Some(params) = node.child_by_field_name("parameters") {
        sym.parameters = render_parameters(params, source);
    }

    let returns = node
        .child_by_field_name("result")
        .map(|result| render_results(result, source))
        .unwrap_or_default();
    sym.return_type = returns.join(", ");

    let type_params = node
        .child_by_field_name("type_parameters")
        .map(|tp| collapse_whitespace(node_text(tp, source)))
        .unwrap_or_default();

    sym.signature = build_signature(
        receiver_text.as_deref(),
        &sym.name,
        &type_params,
        &sym.parameters,
        &returns,
    );
    Some(sym)
}

/// Canonical `func (recv) Name[T](params) returns` rendering.
fn build_signature(
    receiver: Option<&str>,
    name: &str,
    type_params: &str,
    params: &[String],
    returns: &[String],
) -> String {
    let mut sig = String::from("func ");
    if let Some(receiver) = receiver {
        sig.push('(');
        sig.push_str(receiver);
        sig.push_str(") ");
    }
    sig.push_str(name);
    sig.push_str(type_params);
    sig.push('(');
    sig.push_str(&params.join(", "));
    sig.push(')');
    match returns.len() {
        0 => {}
        1 => {
            sig.push(' ');
            sig.push_str(&returns[0]);
        }
        _ => {
            sig.push_str(" (");
            sig.push_str(&returns.join(", "));
            sig.push(')');
        }
    }
    sig
}

/// Receiver type without pointer marker or type arguments: `*List[T]` -> `List`.
fn receiver_parent(type_text: &str) -> String {
    let base = type_text.trim_start_matches('*');
    base.split('[').next().unwrap_or(base).to_owned()
}

fn extract_type_declaration(node: Node, source: &str, file_path: &str, out: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if !matches!(spec.kind(), "type_spec" | "type_alias") {
            continue;
        }
        let Some(name) = find_child_text(spec, "name", source) else {
            continue;
        };
        let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
            Some("struct_type") if spec.kind() == "type_spec" => SymbolKind::Struct,
            Some("interface_type") if spec.kind() == "type_spec" => SymbolKind::Interface,
            _ => SymbolKind::Type,
        };
        let mut sym = Symbol::new(name, kind, file_path, line_of(spec.start_position()));
        sym.end_line = line_of(spec.end_position());
        sym.exported = is_exported(&sym.name);
        if kind == SymbolKind::Type {
            if let Some(type_node) = spec.child_by_field_name("type") {
                let sep = if spec.kind() == "type_alias" { " = " } else { " " };
                sym.signature = format!("type {}{sep}{}", sym.name, render_type(type_node, source));
            }
        }
        out.push(sym);
    }
}

/// Collect `var`/`const` specs, including grouped `( ... )` forms.
fn extract_value_specs(node: Node, source: &str, file_path: &str, kind: SymbolKind, out: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "var_spec" | "const_spec" => {
                let type_text = child
                    .child_by_field_name("type")
                    .map(|t| render_type(t, source))
                    .unwrap_or_default();
                let mut name_cursor = child.walk();
                for name_node in child.children_by_field_name("name", &mut name_cursor) {
                    let name = node_text(name_node, source);
                    if name == "_" {
                        continue;
                    }
                    let line = line_of(name_node.start_position());
                    let mut sym = Symbol::new(name, kind, file_path, line);
                    sym.exported = is_exported(name);
                    sym.return_type.clone_from(&type_text);
                    out.push(sym);
                }
            }
            "var_spec_list" | "const_spec_list" => extract_value_specs(child, source, file_path, kind, out),
            _ => {}
        }
    }
}

/// Flatten a parameter list into `"name type"` entries, one per name; unnamed
/// parameters contribute just their type.
fn render_parameters(list: Node, source: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        let Some((names, type_text)) = parameter_parts(decl, source) else {
            continue;
        };
        if names.is_empty() {
            params.push(type_text);
        } else {
            params.extend(names.into_iter().map(|name| format!("{name} {type_text}")));
        }
    }
    params
}

/// Result types, one entry per returned value.
fn render_results(result: Node, source: &str) -> Vec<String> {
    if result.kind() != "parameter_list" {
        return vec![render_type(result, source)];
    }
    let mut returns = Vec::new();
    let mut cursor = result.walk();
    for decl in result.named_children(&mut cursor) {
        let Some((names, type_text)) = parameter_parts(decl, source) else {
            continue;
        };
        let count = names.len().max(1);
        returns.extend(std::iter::repeat_n(type_text, count));
    }
    returns
}

fn first_parameter(list: Node, source: &str) -> Option<(Vec<String>, String)> {
    let mut cursor = list.walk();
    let first = list
        .named_children(&mut cursor)
        .find(|n| matches!(n.kind(), "parameter_declaration" | "variadic_parameter_declaration"))?;
    parameter_parts(first, source)
}

/// Names and rendered type of one parameter declaration.
fn parameter_parts(decl: Node, source: &str) -> Option<(Vec<String>, String)> {
    let type_node = decl.child_by_field_name("type")?;
    let mut type_text = render_type(type_node, source);
    match decl.kind() {
        "parameter_declaration" => {}
        "variadic_parameter_declaration" => type_text = format!("...{type_text}"),
        _ => return None,
    }
    let mut cursor = decl.walk();
    let names = decl
        .children_by_field_name("name", &mut cursor)
        .map(|n| node_text(n, source).to_owned())
        .collect();
    Some((names, type_text))
}

/// Render a type expression canonically.
fn render_type(node: Node, source: &str) -> String {
    let field = |name: &str| node.child_by_field_name(name).map(|n| render_type(n, source));
    let rendered = match node.kind() {
        "type_identifier" | "identifier" | "package_identifier" | "field_identifier" => {
            Some(node_text(node, source).to_owned())
        }
        "pointer_type" => node.named_child(0).map(|inner| format!("*{}", render_type(inner, source))),
        "qualified_type" => match (
            find_child_text(node, "package", source),
            find_child_text(node, "name", source),
        ) {
            (Some(pkg), Some(name)) => Some(format!("{pkg}.{name}")),
            _ => None,
        },
        "slice_type" => field("element").map(|elem| format!("[]{elem}")),
        "array_type" => match (node.child_by_field_name("length"), field("element")) {
            (Some(len), Some(elem)) => Some(format!("[{}]{elem}", collapse_whitespace(node_text(len, source)))),
            _ => None,
        },
        "map_type" => match (field("key"), field("value")) {
            (Some(key), Some(value)) => Some(format!("map[{key}]{value}")),
            _ => None,
        },
        "generic_type" => {
            let base = field("type");
            let args = node.child_by_field_name("type_arguments").map(|args| {
                let mut cursor = args.walk();
                args.named_children(&mut cursor)
                    .map(|arg| render_type(arg, source))
                    .collect::<Vec<_>>()
                    .join(", ")
            });
            match (base, args) {
                (Some(base), Some(args)) => Some(format!("{base}[{args}]")),
                _ => None,
            }
        }
        "function_type" => {
            let params = node
                .child_by_field_name("parameters")
                .map(|p| render_parameters(p, source))
                .unwrap_or_default();
            let returns = node
                .child_by_field_name("result")
                .map(|r| render_results(r, source))
                .unwrap_or_default();
            let mut text = format!("func({})", params.join(", "));
            match returns.len() {
                0 => {}
                1 => text.push_str(&format!(" {}", returns[0])),
                _ => text.push_str(&format!(" ({})", returns.join(", "))),
            }
            Some(text)
        }
        "interface_type" if node.named_child_count() == 0 => Some("interface{}".to_owned()),
        "struct_type" if is_empty_struct(node) => Some("struct{}".to_owned()),
        "parenthesized_type" => node.named_child(0).map(|inner| render_type(inner, source)),
        "type_elem" if node.named_child_count() == 1 => node.named_child(0).map(|inner| render_type(inner, source)),
        _ => None,
    };
    rendered.unwrap_or_else(|| collapse_whitespace(node_text(node, source)))
}

fn is_empty_struct(node: Node) -> bool {
    let mut cursor = node.walk();
    let empty = node
        .named_children(&mut cursor)
        .all(|field_list| field_list.named_child_count() == 0);
    empty
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn line_of(point: Point) -> u32 {
    point.row as u32 + 1
}

/// Get the text content of a node.
fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Find a named child field and return its text.
fn find_child_text(node: Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| node_text(n, source).to_owned())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<Symbol> {
        GoExtractor.extract(source, "main.go").unwrap()
    }

    fn find<'a>(symbols: &'a [Symbol], name: &str) -> &'a Symbol {
        symbols.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_extract_go_symbols() {
        let source = r#"package main

import "fmt"

// User represents a user in the system
type User struct {
	ID   int
	Name string
}

// NewUser creates a new user
func NewUser(id int, name string) *User {
	return &User{ID: id, Name: name}
}

func (u *User) GetName() string {
	return u.Name
}

func (u *User) SetName(name string) {
	u.Name = name
}

var GlobalConfig = map[string]string{}

const MaxUsers = 100
"#;
        let symbols = extract(source);

        let user = find(&symbols, "User");
        assert_eq!(user.kind, SymbolKind::Struct);
        assert!(user.exported);
        assert_eq!(user.start_line, 6);
        assert_eq!(user.end_line, 9);

        let new_user = find(&symbols, "NewUser");
        assert_eq!(new_user.kind, SymbolKind::Function);
        assert_eq!(new_user.parameters, vec!["id int", "name string"]);
        assert_eq!(new_user.return_type, "*User");
        assert_eq!(new_user.signature, "func NewUser(id int, name string) *User");

        let get_name = find(&symbols, "GetName");
        assert_eq!(get_name.kind, SymbolKind::Method);
        assert_eq!(get_name.parent, "User");
        assert_eq!(get_name.signature, "func (u *User) GetName() string");

        assert_eq!(find(&symbols, "GlobalConfig").kind, SymbolKind::Variable);
        assert_eq!(find(&symbols, "MaxUsers").kind, SymbolKind::Constant);
        assert!(!symbols.iter().any(|s| s.name == "fmt"));
    }

    #[test]
    fn test_invalid_source_fails() {
        let err = GoExtractor
            .extract("package main\n\nfunc Broken( {\n", "broken.go")
            .unwrap_err();
        match err {
            AnalysisError::Parse { file, line, .. } => {
                assert_eq!(file, "broken.go");
                assert!(line >= 3);
            }
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_package_clause_is_required() {
        let err = GoExtractor.extract("func Run() {}\n", "run.go").unwrap_err();
        match err {
            AnalysisError::Parse { line, column, message, .. } => {
                assert_eq!((line, column), (1, 1));
                assert_eq!(message, "expected 'package' clause");
            }
            other => panic!("Wrong variant: {other:?}"),
        }

        let commented = "// Package run does things.\npackage run\n\nfunc Run() {}\n";
        assert_eq!(GoExtractor.extract(commented, "run.go").unwrap().len(), 1);
        assert!(GoExtractor.extract("", "empty.go").unwrap_err().is_parse_failure());
    }

    #[test]
    fn test_signature_ignores_formatting() {
        let tight = extract("package p\n\nfunc Sum(a int,b int)(int,error){\n\treturn a+b, nil\n}\n");
        let loose = extract("package p\n\nfunc Sum(a  int, b   int) (int, error) {\n\treturn a + b, nil\n}\n");
        assert_eq!(tight[0].signature, loose[0].signature);
        assert_eq!(tight[0].signature, "func Sum(a int, b int) (int, error)");
        assert_eq!(tight[0].return_type, "int, error");
    }

    #[test]
    fn test_grouped_parameters_and_results() {
        let symbols = extract("package p\n\nfunc Split(a, b string) (head, tail string) {\n\treturn a, b\n}\n");
        let split = &symbols[0];
        assert_eq!(split.parameters, vec!["a string", "b string"]);
        assert_eq!(split.return_type, "string, string");
    }

    #[test]
    fn test_composite_types() {
        let source = "package p\n\nfunc Load(ctx context.Context, ids []int, opts map[string]*Opt, ch chan int, fn func(int) error, rest ...string) {}\n";
        let symbols = extract(source);
        assert_eq!(
            symbols[0].parameters,
            vec![
                "ctx context.Context",
                "ids []int",
                "opts map[string]*Opt",
                "ch chan int",
                "fn func(int) error",
                "rest ...string",
            ]
        );
    }

    #[test]
    fn test_generic_receiver_parent() {
        let source = "package p\n\ntype List[T any] struct {\n\titems []T\n}\n\nfunc (l *List[T]) Len() int {\n\treturn len(l.items)\n}\n";
        let symbols = extract(source);
        let len = find(&symbols, "Len");
        assert_eq!(len.kind, SymbolKind::Method);
        assert_eq!(len.parent, "List");
    }

    #[test]
    fn test_grouped_var_and_const() {
        let source = "package p\n\nconst (\n\tA = 1\n\tb = 2\n)\n\nvar (\n\tX, y int\n\t_ = 3\n)\n";
        let symbols = extract(source);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b", "X", "y"]);
        assert!(find(&symbols, "A").exported);
        assert!(!find(&symbols, "b").exported);
        assert_eq!(find(&symbols, "X").kind, SymbolKind::Variable);
        assert_eq!(find(&symbols, "X").return_type, "int");
        assert_eq!(find(&symbols, "X").start_line, 9);
    }

    #[test]
    fn test_interface_and_alias() {
        let source = "package p\n\ntype Store interface {\n\tGet(id int) error\n}\n\ntype ID = int64\n\ntype Handler func(int) error\n";
        let symbols = extract(source);
        assert_eq!(find(&symbols, "Store").kind, SymbolKind::Interface);
        assert_eq!(find(&symbols, "ID").kind, SymbolKind::Type);
        assert_eq!(find(&symbols, "ID").signature, "type ID = int64");
        assert_eq!(find(&symbols, "Handler").signature, "type Handler func(int) error");
    }

    #[test]
    fn test_only_top_level_declarations() {
        let source = "package p\n\nfunc Run() {\n\tconst local = 1\n\tvar tmp int\n\t_ = tmp\n}\n";
        let symbols = extract(source);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "Run");
    }

    #[test]
    fn test_export_detection() {
        let source = "package main\n\nfunc PublicFunc() {}\n\nfunc privateFunc() {}\n\ntype PublicType struct {}\n\ntype privateType struct {}\n";
        for sym in extract(source) {
            let upper = sym.name.chars().next().is_some_and(char::is_uppercase);
            assert_eq!(sym.exported, upper, "{}", sym.name);
        }
    }

    #[test]
    fn test_line_numbers() {
        let source = "package main\n\nfunc First() {}\n\nfunc Second() {\n\t// multi-line\n\t// function\n}\n\nfunc Third() {}\n";
        let symbols = extract(source);
        let second = find(&symbols, "Second");
        assert_eq!(second.start_line, 5);
        assert_eq!(second.end_line, 8);
    }
}
