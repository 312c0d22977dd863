//! Python declarations. Blocks are delimited by indentation, and names with a
//! leading underscore are private.

use super::{enclosing, header_signature, sort_by_position, split_params, SourceText, Syntax};
use crate::error::Result;
use crate::symbols::extractor::LanguageExtractor;
use crate::symbols::{Language, Symbol, SymbolKind};
use regex::Regex;
use std::sync::LazyLock;

static CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^class\s+(\w+)\s*(?:\(([^)]*)\))?\s*:").unwrap());

/// `def` at any indentation; top-level versus method is decided afterwards.
static DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)(?:\s*->\s*([^:\n]+?))?\s*:").unwrap()
});

static CONSTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Z][A-Z0-9_]*)[ \t]*(?::[ \t]*([^=\n]+?))?[ \t]*=[^=]").unwrap()
});

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let text = SourceText::new(source, Syntax::PYTHON);
        let mut symbols = Vec::new();

        let mut classes = Vec::new();
        for caps in CLASS.captures_iter(source) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let mut sym = Symbol::new(&caps[1], SymbolKind::Class, file_path, text.line_at(start));
            sym.exported = is_public(&sym.name);
            sym.end_line = text.indent_block_end(sym.start_line);
            sym.signature = header_signature(&caps[0]);
            classes.push(sym);
        }

        for caps in DEF.captures_iter(source) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let line = text.line_at(start);
            let indent = caps.get(1).map_or(0, |m| m.as_str().len());
            let name = &caps[2];

            let mut sym = if indent == 0 {
                let mut sym = Symbol::new(name, SymbolKind::Function, file_path, line);
                sym.exported = is_public(name);
                sym
            } else {
                // Only direct members of a top-level class count; nested
                // functions and methods of nested classes are skipped.
                let Some(class) = enclosing(&classes, line) else {
                    continue;
                };
                if text.body_indent(class.start_line, class.end_line) != Some(indent) {
                    continue;
                }
                let mut sym = Symbol::new(name, SymbolKind::Method, file_path, line);
                sym.exported = class.exported && (is_public(name) || is_dunder(name));
                sym.parent.clone_from(&class.name);
                sym
            };

            sym.end_line = text.indent_block_end(line);
            sym.parameters = caps
                .get(3)
                .map(|p| split_params(p.as_str()))
                .unwrap_or_default()
                .into_iter()
                .filter(|p| !is_receiver(p))
                .collect();
            sym.return_type = caps.get(4).map(|r| r.as_str().trim().to_owned()).unwrap_or_default();
            sym.signature = header_signature(caps[0].trim_start());
            symbols.push(sym);
        }

        for caps in CONSTANT.captures_iter(source) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let mut sym = Symbol::new(&caps[1], SymbolKind::Constant, file_path, text.line_at(start));
            sym.exported = is_public(&sym.name);
            sym.return_type = caps.get(2).map(|t| t.as_str().trim().to_owned()).unwrap_or_default();
            symbols.push(sym);
        }

        symbols.extend(classes);
        sort_by_position(&mut symbols);
        Ok(symbols)
    }
}

fn is_public(name: &str) -> bool {
    !name.starts_with('_')
}

fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// `self` / `cls`, with or without an annotation.
fn is_receiver(param: &str) -> bool {
    let name = param.split(':').next().unwrap_or(param).trim();
    name == "self" || name == "cls"
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_PY: &str = r#"class User:
    """A user in the system."""

    def __init__(self, id: int, name: str):
        self.id = id
        self.name = name

    def get_name(self) -> str:
        return self.name

    def _touch(self):
        def inner():
            pass
        inner()


def create_user(id: int, name: str) -> User:
    """Create a new user."""
    return User(id, name)


async def fetch_user(id: int) -> Optional[User]:
    pass


def _helper():
    pass


MAX_USERS = 100
DEFAULT_NAME: str = "guest"
"#;

    fn extract(source: &str) -> Vec<Symbol> {
        PythonExtractor.extract(source, "user.py").unwrap()
    }

    fn find<'a>(symbols: &'a [Symbol], name: &str) -> &'a Symbol {
        symbols.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn test_extract_python_symbols() {
        let symbols = extract(USER_PY);

        let user = find(&symbols, "User");
        assert_eq!(user.kind, SymbolKind::Class);
        assert!(user.exported);
        assert_eq!((user.start_line, user.end_line), (1, 14));

        let create = find(&symbols, "create_user");
        assert_eq!(create.kind, SymbolKind::Function);
        assert_eq!(create.parameters, vec!["id: int", "name: str"]);
        assert_eq!(create.return_type, "User");
        assert_eq!(create.end_line, 19);
        assert_eq!(create.signature, "def create_user(id: int, name: str) -> User");

        let fetch = find(&symbols, "fetch_user");
        assert_eq!(fetch.kind, SymbolKind::Function);
        assert_eq!(fetch.return_type, "Optional[User]");

        assert!(!find(&symbols, "_helper").exported);

        let max = find(&symbols, "MAX_USERS");
        assert_eq!(max.kind, SymbolKind::Constant);
        assert!(max.exported);
        assert_eq!(find(&symbols, "DEFAULT_NAME").return_type, "str");
    }

    #[test]
    fn test_methods_drop_receiver() {
        let symbols = extract(USER_PY);

        let init = find(&symbols, "__init__");
        assert_eq!(init.kind, SymbolKind::Method);
        assert_eq!(init.parent, "User");
        assert!(init.exported);
        assert_eq!(init.parameters, vec!["id: int", "name: str"]);
        assert_eq!((init.start_line, init.end_line), (4, 6));

        let get_name = find(&symbols, "get_name");
        assert!(get_name.parameters.is_empty());
        assert_eq!(get_name.return_type, "str");

        assert!(!find(&symbols, "_touch").exported);
        assert!(!symbols.iter().any(|s| s.name == "inner"));
    }

    #[test]
    fn test_classmethod_receiver() {
        let source = "class Repo:\n    @classmethod\n    def load(cls, path):\n        pass\n";
        let symbols = extract(source);
        let load = find(&symbols, "load");
        assert_eq!(load.parameters, vec!["path"]);
        assert_eq!(load.parent, "Repo");
        assert_eq!(load.start_line, 3);
    }

    #[test]
    fn test_comparison_is_not_constant() {
        let symbols = extract("DEBUG == other\nDEBUG = False\n");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].start_line, 2);
    }

    #[test]
    fn test_malformed_input_never_fails() {
        let symbols = extract("def (:\nclass\n    def broken(self\n");
        assert!(symbols.is_empty());
    }
}
