//! TypeScript and JavaScript declarations.
//!
//! JavaScript is handled by the same patterns: type annotations are optional
//! everywhere, and the TypeScript-only forms simply never match.

use super::{enclosing, header_signature, sort_by_position, split_params, SourceText, Syntax};
use crate::error::Result;
use crate::symbols::extractor::LanguageExtractor;
use crate::symbols::{Language, Symbol, SymbolKind};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

static CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+(\w+)[^{\n]*").unwrap()
});

static INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(export\s+)?(?:declare\s+)?interface\s+(\w+)[^{\n]*").unwrap()
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(export\s+)?(?:default\s+)?(?:declare\s+)?(?:async\s+)?function\s*\*?\s*(\w+)\s*(?:<.*?>)?\s*\(([^)]*)\)(?:[ \t]*:[ \t]*([^{;\n]+))?",
    )
    .unwrap()
});

static ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(export\s+)?const\s+(\w+)\s*(?::[^=\n]+)?=\s*(?:async\s+)?(?:\(([^)]*)\)|(\w+))(?:[ \t]*:[ \t]*([^=\n]+?))?\s*=>",
    )
    .unwrap()
});

static TYPE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(export\s+)?(?:declare\s+)?type\s+(\w+)\s*(?:<.*?>)?\s*=").unwrap()
});

static ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(export\s+)?(?:declare\s+)?(?:const\s+)?enum\s+(\w+)").unwrap()
});

static CONST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(export\s+)?(?:declare\s+)?const\s+(\w+)\s*(?::[ \t]*([^=\n]+?))?\s*=").unwrap()
});

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(export\s+)?(?:let|var)\s+(\w+)\s*(?::[ \t]*([^=;\n]+?))?\s*[=;]").unwrap()
});

/// Class and interface members: methods, constructors, accessors and
/// abstract or interface signatures.
static MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]+((?:(?:public|private|protected|static|readonly|async|abstract|override|get|set)\s+)*)(#?\w+)\??\s*(?:<.*?>)?\s*\(([^)]*)\)(?:[ \t]*:[ \t]*([^{;\n]+?))?\s*[{;]",
    )
    .unwrap()
});

/// Statement keywords that look like calls at the start of a line.
const NOT_MEMBERS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "new", "typeof", "await", "super",
];

pub struct TypeScriptExtractor {
    language: Language,
}

impl TypeScriptExtractor {
    pub const TYPESCRIPT: Self = Self {
        language: Language::TypeScript,
    };
    pub const JAVASCRIPT: Self = Self {
        language: Language::JavaScript,
    };
}

impl LanguageExtractor for TypeScriptExtractor {
    fn language(&self) -> Language {
        self.language
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let text = SourceText::new(source, Syntax::SCRIPT);
        let mut symbols = Vec::new();

        // Classes and interfaces double as member containers.
        let mut containers = Vec::new();
        for (pattern, kind) in [(&*CLASS, SymbolKind::Class), (&*INTERFACE, SymbolKind::Interface)] {
            for caps in pattern.captures_iter(source) {
                let mut sym = declaration(&caps, kind, &text, file_path);
                sym.end_line = text.block_end(sym.start_line);
                sym.signature = header_signature(&caps[0]);
                containers.push(sym);
            }
        }

        for caps in FUNCTION.captures_iter(source) {
            let mut sym = declaration(&caps, SymbolKind::Function, &text, file_path);
            sym.end_line = text.block_end(sym.start_line);
            sym.parameters = caps.get(3).map(|p| split_params(p.as_str())).unwrap_or_default();
            sym.return_type = trimmed(caps.get(4));
            sym.signature = header_signature(&caps[0]);
            symbols.push(sym);
        }

        let mut arrow_names = HashSet::new();
        for caps in ARROW.captures_iter(source) {
            let mut sym = declaration(&caps, SymbolKind::Function, &text, file_path);
            sym.end_line = text.block_end(sym.start_line);
            sym.parameters = match (caps.get(3), caps.get(4)) {
                (Some(list), _) => split_params(list.as_str()),
                (None, Some(single)) => vec![single.as_str().to_owned()],
                (None, None) => Vec::new(),
            };
            sym.return_type = trimmed(caps.get(5));
            sym.signature = header_signature(caps[0].trim_end_matches("=>"));
            arrow_names.insert(sym.name.clone());
            symbols.push(sym);
        }

        for (pattern, kind) in [(&*TYPE_ALIAS, SymbolKind::Type), (&*ENUM, SymbolKind::Type)] {
            for caps in pattern.captures_iter(source) {
                let mut sym = declaration(&caps, kind, &text, file_path);
                sym.end_line = text.block_end(sym.start_line);
                symbols.push(sym);
            }
        }

        for (pattern, kind) in [(&*CONST, SymbolKind::Constant), (&*VARIABLE, SymbolKind::Variable)] {
            for caps in pattern.captures_iter(source) {
                if arrow_names.contains(&caps[2]) {
                    continue;
                }
                let mut sym = declaration(&caps, kind, &text, file_path);
                sym.return_type = trimmed(caps.get(3));
                symbols.push(sym);
            }
        }

        for caps in MEMBER.captures_iter(source) {
            let name = &caps[2];
            if NOT_MEMBERS.contains(&name) {
                continue;
            }
            let line = text.line_at(caps.get(0).map_or(0, |m| m.start()));
            let Some(container) = enclosing(&containers, line) else {
                continue;
            };
            if text.depth_at(line) != text.depth_at(container.start_line) + 1 {
                continue;
            }
            let modifiers = caps.get(1).map_or("", |m| m.as_str());
            let mut sym = Symbol::new(name, SymbolKind::Method, file_path, line);
            sym.end_line = text.block_end(line);
            sym.exported =
                container.exported && !modifiers.contains("private") && !name.starts_with('#');
            sym.parent.clone_from(&container.name);
            sym.parameters = caps.get(3).map(|p| split_params(p.as_str())).unwrap_or_default();
            sym.return_type = trimmed(caps.get(4));
            sym.signature = header_signature(&caps[0]);
            symbols.push(sym);
        }

        symbols.extend(containers);
        sort_by_position(&mut symbols);
        Ok(symbols)
    }
}

/// A top-level declaration whose pattern captures `export` in group 1 and
/// the name in group 2.
fn declaration(caps: &Captures, kind: SymbolKind, text: &SourceText, file_path: &str) -> Symbol {
    let start = caps.get(0).map_or(0, |m| m.start());
    let mut sym = Symbol::new(&caps[2], kind, file_path, text.line_at(start));
    sym.exported = caps.get(1).is_some();
    sym
}

fn trimmed(capture: Option<regex::Match>) -> String {
    capture.map(|m| m.as_str().trim().to_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<Symbol> {
        TypeScriptExtractor::TYPESCRIPT.extract(source, "user.ts").unwrap()
    }

    fn find<'a>(symbols: &'a [Symbol], name: &str) -> &'a Symbol {
        symbols.iter().find(|s| s.name == name).unwrap()
    }

    const USER_TS: &str = r"interface User {
  id: number;
  name: string;
}

export class UserService {
  private users: User[] = [];

  constructor() {}

  public async getUser(id: number): Promise<User | null> {
    return this.users.find(u => u.id === id) || null;
  }

  private addUser(user: User): void {
    this.users.push(user);
  }
}

export function createUser(id: number, name: string): User {
  return { id, name };
}

const DEFAULT_USER: User = { id: 0, name: 'guest' };
";

    #[test]
    fn test_extract_typescript_symbols() {
        let symbols = extract(USER_TS);

        let user = find(&symbols, "User");
        assert_eq!(user.kind, SymbolKind::Interface);
        assert!(!user.exported);
        assert_eq!((user.start_line, user.end_line), (1, 4));

        let service = find(&symbols, "UserService");
        assert_eq!(service.kind, SymbolKind::Class);
        assert!(service.exported);
        assert_eq!((service.start_line, service.end_line), (6, 18));

        let create = find(&symbols, "createUser");
        assert_eq!(create.kind, SymbolKind::Function);
        assert!(create.exported);
        assert_eq!(create.parameters, vec!["id: number", "name: string"]);
        assert_eq!(create.return_type, "User");
        assert_eq!(create.signature, "export function createUser(id: number, name: string): User");

        let default_user = find(&symbols, "DEFAULT_USER");
        assert_eq!(default_user.kind, SymbolKind::Constant);
        assert!(!default_user.exported);
        assert_eq!(default_user.return_type, "User");
    }

    #[test]
    fn test_class_members() {
        let symbols = extract(USER_TS);

        let get_user = find(&symbols, "getUser");
        assert_eq!(get_user.kind, SymbolKind::Method);
        assert_eq!(get_user.parent, "UserService");
        assert!(get_user.exported);
        assert_eq!(get_user.return_type, "Promise<User | null>");
        assert_eq!(get_user.start_line, 11);
        assert_eq!(get_user.end_line, 13);

        let add_user = find(&symbols, "addUser");
        assert!(!add_user.exported);

        assert_eq!(find(&symbols, "constructor").parent, "UserService");
        // Calls inside method bodies are not members.
        assert!(!symbols.iter().any(|s| s.name == "find" || s.name == "push"));
    }

    #[test]
    fn test_arrow_functions_not_duplicated_as_constants() {
        let source = "export const add = (a: number, b: number): number => a + b;\nexport const double = async x => x * 2;\nconst LIMIT = 5;\n";
        let symbols = extract(source);
        assert_eq!(symbols.len(), 3);

        let add = find(&symbols, "add");
        assert_eq!(add.kind, SymbolKind::Function);
        assert_eq!(add.parameters, vec!["a: number", "b: number"]);
        assert_eq!(add.return_type, "number");

        assert_eq!(find(&symbols, "double").parameters, vec!["x"]);
        assert_eq!(find(&symbols, "LIMIT").kind, SymbolKind::Constant);
    }

    #[test]
    fn test_type_alias_and_enum() {
        let source = "export type Id = string | number;\nexport enum Color {\n  Red,\n  Blue,\n}\ntype Local<T> = T[];\n";
        let symbols = extract(source);
        assert_eq!(find(&symbols, "Id").kind, SymbolKind::Type);
        assert!(find(&symbols, "Id").exported);
        let color = find(&symbols, "Color");
        assert_eq!(color.kind, SymbolKind::Type);
        assert_eq!(color.end_line, 5);
        assert!(!find(&symbols, "Local").exported);
    }

    #[test]
    fn test_javascript_uses_same_patterns() {
        let source = "export function greet(name) {\n  return `hi ${name}`;\n}\n\nexport class Greeter {\n  greet(name) {\n    return name;\n  }\n}\n";
        let symbols = TypeScriptExtractor::JAVASCRIPT.extract(source, "greet.js").unwrap();
        let greet = symbols
            .iter()
            .find(|s| s.name == "greet" && s.kind == SymbolKind::Function)
            .unwrap();
        assert_eq!(greet.parameters, vec!["name"]);
        assert_eq!(greet.end_line, 3);
        let method = symbols
            .iter()
            .find(|s| s.name == "greet" && s.kind == SymbolKind::Method)
            .unwrap();
        assert_eq!(method.parent, "Greeter");
        assert!(method.exported);
    }

    #[test]
    fn test_symbols_in_source_order() {
        let symbols = extract(USER_TS);
        let lines: Vec<u32> = symbols.iter().map(|s| s.start_line).collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
    }

    #[test]
    fn test_malformed_input_never_fails() {
        let symbols = extract("export class {{{ function (\n const = ;");
        assert!(symbols.iter().all(|s| !s.name.is_empty()));
    }
}
