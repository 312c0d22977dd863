//! Rust items. Only plain `pub` counts as exported; `pub(crate)` and friends
//! stay inside the crate and are treated as private.

use super::{enclosing, header_signature, sort_by_position, split_params, SourceText, Syntax};
use crate::error::Result;
use crate::symbols::extractor::LanguageExtractor;
use crate::symbols::{Language, Symbol, SymbolKind};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static STRUCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(pub(?:\([^)]*\))?\s+)?struct\s+(\w+)[^{;(\n]*").unwrap()
});

static ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(pub(?:\([^)]*\))?\s+)?enum\s+(\w+)[^{\n]*").unwrap()
});

static TRAIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?trait\s+(\w+)[^{;\n]*").unwrap()
});

static TYPE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(pub(?:\([^)]*\))?\s+)?type\s+(\w+)[^;\n]*").unwrap()
});

static CONST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(pub(?:\([^)]*\))?\s+)?(const|static)\s+(?:mut\s+)?(\w+)\s*:\s*([^=;]+?)\s*[=;]").unwrap()
});

static IMPL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:unsafe\s+)?impl\b([^{;]*)\{").unwrap());

/// `fn` at any indentation; free function versus method is decided by the
/// enclosing `impl` or `trait` block.
static FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)(pub(?:\([^)]*\))?\s+)?(?:default\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+"[^"]*"\s+)?fn\s+(\w+)\s*(?:<.*?>)?\s*\(((?:[^()]|\([^()]*\))*)\)(?:\s*->\s*([^{;]+?))?\s*(?:where\b[^{;]*)?[{;]"#,
    )
    .unwrap()
});

pub struct RustExtractor;

impl LanguageExtractor for RustExtractor {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let text = SourceText::new(source, Syntax::RUST);
        let mut symbols = Vec::new();

        for (pattern, kind) in [
            (&*STRUCT, SymbolKind::Struct),
            (&*ENUM, SymbolKind::Type),
            (&*TRAIT, SymbolKind::Interface),
            (&*TYPE_ALIAS, SymbolKind::Type),
        ] {
            for caps in pattern.captures_iter(source) {
                let mut sym = item(&caps, 2, kind, &text, file_path);
                sym.end_line = text.block_end(sym.start_line);
                sym.signature = header_signature(&caps[0]);
                symbols.push(sym);
            }
        }

        for caps in CONST.captures_iter(source) {
            let kind = if &caps[2] == "const" {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };
            let mut sym = item(&caps, 3, kind, &text, file_path);
            sym.return_type = super::collapse_whitespace(&caps[4]);
            symbols.push(sym);
        }

        // Method scopes: traits as declared, plus one pseudo-scope per impl
        // block named after the implementing type. A scope's `exported` flag
        // says whether its members are public without their own `pub`.
        let mut scopes: Vec<Symbol> = symbols
            .iter()
            .filter(|sym| sym.kind == SymbolKind::Interface)
            .cloned()
            .collect();
        for caps in IMPL.captures_iter(source) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let Some((target, is_trait_impl)) = impl_target(&caps[1]) else {
                continue;
            };
            let mut scope = Symbol::new(target, SymbolKind::Class, file_path, text.line_at(start));
            scope.end_line = text.block_end(scope.start_line);
            scope.exported = is_trait_impl;
            scopes.push(scope);
        }

        for caps in FN.captures_iter(source) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let line = text.line_at(start);
            let indent = caps.get(1).map_or(0, |m| m.as_str().len());
            let has_pub = caps.get(2).is_some_and(|m| m.as_str().trim() == "pub");
            let name = &caps[3];

            let mut sym = if indent == 0 && text.depth_at(line) == 0 {
                let mut sym = Symbol::new(name, SymbolKind::Function, file_path, line);
                sym.exported = has_pub;
                sym
            } else {
                let Some(scope) = enclosing(&scopes, line) else {
                    continue;
                };
                if text.depth_at(line) != text.depth_at(scope.start_line) + 1 {
                    continue;
                }
                let mut sym = Symbol::new(name, SymbolKind::Method, file_path, line);
                sym.exported = scope.exported || has_pub;
                sym.parent.clone_from(&scope.name);
                sym
            };

            sym.end_line = text.block_end(line);
            sym.parameters = split_params(&caps[4])
                .into_iter()
                .filter(|p| !is_receiver(p))
                .collect();
            sym.return_type = caps
                .get(5)
                .map(|r| super::collapse_whitespace(r.as_str()))
                .unwrap_or_default();
            sym.signature = header_signature(caps[0].trim_start());
            symbols.push(sym);
        }

        sort_by_position(&mut symbols);
        Ok(symbols)
    }
}

fn item(caps: &Captures, name_group: usize, kind: SymbolKind, text: &SourceText, file_path: &str) -> Symbol {
    let start = caps.get(0).map_or(0, |m| m.start());
    let mut sym = Symbol::new(&caps[name_group], kind, file_path, text.line_at(start));
    sym.exported = caps.get(1).is_some_and(|m| m.as_str().trim() == "pub");
    sym
}

/// The implementing type of an `impl` header (everything between `impl` and
/// `{`), and whether it implements a trait.
///
/// `<T> Display for Wrapper<T>` -> `("Wrapper", true)`.
fn impl_target(header: &str) -> Option<(String, bool)> {
    let mut rest = header.trim();
    if rest.starts_with('<') {
        rest = skip_generics(rest)?.trim_start();
    }
    if let Some(idx) = rest.find("where") {
        let before = &rest[..idx];
        if before.ends_with(char::is_whitespace) {
            rest = before;
        }
    }

    let (type_part, is_trait_impl) = match rest.split_once(" for ") {
        Some((_, ty)) => (ty, true),
        None => (rest, false),
    };

    let mut ty = type_part.trim().trim_start_matches('&').trim_start();
    if ty.starts_with('\'') {
        ty = ty.split_once(char::is_whitespace).map_or("", |(_, r)| r).trim_start();
    }
    for prefix in ["mut ", "dyn "] {
        ty = ty.strip_prefix(prefix).unwrap_or(ty).trim_start();
    }
    let path = ty.split('<').next().unwrap_or(ty);
    let name = path.rsplit("::").next().unwrap_or(path).trim();
    (!name.is_empty()).then(|| (name.to_owned(), is_trait_impl))
}

/// Skip a leading balanced `<...>`.
fn skip_generics(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[idx + 1..]);
                }
            }
            _ => {}
        }
    }
    None
}

/// `self`, `&self`, `&'a mut self`, `self: Box<Self>` and similar.
fn is_receiver(param: &str) -> bool {
    let mut rest = param.trim_start_matches('&').trim_start();
    if rest.starts_with('\'') {
        rest = rest.split_once(' ').map_or("", |(_, r)| r).trim_start();
    }
    let rest = rest.strip_prefix("mut ").unwrap_or(rest).trim_start();
    rest == "self" || rest.starts_with("self:") || rest.starts_with("self ")
}
