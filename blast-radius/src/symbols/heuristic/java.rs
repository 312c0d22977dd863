//! Java declarations. Types and members are public only with an explicit
//! `public`, except interface members, which are public unless `private`.

use super::{collapse_whitespace, enclosing, header_signature, sort_by_position, split_params, SourceText, Syntax};
use crate::error::Result;
use crate::symbols::extractor::LanguageExtractor;
use crate::symbols::{Language, Symbol, SymbolKind};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Leading annotations such as `@Override` or `@Deprecated(since = "2")`.
const ANNOTATIONS: &str = r"(?:@\w+(?:\([^)]*\))?\s+)*";

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*{ANNOTATIONS}((?:(?:public|protected|private|abstract|final|static|sealed|non-sealed|strictfp)\s+)*)(class|interface|enum|record|@interface)\s+(\w+)[^{{\n]*"
    ))
    .unwrap()
});

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]+{ANNOTATIONS}((?:(?:public|protected|private|static|final|abstract|synchronized|native|default|strictfp)\s+)*)(?:<[^>]*>\s+)?([\w.$]+(?:<.*?>)?(?:\[\])*)\s+(\w+)\s*\(((?:[^()]|\([^()]*\))*)\)\s*(?:throws\s+[\w.,\s]+?)?\s*[{{;]"
    ))
    .unwrap()
});

static CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]+{ANNOTATIONS}((?:(?:public|protected|private)\s+)?)(\w+)\s*\(((?:[^()]|\([^()]*\))*)\)\s*(?:throws\s+[\w.,\s]+?)?\s*\{{"
    ))
    .unwrap()
});

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]+((?:(?:public|protected|private|static|final|transient|volatile)\s+)+)([\w.$]+(?:<.*?>)?(?:\[\])*)\s+(\w+)\s*[=;]",
    )
    .unwrap()
});

/// Words the method pattern can mistake for a return type.
const NOT_TYPES: &[&str] = &[
    "public", "protected", "private", "static", "final", "abstract", "synchronized", "native", "default",
    "return", "new", "throw", "else", "case",
];

pub struct JavaExtractor;

impl LanguageExtractor for JavaExtractor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>> {
        let text = SourceText::new(source, Syntax::C_LIKE);

        let mut types = Vec::new();
        for caps in TYPE_DECL.captures_iter(source) {
            let start = caps.get(3).map_or(0, |m| m.start());
            let kind = match &caps[2] {
                "interface" | "@interface" => SymbolKind::Interface,
                "enum" => SymbolKind::Type,
                _ => SymbolKind::Class,
            };
            let mut sym = Symbol::new(&caps[3], kind, file_path, text.line_at(start));
            sym.exported = caps[1].contains("public");
            sym.end_line = text.block_end(sym.start_line);
            sym.signature = header_signature(caps[0].trim_start());
            types.push(sym);
        }

        // Member types are kept without a parent; anything else below the
        // top level (local or anonymous classes) is dropped.
        let mut symbols = Vec::with_capacity(types.len());
        for sym in &types {
            if text.depth_at(sym.start_line) == 0 {
                symbols.push(sym.clone());
                continue;
            }
            if let Some(owner) = member_owner(&types, &text, sym.start_line) {
                let mut nested = sym.clone();
                nested.exported |= owner.kind == SymbolKind::Interface && owner.exported;
                symbols.push(nested);
            }
        }

        for caps in METHOD.captures_iter(source) {
            let return_type = &caps[2];
            if NOT_TYPES.contains(&return_type) {
                continue;
            }
            let line = name_line(&text, &caps, 3);
            let Some(owner) = member_owner(&types, &text, line) else {
                continue;
            };
            let modifiers = &caps[1];
            let mut sym = Symbol::new(&caps[3], SymbolKind::Method, file_path, line);
            sym.exported = is_public_member(modifiers, owner);
            sym.parent.clone_from(&owner.name);
            sym.parameters = split_params(&caps[4]);
            sym.return_type = collapse_whitespace(return_type);
            sym.end_line = text.block_end(line);
            sym.signature = header_signature(caps[0].trim_start());
            symbols.push(sym);
        }

        for caps in CONSTRUCTOR.captures_iter(source) {
            let line = name_line(&text, &caps, 2);
            let Some(owner) = member_owner(&types, &text, line) else {
                continue;
            };
            if owner.name != caps[2] {
                continue;
            }
            let mut sym = Symbol::new(&caps[2], SymbolKind::Method, file_path, line);
            sym.exported = is_public_member(&caps[1], owner);
            sym.parent.clone_from(&owner.name);
            sym.parameters = split_params(&caps[3]);
            sym.end_line = text.block_end(line);
            sym.signature = header_signature(caps[0].trim_start());
            symbols.push(sym);
        }

        for caps in FIELD.captures_iter(source) {
            let modifiers = &caps[1];
            if !(modifiers.contains("static") && modifiers.contains("final")) {
                continue;
            }
            let line = name_line(&text, &caps, 3);
            let Some(owner) = member_owner(&types, &text, line) else {
                continue;
            };
            let mut sym = Symbol::new(&caps[3], SymbolKind::Constant, file_path, line);
            sym.exported = is_public_member(modifiers, owner);
            sym.return_type = collapse_whitespace(&caps[2]);
            symbols.push(sym);
        }

        sort_by_position(&mut symbols);
        Ok(symbols)
    }
}

/// Line of the declared name, which sits below any annotation lines.
fn name_line(text: &SourceText, caps: &Captures, group: usize) -> u32 {
    text.line_at(caps.get(group).map_or(0, |m| m.start()))
}

/// The type whose body directly contains `line`.
fn member_owner<'t>(types: &'t [Symbol], text: &SourceText, line: u32) -> Option<&'t Symbol> {
    let owner = enclosing(types, line)?;
    (text.depth_at(line) == text.depth_at(owner.start_line) + 1).then_some(owner)
}

fn is_public_member(modifiers: &str, owner: &Symbol) -> bool {
    if modifiers.contains("public") {
        return true;
    }
    owner.kind == SymbolKind::Interface && owner.exported && !modifiers.contains("private")
}
