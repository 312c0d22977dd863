//! Symbol extraction from source files.
//!
//! Go is parsed with tree-sitter; TypeScript/JavaScript, Python, Rust and
//! Java are handled by line-anchored regex heuristics. Every language sits
//! behind the [`extractor::LanguageExtractor`] trait so a heuristic can be
//! replaced by a real parser without touching the detector or the analyzer.

pub mod diff;
pub mod extractor;
#[cfg(feature = "lang-go")]
pub mod go;
pub mod heuristic;

pub use extractor::{
    extract_previous_symbols, extract_symbols, extractor_for, language_name, LanguageExtractor,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of symbol extracted from source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Variable,
    Constant,
    Type,
    Import,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Type => "type",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed declaration found in source text.
///
/// Symbols are produced by one extraction call and never mutated afterwards;
/// comparisons always work on two independently extracted lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based.
    pub start_line: u32,
    /// 1-based, never before `start_line`.
    pub end_line: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_type: String,
    /// Receiver or owning type; only set for methods.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    pub file_path: String,
}

impl Symbol {
    /// A symbol spanning a single line with no signature details.
    pub fn new(name: impl Into<String>, kind: SymbolKind, file_path: &str, line: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            start_line: line,
            end_line: line,
            signature: String::new(),
            exported: false,
            parameters: Vec::new(),
            return_type: String::new(),
            parent: String::new(),
            file_path: file_path.to_owned(),
        }
    }

    /// Identity used to match this declaration across two revisions.
    pub fn key(&self) -> SymbolKey {
        let overloads = Language::from_path(&self.file_path).is_some_and(Language::supports_overloading);
        SymbolKey {
            name: self.name.clone(),
            kind: self.kind,
            parent: self.parent.clone(),
            arity: (overloads && matches!(self.kind, SymbolKind::Function | SymbolKind::Method))
                .then_some(self.parameters.len()),
        }
    }

    /// Whether `line` falls inside this symbol's span.
    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// `(name, kind, parent)` plus the parameter count for languages that allow
/// overloading. Overloads with equal arity still collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolKey {
    pub name: String,
    pub kind: SymbolKind,
    pub parent: String,
    pub arity: Option<usize>,
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.kind, self.parent)?;
        if let Some(arity) = self.arity {
            write!(f, "/{arity}")?;
        }
        Ok(())
    }
}

/// A supported source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    TypeScript,
    JavaScript,
    Python,
    Rust,
    Java,
}

impl Language {
    /// Detect the language from a file extension.
    pub fn from_path(file_path: &str) -> Option<Language> {
        let file_name = file_path.rsplit(['/', '\\']).next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_lowercase().as_str() {
            "go" => Some(Self::Go),
            "ts" | "tsx" => Some(Self::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "py" | "pyi" => Some(Self::Python),
            "rs" => Some(Self::Rust),
            "java" => Some(Self::Java),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Java => "java",
        }
    }

    /// Languages where two callables may share a name and owner.
    pub fn supports_overloading(self) -> bool {
        matches!(self, Self::Java)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
