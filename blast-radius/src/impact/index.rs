//! The session's symbol table and inverted occurrence index.
//!
//! Each indexed file contributes its symbols plus a map from every
//! identifier token to the lines it appears on. References are not stored;
//! they are resolved on demand by intersecting a symbol name with those
//! token maps, so a file indexed early still sees names declared later.

use super::Reference;
use crate::config::{AnalyzerConfig, ReindexPolicy};
use crate::symbols::Symbol;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Maximal runs of ASCII word characters, matching `\b`-delimited names.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9A-Za-z_]+").unwrap());

/// Compute a SHA-256 hex hash of file content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// One indexing of one file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    path: String,
    hash: String,
    symbols: Vec<Symbol>,
    /// Token -> ascending, distinct 1-based lines.
    occurrences: HashMap<String, Vec<u32>>,
    /// Trimmed text of every line that holds at least one token.
    lines: HashMap<u32, String>,
}

impl FileEntry {
    /// Tokenise `content`, skipping comment lines.
    pub fn scan(path: &str, content: &str, symbols: Vec<Symbol>, config: &AnalyzerConfig) -> Self {
        let mut occurrences: HashMap<String, Vec<u32>> = HashMap::new();
        let mut lines = HashMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || config.is_comment_line(trimmed) {
                continue;
            }
            let line = idx as u32 + 1;
            let mut seen = HashSet::new();
            for token in TOKEN.find_iter(raw) {
                if seen.insert(token.as_str()) {
                    occurrences.entry(token.as_str().to_owned()).or_default().push(line);
                }
            }
            if !seen.is_empty() {
                lines.insert(line, trimmed.to_owned());
            }
        }

        Self {
            path: path.to_owned(),
            hash: content_hash(content),
            symbols,
            occurrences,
            lines,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    fn token_lines(&self, token: &str) -> &[u32] {
        self.occurrences.get(token).map(Vec::as_slice).unwrap_or_default()
    }
}

/// What an insert did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// First time this path was seen.
    Added,
    /// Earlier entries for the path were dropped first.
    Replaced,
    /// Earlier entries for the path were kept alongside the new one.
    Appended,
    /// Same content as the current entry; nothing changed.
    Unchanged,
}

/// Counters describing the index, also returned when a session closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub files: usize,
    pub symbols: usize,
    pub distinct_names: usize,
    /// Token/line pairs across all files.
    pub occurrences: usize,
}

#[derive(Debug, Default)]
pub struct SymbolIndex {
    /// In indexing order. Under `Append` one path may appear several times.
    entries: Vec<FileEntry>,
    /// `(entry, symbol)` positions of every indexed definition, per name.
    by_name: HashMap<String, Vec<(usize, usize)>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current entry for `path` was built from content with this hash.
    pub fn has_content(&self, path: &str, hash: &str) -> bool {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.path == path)
            .is_some_and(|entry| entry.hash == hash)
    }

    pub fn insert(&mut self, entry: FileEntry, policy: ReindexPolicy) -> IndexOutcome {
        let previously_indexed = self.entries.iter().any(|e| e.path == entry.path);
        let outcome = match (policy, previously_indexed) {
            (_, false) => IndexOutcome::Added,
            (ReindexPolicy::Append, true) => IndexOutcome::Appended,
            (ReindexPolicy::Replace, true) => {
                if self.has_content(&entry.path, &entry.hash) {
                    return IndexOutcome::Unchanged;
                }
                self.remove(&entry.path);
                IndexOutcome::Replaced
            }
        };

        self.register(self.entries.len(), &entry);
        self.entries.push(entry);
        outcome
    }

    fn register(&mut self, position: usize, entry: &FileEntry) {
        for (slot, sym) in entry.symbols.iter().enumerate() {
            self.by_name
                .entry(sym.name.clone())
                .or_default()
                .push((position, slot));
        }
    }

    /// Drops every entry for `path`. Later entries shift down, so the name
    /// map is rebuilt.
    fn remove(&mut self, path: &str) {
        self.entries.retain(|entry| entry.path != path);
        self.by_name.clear();
        let entries = std::mem::take(&mut self.entries);
        for (position, entry) in entries.iter().enumerate() {
            self.register(position, entry);
        }
        self.entries = entries;
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Whether some indexed file declares a symbol with this name.
    pub fn is_known(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Distinct indexed paths in first-indexed order.
    pub fn indexed_files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|entry| seen.insert(entry.path.as_str()))
            .map(|entry| entry.path.clone())
            .collect()
    }

    pub fn symbols_in_file(&self, path: &str) -> Vec<Symbol> {
        self.entries
            .iter()
            .filter(|entry| entry.path == path)
            .flat_map(|entry| entry.symbols.iter().cloned())
            .collect()
    }

    /// Every indexed definition named `name`, across files.
    pub fn find_symbol(&self, name: &str) -> Vec<Symbol> {
        self.definitions(name).cloned().collect()
    }

    fn definitions<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(move |&(position, slot)| self.entries.get(position)?.symbols.get(slot))
    }

    /// Lines mentioning `name` outside its definition sites, in indexing
    /// order then line order. Unknown names have no references.
    pub fn references(&self, name: &str) -> Vec<Reference> {
        if !self.is_known(name) {
            return Vec::new();
        }
        let definition_sites: HashSet<(&str, u32)> = self
            .definitions(name)
            .map(|sym| (sym.file_path.as_str(), sym.start_line))
            .collect();

        let mut refs = Vec::new();
        for entry in &self.entries {
            for &line in entry.token_lines(name) {
                if definition_sites.contains(&(entry.path.as_str(), line)) {
                    continue;
                }
                refs.push(Reference {
                    file_path: entry.path.clone(),
                    line,
                    context: entry.lines.get(&line).cloned().unwrap_or_default(),
                });
            }
        }
        refs
    }

    /// The innermost indexed declaration in `path` spanning `line`.
    pub fn enclosing_symbol(&self, path: &str, line: u32) -> Option<&Symbol> {
        self.entries
            .iter()
            .filter(|entry| entry.path == path)
            .flat_map(|entry| &entry.symbols)
            .filter(|sym| sym.contains_line(line))
            .max_by_key(|sym| (sym.start_line, std::cmp::Reverse(sym.end_line)))
    }

    /// Other files that reference any symbol declared in `path`, sorted.
    pub fn dependents(&self, path: &str) -> Vec<String> {
        let names: HashSet<&str> = self
            .entries
            .iter()
            .filter(|entry| entry.path == path)
            .flat_map(|entry| entry.symbols.iter().map(|sym| sym.name.as_str()))
            .collect();

        let mut files: Vec<String> = names
            .into_iter()
            .flat_map(|name| self.references(name))
            .map(|reference| reference.file_path)
            .filter(|file| file != path)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        files.sort();
        files
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            files: self.indexed_files().len(),
            symbols: self.entries.iter().map(|e| e.symbols.len()).sum(),
            distinct_names: self.by_name.len(),
            occurrences: self
                .entries
                .iter()
                .flat_map(|e| e.occurrences.values())
                .map(Vec::len)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;

    fn func(name: &str, path: &str, start: u32, end: u32) -> Symbol {
        let mut sym = Symbol::new(name, SymbolKind::Function, path, start);
        sym.end_line = end;
        sym
    }

    fn entry(path: &str, content: &str, symbols: Vec<Symbol>) -> FileEntry {
        FileEntry::scan(path, content, symbols, &AnalyzerConfig::default())
    }

    #[test]
    fn test_content_hash_is_hex_sha256() {
        let hash = content_hash("package main\n");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash("package main\n"));
        assert_ne!(hash, content_hash("package main"));
    }

    #[test]
    fn test_scan_skips_comments_and_dedups_lines() {
        let e = entry(
            "a.go",
            "x := Load(Load)\n// Load is documented\n  # Load\ny := Load\n",
            Vec::new(),
        );
        assert_eq!(e.token_lines("Load"), &[1, 4]);
        assert_eq!(e.lines.get(&4).map(String::as_str), Some("y := Load"));
        assert!(e.token_lines("documented").is_empty());
    }

    #[test]
    fn test_tokens_respect_word_boundaries() {
        let e = entry("a.go", "GetUserByID(id)\nsvc.GetUser(id)\nx2GetUser()\n", Vec::new());
        assert_eq!(e.token_lines("GetUser"), &[2]);
    }

    #[test]
    fn test_references_exclude_definition_sites() {
        let mut index = SymbolIndex::new();
        let def = "func Load() {}\nfunc run() { Load() }\n";
        index.insert(
            entry("a.go", def, vec![func("Load", "a.go", 1, 1), func("run", "a.go", 2, 2)]),
            ReindexPolicy::Replace,
        );
        index.insert(entry("b.go", "v := Load()\n", Vec::new()), ReindexPolicy::Replace);

        let refs = index.references("Load");
        let sites: Vec<(&str, u32)> = refs.iter().map(|r| (r.file_path.as_str(), r.line)).collect();
        assert_eq!(sites, vec![("a.go", 2), ("b.go", 1)]);
        assert_eq!(refs[1].context, "v := Load()");
    }

    #[test]
    fn test_references_do_not_depend_on_indexing_order() {
        let mut index = SymbolIndex::new();
        index.insert(entry("b.go", "v := Load()\n", Vec::new()), ReindexPolicy::Replace);
        assert!(index.references("Load").is_empty());
        index.insert(
            entry("a.go", "func Load() {}\n", vec![func("Load", "a.go", 1, 1)]),
            ReindexPolicy::Replace,
        );
        assert_eq!(index.references("Load").len(), 1);
    }

    #[test]
    fn test_replace_drops_previous_entry() {
        let mut index = SymbolIndex::new();
        let first = entry("a.go", "func Old() {}\n", vec![func("Old", "a.go", 1, 1)]);
        assert_eq!(index.insert(first, ReindexPolicy::Replace), IndexOutcome::Added);
        let second = entry("a.go", "func New() {}\n", vec![func("New", "a.go", 1, 1)]);
        assert_eq!(index.insert(second, ReindexPolicy::Replace), IndexOutcome::Replaced);

        assert!(!index.is_known("Old"));
        assert!(index.is_known("New"));
        assert_eq!(index.symbols_in_file("a.go").len(), 1);
        assert_eq!(index.indexed_files(), vec!["a.go"]);
    }

    #[test]
    fn test_replace_keeps_later_entries_resolvable() {
        let mut index = SymbolIndex::new();
        index.insert(
            entry("a.go", "func Old() {}\nHelper()\n", vec![func("Old", "a.go", 1, 1)]),
            ReindexPolicy::Replace,
        );
        index.insert(
            entry("b.go", "func Helper() {}\nOld()\n", vec![func("Helper", "b.go", 1, 1)]),
            ReindexPolicy::Replace,
        );
        index.insert(
            entry("a.go", "func New() {}\nHelper()\n", vec![func("New", "a.go", 1, 1)]),
            ReindexPolicy::Replace,
        );

        assert!(index.find_symbol("Old").is_empty());
        assert!(index.references("Old").is_empty());
        let helper = index.find_symbol("Helper");
        assert_eq!(helper.len(), 1);
        assert_eq!(helper[0].file_path, "b.go");
        let refs = index.references("Helper");
        let sites: Vec<(&str, u32)> = refs.iter().map(|r| (r.file_path.as_str(), r.line)).collect();
        assert_eq!(sites, vec![("a.go", 2)]);
        assert_eq!(index.find_symbol("New")[0].file_path, "a.go");
        assert_eq!(index.indexed_files(), vec!["b.go", "a.go"]);
    }

    #[test]
    fn test_replace_with_same_content_is_unchanged() {
        let mut index = SymbolIndex::new();
        let source = "func Old() {}\n";
        index.insert(entry("a.go", source, vec![func("Old", "a.go", 1, 1)]), ReindexPolicy::Replace);
        let again = entry("a.go", source, vec![func("Old", "a.go", 1, 1)]);
        assert_eq!(index.insert(again, ReindexPolicy::Replace), IndexOutcome::Unchanged);
        assert_eq!(index.stats().symbols, 1);
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let mut index = SymbolIndex::new();
        let source = "func Old() {}\nOld()\n";
        index.insert(entry("a.go", source, vec![func("Old", "a.go", 1, 1)]), ReindexPolicy::Append);
        let again = entry("a.go", source, vec![func("Old", "a.go", 1, 1)]);
        assert_eq!(index.insert(again, ReindexPolicy::Append), IndexOutcome::Appended);

        assert_eq!(index.symbols_in_file("a.go").len(), 2);
        assert_eq!(index.find_symbol("Old").len(), 2);
        assert_eq!(index.references("Old").len(), 2);
        let stats = index.stats();
        assert_eq!((stats.files, stats.symbols, stats.distinct_names), (1, 2, 1));
    }

    #[test]
    fn test_enclosing_symbol_is_innermost() {
        let mut index = SymbolIndex::new();
        let mut class = Symbol::new("Svc", SymbolKind::Class, "svc.ts", 1);
        class.end_line = 10;
        let mut method = Symbol::new("run", SymbolKind::Method, "svc.ts", 3);
        method.end_line = 6;
        index.insert(entry("svc.ts", "", vec![class, method]), ReindexPolicy::Replace);

        assert_eq!(index.enclosing_symbol("svc.ts", 4).map(|s| s.name.as_str()), Some("run"));
        assert_eq!(index.enclosing_symbol("svc.ts", 8).map(|s| s.name.as_str()), Some("Svc"));
        assert!(index.enclosing_symbol("svc.ts", 12).is_none());
        assert!(index.enclosing_symbol("other.ts", 4).is_none());
    }

    #[test]
    fn test_dependents() {
        let mut index = SymbolIndex::new();
        index.insert(
            entry("user.go", "func GetUser() {}\n", vec![func("GetUser", "user.go", 1, 1)]),
            ReindexPolicy::Replace,
        );
        index.insert(entry("z.go", "GetUser()\n", Vec::new()), ReindexPolicy::Replace);
        index.insert(entry("a.go", "GetUser()\nGetUser()\n", Vec::new()), ReindexPolicy::Replace);
        index.insert(entry("b.go", "nothing here\n", Vec::new()), ReindexPolicy::Replace);

        assert_eq!(index.dependents("user.go"), vec!["a.go", "z.go"]);
        assert!(index.dependents("b.go").is_empty());
    }
}
