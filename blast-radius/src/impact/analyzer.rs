//! The analysis session: index files, then ask what a change touches.

use super::graph::{build_dependency_graph, DependencyGraph};
use super::index::{content_hash, FileEntry, IndexOutcome, IndexStats, SymbolIndex};
use super::{FileImpact, Impact, ImpactSeverity, Reference};
use crate::config::{AnalyzerConfig, ReindexPolicy};
use crate::error::Result;
use crate::symbols::diff::{diff_symbols, symbol_changed, SymbolDelta};
use crate::symbols::{extract_previous_symbols, extract_symbols, Symbol};
use parking_lot::RwLock;
use std::sync::Arc;

/// A cross-file analysis session.
///
/// Cloning is cheap and every clone shares the same index, so files can be
/// indexed from several threads. Extraction happens before the index lock
/// is taken; only the insert itself is serialized.
#[derive(Debug, Clone)]
pub struct ImpactAnalyzer {
    index: Arc<RwLock<SymbolIndex>>,
    config: Arc<AnalyzerConfig>,
}

impl Default for ImpactAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpactAnalyzer {
    pub fn new() -> Self {
        Self::from_parts(AnalyzerConfig::default())
    }

    /// Start a session with a custom configuration, rejecting invalid ones.
    pub fn with_config(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: AnalyzerConfig) -> Self {
        Self {
            index: Arc::new(RwLock::new(SymbolIndex::new())),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Add a file's symbols and identifier occurrences to the index.
    ///
    /// Files in unsupported languages contribute occurrences but no symbols.
    /// A parse failure leaves the index untouched.
    pub fn index_file(&self, file_path: &str, content: &str) -> Result<()> {
        let policy = self.config.reindex_policy;
        if policy == ReindexPolicy::Replace && self.index.read().has_content(file_path, &content_hash(content)) {
            log::trace!("[index_file] {file_path} unchanged, skipping");
            return Ok(());
        }

        let symbols = extract_symbols(content, file_path)?;
        let symbol_count = symbols.len();
        let entry = FileEntry::scan(file_path, content, symbols, &self.config);

        let outcome = self.index.write().insert(entry, policy);
        match outcome {
            IndexOutcome::Unchanged => log::trace!("[index_file] {file_path} unchanged, skipping"),
            _ => log::debug!("[index_file] {file_path}: {symbol_count} symbols ({outcome:?})"),
        }
        Ok(())
    }

    /// Classify every symbol of `file_path` as removed, modified or added and
    /// rate each against the references already indexed.
    ///
    /// The index is only read; analyzing a change does not index either
    /// revision.
    pub fn analyze_impact(&self, old_content: &str, new_content: &str, file_path: &str) -> Result<FileImpact> {
        let old_symbols = extract_previous_symbols(old_content, file_path)?;
        let new_symbols = extract_symbols(new_content, file_path)?;

        let index = self.index.read();
        let impacts: Vec<Impact> = diff_symbols(&old_symbols, &new_symbols)
            .into_iter()
            .filter_map(|delta| self.assess(&index, delta))
            .collect();
        drop(index);

        let file_impact = FileImpact::from_impacts(file_path, impacts);
        log::debug!(
            "[analyze_impact] {file_path}: {} changed symbols, {} references, overall {}",
            file_impact.changed_symbols.len(),
            file_impact.total_references,
            file_impact.overall_severity
        );
        Ok(file_impact)
    }

    /// Rate one delta, or `None` when a retained symbol did not change.
    fn assess(&self, index: &SymbolIndex, delta: SymbolDelta<'_>) -> Option<Impact> {
        let (symbol, severity, description) = match delta {
            SymbolDelta::Removed(sym) => {
                if sym.exported {
                    (
                        sym,
                        ImpactSeverity::Critical,
                        format!("Symbol '{}' was removed (was exported/public)", sym.name),
                    )
                } else {
                    (sym, ImpactSeverity::High, format!("Symbol '{}' was removed", sym.name))
                }
            }
            SymbolDelta::Added(sym) => (sym, ImpactSeverity::Low, format!("New symbol '{}' added", sym.name)),
            SymbolDelta::Retained { old, new } => {
                if !symbol_changed(old, new) {
                    return None;
                }
                let (severity, description) = rate_modification(old, new);
                (new, severity, description)
            }
        };

        let references = index.references(&symbol.name);
        let severity = self.escalate(severity, references.len());

        let mut affected_files: Vec<String> = Vec::new();
        let mut affected_symbols: Vec<Symbol> = Vec::new();
        for reference in references.iter().filter(|r| r.file_path != symbol.file_path) {
            if !affected_files.contains(&reference.file_path) {
                affected_files.push(reference.file_path.clone());
            }
            if let Some(enclosing) = index.enclosing_symbol(&reference.file_path, reference.line) {
                if !affected_symbols.contains(enclosing) {
                    affected_symbols.push(enclosing.clone());
                }
            }
        }

        Some(Impact {
            changed_symbol: symbol.clone(),
            affected_files,
            affected_symbols,
            references,
            severity,
            description,
        })
    }

    /// Widely used symbols are riskier to touch whatever the change was.
    fn escalate(&self, severity: ImpactSeverity, reference_count: usize) -> ImpactSeverity {
        if reference_count > self.config.critical_reference_threshold {
            ImpactSeverity::Critical
        } else if reference_count > self.config.high_reference_threshold && severity == ImpactSeverity::Medium {
            ImpactSeverity::High
        } else {
            severity
        }
    }

    /// References to a known symbol name across every indexed file.
    pub fn get_symbol_references(&self, name: &str) -> Vec<Reference> {
        self.index.read().references(name)
    }

    pub fn get_symbols_in_file(&self, file_path: &str) -> Vec<Symbol> {
        self.index.read().symbols_in_file(file_path)
    }

    /// Every indexed declaration with this name.
    pub fn find_symbol(&self, name: &str) -> Vec<Symbol> {
        self.index.read().find_symbol(name)
    }

    /// Files that reference something declared in `file_path`.
    pub fn get_dependents(&self, file_path: &str) -> Vec<String> {
        self.index.read().dependents(file_path)
    }

    pub fn indexed_files(&self) -> Vec<String> {
        self.index.read().indexed_files()
    }

    pub fn stats(&self) -> IndexStats {
        self.index.read().stats()
    }

    pub fn dependency_graph(&self) -> DependencyGraph {
        build_dependency_graph(&self.index.read())
    }

    /// End the session. Other clones keep the shared index alive.
    pub fn close(self) -> IndexStats {
        let stats = self.stats();
        log::debug!(
            "[close] Session ended with {} files, {} symbols",
            stats.files,
            stats.symbols
        );
        stats
    }
}

/// Base severity and description of a retained symbol that changed.
fn rate_modification(old: &Symbol, new: &Symbol) -> (ImpactSeverity, String) {
    let mut severity = ImpactSeverity::Medium;
    let mut changes = Vec::new();

    if old.signature != new.signature {
        changes.push("signature");
    }
    if old.parameters.len() != new.parameters.len() {
        changes.push("parameters");
        severity = ImpactSeverity::High;
    }
    if old.return_type != new.return_type {
        changes.push("return type");
        severity = ImpactSeverity::High;
    }
    if old.exported != new.exported {
        changes.push("visibility");
        if old.exported {
            severity = ImpactSeverity::Critical;
        }
    }

    let description = if changes.is_empty() {
        // Parameter contents changed without touching the signature text.
        format!("Symbol '{}' modified", new.name)
    } else {
        format!("Symbol '{}' modified: {}", new.name, changes.join(", "))
    };
    (severity, description)
}
