//! Cross-file impact analysis.
//!
//! An [`ImpactAnalyzer`] session accumulates an index of every file handed
//! to it. Analyzing a change to one file then looks up, for each changed
//! symbol, where the rest of the indexed codebase uses that name.

pub mod analyzer;
pub mod format;
pub mod graph;
pub mod index;

pub use analyzer::ImpactAnalyzer;
pub use format::format_impact_report;
pub use graph::{DependencyGraph, FileCluster, SymbolEdge};
pub use index::IndexStats;

use crate::symbols::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One line outside a symbol's definition that mentions its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub file_path: String,
    /// 1-based.
    pub line: u32,
    /// The trimmed source line.
    pub context: String,
}

/// Impact scale. Unrelated to [`crate::breaking::ChangeSeverity`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ImpactSeverity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ImpactSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The consequence of one changed symbol across the indexed files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub changed_symbol: Symbol,
    /// Files holding references, excluding the symbol's own file.
    pub affected_files: Vec<String>,
    /// Innermost indexed declarations enclosing those references.
    pub affected_symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
    pub severity: ImpactSeverity,
    pub description: String,
}

/// Every changed symbol of one file and what it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImpact {
    pub file_path: String,
    pub changed_symbols: Vec<Symbol>,
    pub impacts: Vec<Impact>,
    pub total_references: usize,
    /// Deduplicated, never contains `file_path` itself.
    pub affected_files: Vec<String>,
    pub overall_severity: ImpactSeverity,
}

impl FileImpact {
    /// Aggregate per-symbol impacts. The overall severity is the highest
    /// one present, or `low` when nothing changed.
    pub fn from_impacts(file_path: &str, impacts: Vec<Impact>) -> Self {
        let mut affected_files: Vec<String> = Vec::new();
        for file in impacts.iter().flat_map(|impact| &impact.affected_files) {
            if file != file_path && !affected_files.contains(file) {
                affected_files.push(file.clone());
            }
        }

        Self {
            file_path: file_path.to_owned(),
            changed_symbols: impacts.iter().map(|i| i.changed_symbol.clone()).collect(),
            total_references: impacts.iter().map(|i| i.references.len()).sum(),
            overall_severity: impacts.iter().map(|i| i.severity).max().unwrap_or_default(),
            affected_files,
            impacts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.impacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;

    fn impact(name: &str, severity: ImpactSeverity, files: &[&str], refs: usize) -> Impact {
        Impact {
            changed_symbol: Symbol::new(name, SymbolKind::Function, "user.go", 1),
            affected_files: files.iter().map(|f| (*f).to_owned()).collect(),
            affected_symbols: Vec::new(),
            references: (0..refs)
                .map(|i| Reference {
                    file_path: "handler.go".to_owned(),
                    line: i as u32 + 1,
                    context: String::new(),
                })
                .collect(),
            severity,
            description: String::new(),
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(ImpactSeverity::Low < ImpactSeverity::Medium);
        assert!(ImpactSeverity::Medium < ImpactSeverity::High);
        assert!(ImpactSeverity::High < ImpactSeverity::Critical);
        assert_eq!(serde_json::to_string(&ImpactSeverity::High).unwrap(), "\"high\"");
    }

    #[test]
    fn test_empty_file_impact_is_low() {
        let file_impact = FileImpact::from_impacts("user.go", Vec::new());
        assert!(file_impact.is_empty());
        assert_eq!(file_impact.overall_severity, ImpactSeverity::Low);
        assert_eq!(file_impact.total_references, 0);
    }

    #[test]
    fn test_aggregation() {
        let file_impact = FileImpact::from_impacts(
            "user.go",
            vec![
                impact("A", ImpactSeverity::Medium, &["handler.go", "api.go"], 2),
                impact("B", ImpactSeverity::Critical, &["api.go", "user.go"], 3),
                impact("C", ImpactSeverity::Low, &[], 0),
            ],
        );
        assert_eq!(file_impact.overall_severity, ImpactSeverity::Critical);
        assert_eq!(file_impact.total_references, 5);
        assert_eq!(file_impact.affected_files, vec!["handler.go", "api.go"]);
        let names: Vec<&str> = file_impact.changed_symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_file_impact_serialization() {
        let file_impact = FileImpact::from_impacts("user.go", vec![impact("A", ImpactSeverity::High, &[], 0)]);
        let json = serde_json::to_string(&file_impact).unwrap();
        assert!(json.contains("\"overallSeverity\":\"high\""));
        assert!(json.contains("\"changedSymbol\""));
        assert!(json.contains("\"totalReferences\":0"));
    }
}
