//! Blast radius - what a code change breaks, and where it lands.
//!
//! This crate provides:
//! - Symbol extraction per language (`symbols`)
//! - Breaking-change detection between two revisions of a file (`breaking`)
//! - A cross-file index for impact analysis (`impact`)
//! - Analyzer configuration (`config`)
//!
//! Feature flags:
//! - `lang-go`, `lang-typescript`, `lang-python`, `lang-rust`, `lang-java`:
//!   per-language extraction (all enabled by `lang-all`, the default)

pub mod breaking;
pub mod config;
pub mod error;
pub mod impact;
pub mod symbols;

// Re-export commonly used types
pub use breaking::{
    detect_breaking_changes, format_breaking_change_report, BreakingChange, BreakingChangeReport,
    BreakingChangeType, ChangeSeverity,
};
pub use config::{AnalyzerConfig, ReindexPolicy};
pub use error::{AnalysisError, Result};
pub use impact::{
    format_impact_report, FileImpact, Impact, ImpactAnalyzer, ImpactSeverity, IndexStats, Reference,
};
pub use symbols::{extract_symbols, language_name, Language, Symbol, SymbolKind};
