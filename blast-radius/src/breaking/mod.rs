//! Breaking-change detection between two revisions of one file.
//!
//! Only the public surface matters here: unexported symbols may change or
//! disappear freely, and additions are never breaking.

pub mod format;

pub use format::format_breaking_change_report;

use crate::error::Result;
use crate::symbols::diff::{diff_symbols, SymbolDelta};
use crate::symbols::{extract_previous_symbols, extract_symbols, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakingChangeType {
    Removal,
    SignatureChange,
    TypeChange,
    VisibilityChange,
    ParameterChange,
    ReturnTypeChange,
    RequiredParameter,
    BehaviorChange,
}

impl BreakingChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Removal => "removal",
            Self::SignatureChange => "signature_change",
            Self::TypeChange => "type_change",
            Self::VisibilityChange => "visibility_change",
            Self::ParameterChange => "parameter_change",
            Self::ReturnTypeChange => "return_type_change",
            Self::RequiredParameter => "required_parameter",
            Self::BehaviorChange => "behavior_change",
        }
    }

    fn is_parameter_change(self) -> bool {
        matches!(self, Self::ParameterChange | Self::RequiredParameter)
    }
}

impl fmt::Display for BreakingChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a single incompatibility. Ordered, so `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSeverity {
    Warning,
    Error,
    Critical,
}

impl ChangeSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Warnings are reported but never make a change breaking.
    pub fn is_breaking(self) -> bool {
        self >= Self::Error
    }
}

impl fmt::Display for ChangeSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingChange {
    #[serde(rename = "type")]
    pub change_type: BreakingChangeType,
    pub symbol: Symbol,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub old_value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_value: String,
    pub file_path: String,
    pub line: u32,
    pub severity: ChangeSeverity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl BreakingChange {
    fn new(
        change_type: BreakingChangeType,
        severity: ChangeSeverity,
        symbol: &Symbol,
        file_path: &str,
        description: String,
    ) -> Self {
        Self {
            change_type,
            symbol: symbol.clone(),
            old_value: String::new(),
            new_value: String::new(),
            file_path: file_path.to_owned(),
            line: symbol.start_line,
            severity,
            description,
            suggestion: None,
        }
    }

    fn values(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.old_value = old.into();
        self.new_value = new.into();
        self
    }

    fn suggest(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_owned());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingChangeReport {
    pub file_path: String,
    pub total_changes: usize,
    pub critical_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub changes: Vec<BreakingChange>,
    pub summary: String,
    pub has_breaking: bool,
}

impl BreakingChangeReport {
    /// Aggregate counts, the breaking flag and the summary from `changes`.
    pub fn from_changes(file_path: &str, changes: Vec<BreakingChange>) -> Self {
        let count = |severity| changes.iter().filter(|c| c.severity == severity).count();
        let critical_count = count(ChangeSeverity::Critical);
        let error_count = count(ChangeSeverity::Error);
        let warning_count = count(ChangeSeverity::Warning);
        let total_changes = changes.len();

        let summary = if total_changes == 0 {
            "No breaking changes detected".to_owned()
        } else {
            let parts: Vec<String> = [
                (critical_count, ChangeSeverity::Critical),
                (error_count, ChangeSeverity::Error),
                (warning_count, ChangeSeverity::Warning),
            ]
            .into_iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, severity)| format!("{n} {severity}"))
            .collect();
            format!("Found {total_changes} breaking changes: {}", parts.join(", "))
        };

        Self {
            file_path: file_path.to_owned(),
            total_changes,
            critical_count,
            error_count,
            warning_count,
            changes,
            summary,
            has_breaking: critical_count > 0 || error_count > 0,
        }
    }

    pub fn is_breaking(&self) -> bool {
        self.has_breaking
    }

    /// Critical and error changes only.
    pub fn breaking_changes(&self) -> Vec<&BreakingChange> {
        self.changes
            .iter()
            .filter(|c| c.severity.is_breaking())
            .collect()
    }
}

/// Compare two revisions of `file_path` and report API incompatibilities.
///
/// An old revision that fails to parse is treated as empty (the file most
/// likely did not exist); a new revision that fails to parse is an error.
pub fn detect_breaking_changes(
    old_source: &str,
    new_source: &str,
    file_path: &str,
) -> Result<BreakingChangeReport> {
    let old_symbols = extract_previous_symbols(old_source, file_path)?;
    let new_symbols = extract_symbols(new_source, file_path)?;

    let changes = compare_symbols(&old_symbols, &new_symbols, file_path);
    let report = BreakingChangeReport::from_changes(file_path, changes);
    log::debug!("[detect_breaking_changes] {file_path}: {}", report.summary);
    Ok(report)
}

/// Removals first, then per-symbol changes, each in old-source order.
fn compare_symbols(old_symbols: &[Symbol], new_symbols: &[Symbol], file_path: &str) -> Vec<BreakingChange> {
    let deltas = diff_symbols(old_symbols, new_symbols);
    let mut changes = Vec::new();

    for delta in &deltas {
        if let SymbolDelta::Removed(old) = *delta {
            if old.exported {
                changes.push(removal_change(old, new_symbols, file_path));
            }
        }
    }

    for delta in &deltas {
        if let SymbolDelta::Retained { old, new } = *delta {
            changes.extend(retained_changes(old, new, file_path));
        }
    }

    changes
}

/// A removed exported symbol, or a visibility downgrade if the new revision
/// has the same name in a different case.
fn removal_change(old: &Symbol, new_symbols: &[Symbol], file_path: &str) -> BreakingChange {
    let lowered = old.name.to_lowercase();
    let renamed = new_symbols
        .iter()
        .find(|new| new.kind == old.kind && new.name != old.name && new.name.to_lowercase() == lowered);

    match renamed {
        Some(new) => BreakingChange::new(
            BreakingChangeType::VisibilityChange,
            ChangeSeverity::Critical,
            new,
            file_path,
            format!(
                "{} '{}' changed from exported to unexported (renamed to '{}')",
                old.kind, old.name, new.name
            ),
        )
        .values("exported", "unexported")
        .suggest("This breaks all external callers; keep it exported or deprecate it first"),
        None => BreakingChange::new(
            BreakingChangeType::Removal,
            ChangeSeverity::Critical,
            old,
            file_path,
            format!("Exported {} '{}' was removed", old.kind, old.name),
        )
        .values(old.signature.clone(), "")
        .suggest("If the removal is intentional, deprecate first and update callers"),
    }
}

fn retained_changes(old: &Symbol, new: &Symbol, file_path: &str) -> Vec<BreakingChange> {
    if !old.exported && !new.exported {
        return Vec::new();
    }

    if old.exported && !new.exported {
        return vec![BreakingChange::new(
            BreakingChangeType::VisibilityChange,
            ChangeSeverity::Critical,
            new,
            file_path,
            format!("{} '{}' changed from exported to unexported", new.kind, new.name),
        )
        .values("exported", "unexported")
        .suggest("This breaks all external callers; keep it exported or deprecate it first")];
    }

    let mut changes = parameter_changes(old, new, file_path);

    if old.return_type != new.return_type && !old.return_type.is_empty() && !new.return_type.is_empty() {
        changes.push(
            BreakingChange::new(
                BreakingChangeType::ReturnTypeChange,
                ChangeSeverity::Error,
                new,
                file_path,
                format!(
                    "{} '{}' return type changed from '{}' to '{}'",
                    new.kind, new.name, old.return_type, new.return_type
                ),
            )
            .values(old.return_type.clone(), new.return_type.clone())
            .suggest("Check that callers still compile, or add a new function with the new return type"),
        );
    }

    let covered = changes
        .iter()
        .any(|c| c.change_type.is_parameter_change() || c.change_type == BreakingChangeType::ReturnTypeChange);
    if !covered && old.signature != new.signature && !old.signature.is_empty() && !new.signature.is_empty() {
        changes.push(
            BreakingChange::new(
                BreakingChangeType::SignatureChange,
                ChangeSeverity::Warning,
                new,
                file_path,
                format!("{} '{}' signature changed", new.kind, new.name),
            )
            .values(old.signature.clone(), new.signature.clone())
            .suggest("Review whether this affects callers"),
        );
    }

    changes
}

/// Count changes plus one entry per differing position in the shared range.
fn parameter_changes(old: &Symbol, new: &Symbol, file_path: &str) -> Vec<BreakingChange> {
    let old_params = &old.parameters;
    let new_params = &new.parameters;
    let count_values = || {
        (
            format!("{} parameters", old_params.len()),
            format!("{} parameters", new_params.len()),
        )
    };
    let mut changes = Vec::new();

    if new_params.len() > old_params.len() {
        let (from, to) = count_values();
        changes.push(
            BreakingChange::new(
                BreakingChangeType::RequiredParameter,
                ChangeSeverity::Error,
                new,
                file_path,
                format!(
                    "{} '{}' added {} required parameter(s)",
                    new.kind,
                    new.name,
                    new_params.len() - old_params.len()
                ),
            )
            .values(from, to)
            .suggest("Make new parameters optional or add a separate function"),
        );
    } else if new_params.len() < old_params.len() {
        let (from, to) = count_values();
        changes.push(
            BreakingChange::new(
                BreakingChangeType::ParameterChange,
                ChangeSeverity::Warning,
                new,
                file_path,
                format!(
                    "{} '{}' removed {} parameter(s)",
                    new.kind,
                    new.name,
                    old_params.len() - new_params.len()
                ),
            )
            .values(from, to)
            .suggest("Verify callers do not rely on the removed parameters"),
        );
    }

    for (idx, (before, after)) in old_params.iter().zip(new_params).enumerate() {
        if before != after {
            changes.push(
                BreakingChange::new(
                    BreakingChangeType::ParameterChange,
                    ChangeSeverity::Error,
                    new,
                    file_path,
                    format!(
                        "{} '{}' parameter {} changed from '{before}' to '{after}'",
                        new.kind,
                        new.name,
                        idx + 1
                    ),
                )
                .values(before.clone(), after.clone())
                .suggest("Check that existing call sites are still compatible"),
            );
        }
    }

    changes
}
