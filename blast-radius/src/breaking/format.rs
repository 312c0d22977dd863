//! Markdown rendering of a breaking-change report for review comments.

use super::{BreakingChange, BreakingChangeReport, ChangeSeverity};
use std::fmt::Write;

/// Render a report grouped by severity. Empty when there is nothing worth
/// showing (no breaking changes and no warnings).
pub fn format_breaking_change_report(report: &BreakingChangeReport) -> String {
    if !report.has_breaking && report.warning_count == 0 {
        return String::new();
    }

    let mut out = String::new();
    out.push_str("## Breaking Change Analysis\n\n");
    let _ = writeln!(out, "**File:** `{}`", report.file_path);
    let _ = writeln!(out, "**Summary:** {}\n", report.summary);

    for (severity, heading) in [
        (ChangeSeverity::Critical, "Critical Breaking Changes"),
        (ChangeSeverity::Error, "Error-Level Breaking Changes"),
        (ChangeSeverity::Warning, "Warnings"),
    ] {
        let mut group = report.changes.iter().filter(|c| c.severity == severity).peekable();
        if group.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "### {heading}\n");
        for change in group {
            write_change(&mut out, change);
        }
    }

    out
}

fn write_change(out: &mut String, change: &BreakingChange) {
    let _ = writeln!(
        out,
        "**{}** `{}` (line {})",
        change.change_type, change.symbol.name, change.line
    );
    let _ = writeln!(out, "- {}", change.description);
    if !change.old_value.is_empty() && !change.new_value.is_empty() {
        let _ = writeln!(out, "- Changed: `{}` -> `{}`", change.old_value, change.new_value);
    }
    if let Some(suggestion) = &change.suggestion {
        let _ = writeln!(out, "- Suggestion: {suggestion}");
    }
    out.push('\n');
}
