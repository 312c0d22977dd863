//! Markdown rendering of a file impact.

use super::{FileImpact, Impact};
use std::fmt::Write;

/// Render `impact` for a review comment. Individual references are listed
/// for a symbol only when there are at most `max_listed_references` of them.
pub fn format_impact_report(impact: &FileImpact, max_listed_references: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Impact Analysis for {}\n", impact.file_path);
    let _ = writeln!(
        out,
        "**Overall Severity:** {}",
        impact.overall_severity.as_str().to_uppercase()
    );
    let _ = writeln!(out, "**Changed Symbols:** {}", impact.changed_symbols.len());
    let _ = writeln!(out, "**Total References:** {}", impact.total_references);
    let _ = writeln!(out, "**Affected Files:** {}\n", impact.affected_files.len());

    if !impact.affected_files.is_empty() {
        out.push_str("### Affected Files\n\n");
        for file in &impact.affected_files {
            let _ = writeln!(out, "- `{file}`");
        }
        out.push('\n');
    }

    if !impact.impacts.is_empty() {
        out.push_str("### Symbol Changes\n\n");
        for symbol_impact in &impact.impacts {
            write_impact(&mut out, symbol_impact, max_listed_references);
        }
    }

    out
}

fn write_impact(out: &mut String, impact: &Impact, max_listed_references: usize) {
    let sym = &impact.changed_symbol;
    let _ = writeln!(out, "#### {} `{}`\n", sym.kind, sym.name);
    let _ = writeln!(out, "- **Severity:** {}", impact.severity);
    let _ = writeln!(out, "- **Description:** {}", impact.description);
    let _ = writeln!(out, "- **References:** {}", impact.references.len());

    if !impact.references.is_empty() && impact.references.len() <= max_listed_references {
        out.push_str("- **Used in:**\n");
        for reference in &impact.references {
            let _ = writeln!(out, "  - `{}:{}`: {}", reference.file_path, reference.line, reference.context);
        }
    }
    out.push('\n');
}
