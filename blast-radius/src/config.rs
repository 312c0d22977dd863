//! Analyzer configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! yields the stock thresholds.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens to a file's previous index entries when it is indexed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReindexPolicy {
    /// Drop the file's old symbols and occurrences before inserting new ones.
    #[default]
    Replace,
    /// Keep everything ever indexed; the same path may contribute duplicates.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// A `medium` impact with more references than this becomes `high`.
    pub high_reference_threshold: usize,
    /// Any impact with more references than this becomes `critical`.
    pub critical_reference_threshold: usize,
    /// Lines starting with one of these (after trimming) are never scanned
    /// for references.
    pub comment_markers: Vec<String>,
    pub reindex_policy: ReindexPolicy,
    /// The impact report lists individual references only up to this count.
    pub max_listed_references: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            high_reference_threshold: 10,
            critical_reference_threshold: 50,
            comment_markers: vec!["//".to_owned(), "#".to_owned(), "/*".to_owned()],
            reindex_policy: ReindexPolicy::Replace,
            max_listed_references: 10,
        }
    }
}

impl AnalyzerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalyzerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::debug!("[AnalyzerConfig::load] Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.critical_reference_threshold <= self.high_reference_threshold {
            return Err(AnalysisError::config(format!(
                "criticalReferenceThreshold ({}) must be greater than highReferenceThreshold ({})",
                self.critical_reference_threshold, self.high_reference_threshold
            )));
        }
        if self.comment_markers.iter().any(String::is_empty) {
            return Err(AnalysisError::config("commentMarkers must not contain empty strings"));
        }
        Ok(())
    }

    /// Whether a trimmed source line is a comment under this config.
    pub fn is_comment_line(&self, trimmed: &str) -> bool {
        self.comment_markers
            .iter()
            .any(|marker| trimmed.starts_with(marker.as_str()))
    }
}
