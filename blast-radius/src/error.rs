use serde::Serialize;
use thiserror::Error;

/// Unified error type for symbol extraction and change analysis.
///
/// Serializable so that a caller rendering results for a review platform can
/// pass structured failures through unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AnalysisError {
    #[error("Parse error in {file} at {line}:{column}: {message}")]
    Parse {
        file: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("Grammar error for {language}: {message}")]
    Grammar { language: String, message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Create a Parse error pointing at a 1-based line and column
    pub fn parse(file: impl Into<String>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a Grammar error (the parser could not load a language)
    pub fn grammar(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Grammar {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Whether the failure is a syntax problem in the analyzed source.
    ///
    /// Callers use this to tell "the old revision did not exist / was broken"
    /// apart from environment problems.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

// Convert from std::io::Error
impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::io(err.to_string())
    }
}

// Convert from serde_json::Error (config loading)
impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::config(format!("JSON: {err}"))
    }
}
