//! Language dispatch for symbol extraction.

use super::{Language, Symbol};
use crate::error::Result;

/// Extracts symbols for one language.
///
/// Implementations hold no state, so a single instance is shared by every
/// caller and thread.
pub trait LanguageExtractor: Send + Sync {
    fn language(&self) -> Language;

    /// Extract symbols from `source`. Heuristic implementations never fail;
    /// parser-backed ones return `AnalysisError::Parse` on invalid syntax.
    fn extract(&self, source: &str, file_path: &str) -> Result<Vec<Symbol>>;
}

/// Get the extractor for a language, if its feature is compiled in.
pub fn extractor_for(language: Language) -> Option<&'static dyn LanguageExtractor> {
    match language {
        #[cfg(feature = "lang-go")]
        Language::Go => Some(&super::go::GoExtractor),
        #[cfg(feature = "lang-typescript")]
        Language::TypeScript => Some(&super::heuristic::typescript::TypeScriptExtractor::TYPESCRIPT),
        #[cfg(feature = "lang-typescript")]
        Language::JavaScript => Some(&super::heuristic::typescript::TypeScriptExtractor::JAVASCRIPT),
        #[cfg(feature = "lang-python")]
        Language::Python => Some(&super::heuristic::python::PythonExtractor),
        #[cfg(feature = "lang-rust")]
        Language::Rust => Some(&super::heuristic::rust_lang::RustExtractor),
        #[cfg(feature = "lang-java")]
        Language::Java => Some(&super::heuristic::java::JavaExtractor),
        #[allow(unreachable_patterns, reason = "arms vanish when language features are disabled")]
        _ => None,
    }
}

/// Extract symbols from a source file.
///
/// Unsupported extensions yield an empty list, never an error.
pub fn extract_symbols(source: &str, file_path: &str) -> Result<Vec<Symbol>> {
    let Some(extractor) = Language::from_path(file_path).and_then(extractor_for) else {
        log::trace!("[extract_symbols] No extractor for {file_path}");
        return Ok(Vec::new());
    };

    let symbols = extractor.extract(source, file_path)?;
    log::debug!(
        "[extract_symbols] {} symbols from {file_path} ({})",
        symbols.len(),
        extractor.language()
    );
    Ok(symbols)
}

/// Extract symbols from the previous revision of a file.
///
/// A parse failure here most likely means the file did not exist before, so
/// it yields an empty list instead of an error. Other failures propagate.
pub fn extract_previous_symbols(source: &str, file_path: &str) -> Result<Vec<Symbol>> {
    extract_symbols(source, file_path).or_else(|err| {
        if err.is_parse_failure() {
            log::warn!("[extract_previous_symbols] Old revision unparseable, treating as empty: {err}");
            Ok(Vec::new())
        } else {
            Err(err)
        }
    })
}

/// The language name for a file, or `""` when the extension is unsupported.
pub fn language_name(file_path: &str) -> &'static str {
    Language::from_path(file_path).map_or("", Language::name)
}
