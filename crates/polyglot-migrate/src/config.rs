//! Engine and per-request configuration
//!
//! Both structs are plain serde data with defaults for every field, so a
//! configuration file only needs to name what it changes:
//!
//! ```toml
//! workers = 4
//! source = "teradata"
//!
//! [options]
//! default_catalog = "main"
//! semi_structured = "string"
//!
//! [options.format]
//! pretty = true
//! ```

use crate::dialects::DialectType;
use crate::error::{Error, Result};
use crate::generator::FormatOptions;
use serde::{Deserialize, Serialize};

/// Target representation for semi-structured types (`VARIANT`, `SUPER`, `JSON`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemiStructuredMapping {
    /// Databricks `VARIANT`
    #[default]
    Variant,
    /// `STRING` holding JSON text; path access needs rewriting by hand
    String,
}

/// How datetime format strings are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormatPreference {
    /// Translate source patterns into Databricks patterns
    #[default]
    Translate,
    /// Keep the source pattern text and flag it
    Preserve,
}

/// Options for one transpilation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspileOptions {
    pub format: FormatOptions,
    pub semi_structured: SemiStructuredMapping,
    pub date_format: DateFormatPreference,
    /// Copy source comments in front of each emitted statement
    pub preserve_comments: bool,
    /// Treat unquoted identifiers as case-sensitive when resolving names
    pub case_sensitive: bool,
    pub default_catalog: Option<String>,
    pub default_schema: Option<String>,
    /// Skip re-parsing the output with the target grammar
    pub skip_validation: bool,
    /// Keep per-phase AST snapshots in the result
    pub snapshots: bool,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            format: FormatOptions::default(),
            semi_structured: SemiStructuredMapping::Variant,
            date_format: DateFormatPreference::Translate,
            preserve_comments: false,
            case_sensitive: false,
            default_catalog: None,
            default_schema: None,
            skip_validation: false,
            snapshots: false,
        }
    }
}

impl TranspileOptions {
    /// Stable text that changes whenever an option that affects output changes
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Source dialect used when a request does not name one
    pub source: Option<DialectType>,
    /// Worker threads for batch runs; 0 uses the available parallelism
    pub workers: usize,
    /// Entries kept in the result cache; 0 disables caching
    pub cache_capacity: usize,
    /// Where callers write [`Report::render_log`](crate::diagnostics::Report::render_log) output
    pub error_file: Option<String>,
    /// Defaults for every request
    pub options: TranspileOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source: None,
            workers: 0,
            cache_capacity: 256,
            error_file: None,
            options: TranspileOptions::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(format!("invalid engine configuration: {e}")))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Worker count after resolving 0 to the machine's parallelism
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::KeywordCase;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            workers = 4
            source = "tsql"

            [options]
            default_catalog = "main"
            semi_structured = "string"

            [options.format]
            keyword_case = "lower"
            "#,
        )
        .unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.source, Some(DialectType::SqlServer));
        assert_eq!(config.cache_capacity, 256);
        assert_eq!(config.options.default_catalog.as_deref(), Some("main"));
        assert_eq!(config.options.semi_structured, SemiStructuredMapping::String);
        assert_eq!(config.options.format.keyword_case, KeywordCase::Lower);
        assert!(!config.options.format.pretty);
        assert!(!config.options.skip_validation);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("workers = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_fingerprint_tracks_options() {
        let a = TranspileOptions::default();
        let mut b = TranspileOptions::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.format.pretty = true;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.options.default_schema = Some("analytics".into());
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
