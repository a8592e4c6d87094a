//! Ingestion configuration
//!
//! Describes which experiment groups exist, which file pattern selects each
//! group's candidates, and how their contents are parsed. Loaded from JSON;
//! every field has a default matching the harness layout:
//!
//! ```json
//! {
//!   "families": [
//!     { "name": "independent", "variants": [
//!       { "name": "no_affinity",   "pattern": "independent_no_affinity_*.txt" },
//!       { "name": "cpu_affinity",  "pattern": "independent_cpu_aff_*.txt" },
//!       { "name": "numa_affinity", "pattern": "independent_numa_*.txt" }
//!     ] }
//!   ],
//!   "grammar": "csv",
//!   "block_marker": "Results (Throughput MT/s):",
//!   "year": 2025
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::parse::{Grammar, DEFAULT_BLOCK_MARKER};
use crate::timestamp::TimestampResolver;
use crate::{Error, Result};

/// Experiment families produced by the harness
pub const DEFAULT_FAMILIES: &[&str] = &["independent", "concurrent"];

/// One variant of a family and the file pattern selecting its runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Variant name (e.g., "`cpu_affinity`")
    pub name: String,
    /// File name pattern; `*` matches any run of characters, `?` one
    pub pattern: String,
}

impl VariantConfig {
    /// Create a variant
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// An experiment family and its variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    /// Family name (e.g., "independent")
    pub name: String,
    /// Variants of the family
    pub variants: Vec<VariantConfig>,
}

impl FamilyConfig {
    /// Family with the harness' three affinity variants
    #[must_use]
    pub fn standard(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variants: vec![
                VariantConfig::new("no_affinity", format!("{name}_no_affinity_*.txt")),
                VariantConfig::new("cpu_affinity", format!("{name}_cpu_aff_*.txt")),
                VariantConfig::new("numa_affinity", format!("{name}_numa_*.txt")),
            ],
        }
    }
}

/// Configuration of one ingestion pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Experiment families to load
    pub families: Vec<FamilyConfig>,
    /// Line grammar of the run files
    pub grammar: Grammar,
    /// Marker opening each appended result block (`None`: whole file)
    pub block_marker: Option<String>,
    /// Explicit year for file name timestamps (`None`: current year)
    pub year: Option<i32>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            families: DEFAULT_FAMILIES
                .iter()
                .map(|name| FamilyConfig::standard(name))
                .collect(),
            grammar: Grammar::Csv,
            block_marker: Some(DEFAULT_BLOCK_MARKER.to_string()),
            year: None,
        }
    }
}

impl IngestConfig {
    /// Parse a configuration from JSON text
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the configuration is invalid
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is malformed, or is invalid
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check names, patterns and the block marker
    ///
    /// # Errors
    /// Returns [`Error::Config`] on empty names or patterns, duplicate
    /// groups, patterns containing a path separator, or an empty marker
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for family in &self.families {
            if family.name.trim().is_empty() {
                return Err(Error::Config("family name must not be empty".to_string()));
            }
            for variant in &family.variants {
                if variant.name.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "variant name must not be empty (family '{}')",
                        family.name
                    )));
                }
                if variant.pattern.is_empty() {
                    return Err(Error::Config(format!(
                        "pattern must not be empty for {}/{}",
                        family.name, variant.name
                    )));
                }
                if variant.pattern.contains(['/', '\\']) {
                    return Err(Error::Config(format!(
                        "pattern '{}' must be a file name, not a path",
                        variant.pattern
                    )));
                }
                if !seen.insert((family.name.as_str(), variant.name.as_str())) {
                    return Err(Error::Config(format!(
                        "duplicate experiment group {}/{}",
                        family.name, variant.name
                    )));
                }
            }
        }

        if self.block_marker.as_deref() == Some("") {
            return Err(Error::Config(
                "block marker must not be empty (use null to parse whole files)".to_string(),
            ));
        }

        Ok(())
    }

    /// Timestamp resolver honoring [`year`](Self::year)
    #[must_use]
    pub fn resolver(&self) -> TimestampResolver {
        self.year
            .map_or_else(TimestampResolver::current_year, TimestampResolver::with_year)
    }
}

/// Compile a `*`/`?` file name pattern into an anchored regex
///
/// # Errors
/// Returns [`Error::Config`] if the resulting expression is rejected
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            _ => expr.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|e| Error::Config(format!("invalid pattern '{pattern}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groups() {
        let config = IngestConfig::default();
        assert_eq!(config.families.len(), 2);
        assert_eq!(config.families[0].variants.len(), 3);
        assert_eq!(config.families[1].variants[1].pattern, "concurrent_cpu_aff_*.txt");
        assert_eq!(config.block_marker.as_deref(), Some(DEFAULT_BLOCK_MARKER));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = IngestConfig::from_json_str(r#"{ "year": 2024 }"#).unwrap();
        assert_eq!(config.year, Some(2024));
        assert_eq!(config.grammar, Grammar::Csv);
        assert_eq!(config.families, IngestConfig::default().families);
        assert_eq!(config.resolver().year(), 2024);
    }

    #[test]
    fn test_null_marker_means_whole_file() {
        let config =
            IngestConfig::from_json_str(r#"{ "block_marker": null, "grammar": "counter" }"#)
                .unwrap();
        assert!(config.block_marker.is_none());
        assert_eq!(config.grammar, Grammar::Counter);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = IngestConfig::default();
        config.families[0].variants[0].pattern = "results/independent_*.txt".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = IngestConfig::default();
        config.families[0].variants[1].name = "no_affinity".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate experiment group"));

        let mut config = IngestConfig::default();
        config.block_marker = Some(String::new());
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.families[1].name = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = IngestConfig::from_json_str("{ families: ").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_compile_pattern() {
        let re = compile_pattern("independent_cpu_aff_*.txt").unwrap();
        assert!(re.is_match("independent_cpu_aff_03_04_185131.txt"));
        assert!(!re.is_match("independent_cpu_aff_03_04_185131.txt.bak"));
        assert!(!re.is_match("concurrent_cpu_aff_03_04_185131.txt"));
        assert!(!re.is_match("independent_cpu_affX03_04_185131_txt"));

        let re = compile_pattern("run_?.log").unwrap();
        assert!(re.is_match("run_1.log"));
        assert!(!re.is_match("run_12.log"));
    }
}
