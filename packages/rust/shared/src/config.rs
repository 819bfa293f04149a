//! Application configuration for benchtree.
//!
//! User config lives at `~/.benchtree/benchtree.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BenchTreeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "benchtree.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".benchtree";

/// Directory names that only group results and never name an experiment.
pub const DEFAULT_STRUCTURAL_MARKERS: [&str; 3] = ["results", "symmetric", "asymmetric"];

/// Accepts names carrying a digit run, e.g. `berlin52`, `kroA100`, `inst_07`.
pub const DEFAULT_INSTANCE_PATTERN: &str = r"^(?P<name>[A-Za-z][A-Za-z_\-]*\d+[A-Za-z0-9_\-.]*)$";

// ---------------------------------------------------------------------------
// Config structs (matching benchtree.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Instance recognition and directory markers.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Directory traversal settings.
    #[serde(default)]
    pub scan: ScanPoliciesConfig,

    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Regexes tried in order against a directory name.
    #[serde(default = "default_instance_patterns")]
    pub instance_patterns: Vec<String>,

    /// Organizational directory names, compared case-insensitively.
    #[serde(default = "default_structural_markers")]
    pub structural_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            instance_patterns: default_instance_patterns(),
            structural_markers: default_structural_markers(),
        }
    }
}

fn default_instance_patterns() -> Vec<String> {
    vec![DEFAULT_INSTANCE_PATTERN.into()]
}
fn default_structural_markers() -> Vec<String> {
    DEFAULT_STRUCTURAL_MARKERS.iter().map(|m| m.to_string()).collect()
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPoliciesConfig {
    /// File name include patterns.
    #[serde(default = "default_include_patterns")]
    pub include_patterns: Vec<String>,

    /// File name exclude patterns.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Whether to follow symbolic links while walking.
    #[serde(default)]
    pub follow_links: bool,

    /// Maximum directory depth below the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Log and skip paths that cannot be classified instead of aborting.
    #[serde(default)]
    pub skip_unclassified: bool,
}

impl Default for ScanPoliciesConfig {
    fn default() -> Self {
        Self {
            include_patterns: default_include_patterns(),
            exclude_patterns: Vec::new(),
            follow_links: false,
            max_depth: None,
            skip_unclassified: false,
        }
    }
}

fn default_include_patterns() -> Vec<String> {
    vec![r"\.(txt|out|log|json)$".into()]
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File name of the catalog written into the output directory.
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_file: default_catalog_file(),
        }
    }
}

fn default_catalog_file() -> String {
    "catalog.json".into()
}

// ---------------------------------------------------------------------------
// Scan config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scan configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Instance-name regexes.
    pub instance_patterns: Vec<String>,
    /// Structural marker directory names.
    pub structural_markers: Vec<String>,
    /// File name include patterns.
    pub include_patterns: Vec<String>,
    /// File name exclude patterns.
    pub exclude_patterns: Vec<String>,
    /// Follow symbolic links.
    pub follow_links: bool,
    /// Maximum walk depth.
    pub max_depth: Option<usize>,
    /// Skip unclassifiable paths.
    pub skip_unclassified: bool,
    /// Catalog file name.
    pub catalog_file: String,
}

impl From<&AppConfig> for ScanConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            instance_patterns: config.classifier.instance_patterns.clone(),
            structural_markers: config.classifier.structural_markers.clone(),
            include_patterns: config.scan.include_patterns.clone(),
            exclude_patterns: config.scan.exclude_patterns.clone(),
            follow_links: config.scan.follow_links,
            max_depth: config.scan.max_depth,
            skip_unclassified: config.scan.skip_unclassified,
            catalog_file: config.output.catalog_file.clone(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Compile a list of regex sources, naming the offending one on failure.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| BenchTreeError::config(format!("invalid pattern '{p}': {e}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.benchtree/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BenchTreeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.benchtree/benchtree.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BenchTreeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        BenchTreeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BenchTreeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BenchTreeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BenchTreeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that every configured regex compiles and at least one instance pattern exists.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.classifier.instance_patterns.is_empty() {
        return Err(BenchTreeError::config(
            "classifier.instance_patterns must contain at least one pattern",
        ));
    }
    compile_patterns(&config.classifier.instance_patterns)?;
    compile_patterns(&config.scan.include_patterns)?;
    compile_patterns(&config.scan.exclude_patterns)?;
    if config.output.catalog_file.trim().is_empty() {
        return Err(BenchTreeError::config("output.catalog_file must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("instance_patterns"));
        assert!(toml_str.contains("symmetric"));
        assert!(toml_str.contains("catalog.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.classifier.structural_markers.len(), 3);
        assert_eq!(parsed.output.catalog_file, "catalog.json");
        assert!(!parsed.scan.skip_unclassified);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[scan]
skip_unclassified = true
max_depth = 6
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.scan.skip_unclassified);
        assert_eq!(config.scan.max_depth, Some(6));
        assert_eq!(config.classifier.instance_patterns, vec![DEFAULT_INSTANCE_PATTERN]);
    }

    #[test]
    fn scan_config_from_app_config() {
        let app = AppConfig::default();
        let scan = ScanConfig::from(&app);
        assert_eq!(scan.structural_markers, vec!["results", "symmetric", "asymmetric"]);
        assert!(!scan.follow_links);
        assert_eq!(scan.catalog_file, "catalog.json");
    }

    #[test]
    fn invalid_pattern_rejected() {
        let mut config = AppConfig::default();
        config.scan.exclude_patterns = vec!["(unclosed".into()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn empty_instance_patterns_rejected() {
        let mut config = AppConfig::default();
        config.classifier.instance_patterns.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn default_instance_pattern_shape() {
        let re = Regex::new(DEFAULT_INSTANCE_PATTERN).unwrap();
        assert!(re.is_match("berlin52"));
        assert!(re.is_match("kroA100"));
        assert!(re.is_match("inst_07"));
        assert!(!re.is_match("results"));
        assert!(!re.is_match("expA"));
    }
}
