//! Lint rule definitions and configuration

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File names looked up next to the fragments, in order.
pub const CONFIG_FILE_NAMES: [&str; 3] = [
    ".interplay-lint.yaml",
    ".interplay-lint.yml",
    "interplay-lint.yaml",
];

/// A single structural lint rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintRule {
    /// Unique identifier for the rule
    pub id: String,
    /// Regular expression matched against each structure line
    pub pattern: String,
    /// Human-readable name of the typo, reported verbatim on rejection
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl LintRule {
    pub fn new(id: &str, pattern: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            description: description.to_string(),
            enabled: true,
        }
    }

    /// Compile the regex pattern
    pub fn compile(&self) -> Result<Regex> {
        Regex::new(&self.pattern).with_context(|| {
            format!(
                "Failed to compile regex for lint rule '{}': {}",
                self.id, self.pattern
            )
        })
    }
}

/// Lint rule customization.
///
/// ```yaml
/// # .interplay-lint.yaml
/// use_default_rules: true
/// disabled_rules:
///   - attr-src-typo
/// rules:
///   - id: legacy-center
///     pattern: "(?i)<center\\b"
///     description: "obsolete <center> element"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LintRulesConfig {
    #[serde(default)]
    pub rules: Vec<LintRule>,
    /// Rule ids to drop from the default set
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    /// Whether to use default rules (default: true)
    #[serde(default = "default_use_defaults")]
    pub use_default_rules: bool,
}

fn default_use_defaults() -> bool {
    true
}

impl LintRulesConfig {
    /// Load rules configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read lint rules: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse lint rules: {}", path.display()))
    }

    /// Explicit path first, then the well-known names under `dir`.
    pub fn load_or_default(explicit: Option<&Path>, dir: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("{:#}; falling back to default lint rules", e),
            }
        }
        if let Some(dir) = dir {
            for name in CONFIG_FILE_NAMES {
                let config_path = dir.join(name);
                if config_path.exists() {
                    if let Ok(config) = Self::load_from_file(&config_path) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }
}
