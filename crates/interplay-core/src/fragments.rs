//! The author's in-progress fragment set.
//!
//! Each fragment is independently optional; an empty string is treated the same
//! as an absent fragment by downstream consumers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File names used when a fragment set is stored as a directory.
pub const STRUCTURE_FILE: &str = "structure.html";
pub const STYLE_FILE: &str = "style.css";
pub const BEHAVIOR_FILE: &str = "behavior.js";
pub const SEED_DATA_FILE: &str = "seed.json";
pub const CONFIG_SCHEMA_FILE: &str = "config-schema.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentSet {
    #[serde(default)]
    pub structure: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub seed_data: Option<String>,
    #[serde(default)]
    pub config_schema: Option<String>,
}

impl FragmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structure(mut self, s: impl Into<String>) -> Self {
        self.structure = Some(s.into());
        self
    }

    pub fn with_style(mut self, s: impl Into<String>) -> Self {
        self.style = Some(s.into());
        self
    }

    pub fn with_behavior(mut self, s: impl Into<String>) -> Self {
        self.behavior = Some(s.into());
        self
    }

    pub fn with_seed_data(mut self, s: impl Into<String>) -> Self {
        self.seed_data = Some(s.into());
        self
    }

    pub fn with_config_schema(mut self, s: impl Into<String>) -> Self {
        self.config_schema = Some(s.into());
        self
    }

    pub fn structure(&self) -> &str {
        non_empty(&self.structure)
    }

    pub fn style(&self) -> &str {
        non_empty(&self.style)
    }

    pub fn behavior(&self) -> &str {
        non_empty(&self.behavior)
    }

    pub fn seed_data(&self) -> Option<&str> {
        self.seed_data.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn config_schema(&self) -> Option<&str> {
        self.config_schema.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Load fragments from a directory; missing files leave the fragment unset.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Fragment directory not found: {}", dir.display());
        }
        Ok(Self {
            structure: read_optional(dir, STRUCTURE_FILE)?,
            style: read_optional(dir, STYLE_FILE)?,
            behavior: read_optional(dir, BEHAVIOR_FILE)?,
            seed_data: read_optional(dir, SEED_DATA_FILE)?,
            config_schema: read_optional(dir, CONFIG_SCHEMA_FILE)?,
        })
    }
}

fn non_empty(fragment: &Option<String>) -> &str {
    fragment.as_deref().unwrap_or("")
}

fn read_optional(dir: &Path, name: &str) -> Result<Option<String>> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read fragment: {}", path.display()))?;
    Ok(Some(content))
}
