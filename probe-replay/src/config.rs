//! Configuration loading and validation

use anyhow::{Context, Result};
use probe_dispatch::{EventCategory, LiteralType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Path to the analysis dynamic library (relative to the config file)
    pub library: PathBuf,
    pub name: Option<String>,
    /// Bind every conventional hook the library exports
    #[serde(default)]
    pub bind_defaults: bool,
}

/// Explicit hook names for one category
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingConfig {
    pub category: EventCategory,
    pub pre: Option<String>,
    pub post: Option<String>,
    pub literal_types: Option<Vec<LiteralType>>,
}

/// Registration requests the category taxonomy cannot express
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("category {0} has no pre callback")]
    NoPreCallback(EventCategory),

    #[error("category {0} has no post callback")]
    NoPostCallback(EventCategory),

    #[error("literal_types given for category {0}; only literal bindings accept a type filter")]
    UnexpectedLiteralTypes(EventCategory),

    #[error("category {0} is bound more than once")]
    DuplicateBinding(EventCategory),

    #[error("analysis library does not export hook `{hook}` bound for {category}")]
    MissingHook {
        category: EventCategory,
        hook: String,
    },
}

impl AppConfig {
    /// Check every binding against its category's callback shape
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for binding in &self.bindings {
            let category = binding.category;
            if !seen.insert(category) {
                return Err(ConfigError::DuplicateBinding(category));
            }
            let shape = category.shape();
            if binding.pre.is_some() && !shape.has_pre() {
                return Err(ConfigError::NoPreCallback(category));
            }
            if binding.post.is_some() && !shape.has_post() {
                return Err(ConfigError::NoPostCallback(category));
            }
            if binding.literal_types.is_some() && category != EventCategory::Literal {
                return Err(ConfigError::UnexpectedLiteralTypes(category));
            }
        }
        Ok(())
    }

    /// The explicit binding for a category, if any
    pub fn binding(&self, category: EventCategory) -> Option<&BindingConfig> {
        self.bindings.iter().find(|b| b.category == category)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    if config.analysis.library.is_relative() {
        if let Some(dir) = path.parent() {
            config.analysis.library = dir.join(&config.analysis.library);
        }
    }

    Ok(config)
}
