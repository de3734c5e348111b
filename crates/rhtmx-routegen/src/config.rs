// File: src/config.rs
// Purpose: Configuration parsing from routegen.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Route compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoutegenConfig {
    #[serde(default)]
    pub routes: RoutesConfig,

    #[serde(default)]
    pub nested: NestedConfig,
}

/// Where route files live and which files count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Directory containing server route files (default: "api")
    #[serde(default = "default_api_dir")]
    pub api_dir: String,

    /// Directory containing UI route files (default: "pages")
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,

    /// File extensions recognized as route files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// File naming for nested UI routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedConfig {
    /// File stem of a directory's own route (default: "index")
    #[serde(default = "default_index_stem")]
    pub index_stem: String,

    /// File stem of a wrapping shell for descendants (default: "layout")
    #[serde(default = "default_layout_stem")]
    pub layout_stem: String,
}

// Default values
fn default_api_dir() -> String {
    "api".to_string()
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["rs".to_string(), "rsx".to_string()]
}

fn default_index_stem() -> String {
    "index".to_string()
}

fn default_layout_stem() -> String {
    "layout".to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            api_dir: default_api_dir(),
            pages_dir: default_pages_dir(),
            extensions: default_extensions(),
        }
    }
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            index_stem: default_index_stem(),
            layout_stem: default_layout_stem(),
        }
    }
}

impl RoutesConfig {
    /// Whether a file name has one of the configured extensions
    pub fn is_route_file(&self, file: &Path) -> bool {
        file.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

impl RoutegenConfig {
    /// Load configuration from routegen.toml
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: RoutegenConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./routegen.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("routegen.toml")
    }
}
