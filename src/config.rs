//! Configuration loading
//!
//! `hireflow.toml` in the working directory (or a path given with
//! `--config`) overrides the defaults:
//!
//! ```toml
//! data_dir = ".pipeline"
//!
//! [layout]
//! base_height = 120.0
//! candidate_height = 56.0
//! stage_spacing = 48.0
//! column_offset = 280.0
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::graph::LayoutConfig;

pub const CONFIG_FILE: &str = "hireflow.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory for the JSON record stores.
    pub data_dir: PathBuf,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".pipeline"),
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from `hireflow.toml` in the current
    /// directory when present, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
