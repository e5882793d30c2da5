use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};

/// the ref name used when config.toml does not set one
pub const DEFAULT_REF: &str = "main";

/// deflate level used when config.toml does not set one
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// repository configuration stored in config.toml
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// the single named pointer that commits advance
    #[serde(default = "default_ref")]
    pub ref_name: String,
    /// deflate compression level (0..=9)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
    /// glob patterns for worktree entries that are never committed
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_ref() -> String {
    DEFAULT_REF.to_string()
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// check value ranges that serde can't express
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(Error::InvalidConfig(format!(
                "compression_level must be 0..=9, got {}",
                self.compression_level
            )));
        }
        crate::refs::validate_ref_name(&self.ref_name)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        self.ignore_patterns()?;
        Ok(())
    }

    /// compile the ignore globs
    pub fn ignore_patterns(&self) -> Result<Vec<Pattern>> {
        self.ignore
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| Error::InvalidConfig(format!("bad ignore pattern {:?}: {}", p, e)))
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ref_name: default_ref(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            ignore: vec![],
        }
    }
}
