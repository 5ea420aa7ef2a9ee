//! Persistent optimizer settings, stored as pretty JSON.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stockcut_core::OptimizerConfig;

pub const DEFAULT_FILE: &str = "stockcut.json";

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored config, or defaults when nothing has been saved yet.
    pub fn load(&self) -> Result<OptimizerConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(OptimizerConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let config: OptimizerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &OptimizerConfig) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}
