//! Settings store for loading and saving skillsync.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{Settings, parser};

pub const SETTINGS_FILE: &str = "skillsync.toml";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings_path: PathBuf,
    project_root: PathBuf,
}

impl SettingsStore {
    /// Store rooted at the current working directory.
    pub fn from_current_dir() -> anyhow::Result<Self> {
        let project_root =
            std::env::current_dir().context("Could not determine current directory")?;
        Ok(Self::from_project_root(project_root))
    }

    pub fn from_project_root(project_root: PathBuf) -> Self {
        Self {
            settings_path: project_root.join(SETTINGS_FILE),
            project_root,
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn load(&self) -> anyhow::Result<Settings> {
        if !self.settings_path.exists() {
            return Ok(Settings::default());
        }
        parser::parse_settings(&self.settings_path)
    }

    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let content = parser::to_toml(settings)?;
        std::fs::write(&self.settings_path, content).with_context(|| {
            format!(
                "Failed to write settings file: {}",
                self.settings_path.display()
            )
        })?;
        Ok(())
    }
}
