//! Schema for `skillsync.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Stage;

/// Project settings loaded from `skillsync.toml`.
///
/// Every section is optional; a missing file yields [`Settings::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub project: ProjectSettings,

    #[serde(default)]
    pub git: GitSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub poller: PollerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSettings {
    /// Profile used when the caller does not name one.
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default)]
    pub stage: Stage,

    /// Skill package directory, relative to the project root.
    #[serde(default = "default_package_dir")]
    pub package_dir: PathBuf,

    /// Skill code directory, relative to the project root.
    #[serde(default = "default_code_dir")]
    pub code_dir: PathBuf,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            stage: Stage::default(),
            package_dir: default_package_dir(),
            code_dir: default_code_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitSettings {
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branches a hosted deploy may be pushed from.
    #[serde(default = "default_branches")]
    pub deployable_branches: Vec<String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            deployable_branches: default_branches(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSettings {
    /// Base URL of the developer-console API.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Retry budget for build status polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollerSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_package_dir() -> PathBuf {
    PathBuf::from("skill-package")
}

fn default_code_dir() -> PathBuf {
    PathBuf::from("lambda")
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branches() -> Vec<String> {
    vec!["dev".to_string(), "master".to_string()]
}

fn default_max_attempts() -> u32 {
    30
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_backoff_factor() -> f64 {
    1.2
}

fn default_max_delay_ms() -> u64 {
    25_000
}
