//! Version markers and the project-state file that persists them.
//!
//! The file lives at `.skillsync/project-state.json` under the project root
//! and is keyed by profile:
//!
//! ```json
//! { "profiles": { "default": { "skillId": "...", "skillMetadata": { "eTag": "...", "lastDeployHash": "..." } } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATE_DIR: &str = ".skillsync";
pub const STATE_FILE: &str = "project-state.json";

/// What was last deployed for one (profile, skill) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMarkers {
    pub skill_id: String,
    pub remote_etag: Option<String>,
    pub last_deploy_digest: Option<String>,
    pub last_deployed_at: Option<DateTime<Utc>>,
}

impl VersionMarkers {
    pub fn new(skill_id: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            remote_etag: None,
            last_deploy_digest: None,
            last_deployed_at: None,
        }
    }
}

/// On-disk project state. Keys this crate does not know are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileState>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileState {
    pub skill_id: String,

    #[serde(default)]
    pub skill_metadata: SkillMetadata,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMetadata {
    #[serde(rename = "eTag", default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deploy_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed_at: Option<DateTime<Utc>>,
}

impl ProjectState {
    /// Markers recorded for `profile`, if they belong to `skill_id`.
    pub fn markers(&self, profile: &str, skill_id: &str) -> Option<VersionMarkers> {
        let entry = self.profiles.get(profile)?;
        if entry.skill_id != skill_id {
            return None;
        }
        Some(VersionMarkers {
            skill_id: entry.skill_id.clone(),
            remote_etag: entry.skill_metadata.e_tag.clone(),
            last_deploy_digest: entry.skill_metadata.last_deploy_hash.clone(),
            last_deployed_at: entry.skill_metadata.last_deployed_at,
        })
    }

    pub fn set_markers(&mut self, profile: &str, markers: &VersionMarkers) {
        let metadata = SkillMetadata {
            e_tag: markers.remote_etag.clone(),
            last_deploy_hash: markers.last_deploy_digest.clone(),
            last_deployed_at: markers.last_deployed_at,
        };
        match self.profiles.get_mut(profile) {
            Some(entry) => {
                entry.skill_id = markers.skill_id.clone();
                entry.skill_metadata = metadata;
            }
            None => {
                self.profiles.insert(
                    profile.to_string(),
                    ProfileState {
                        skill_id: markers.skill_id.clone(),
                        skill_metadata: metadata,
                        extra: BTreeMap::new(),
                    },
                );
            }
        }
    }
}

/// Loads and atomically saves the project-state file.
#[derive(Debug, Clone)]
pub struct ProjectStateStore {
    path: PathBuf,
}

impl ProjectStateStore {
    /// Store for the project rooted at `project_root`.
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            path: project_root.join(STATE_DIR).join(STATE_FILE),
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns an empty state when the file does not exist.
    pub fn load(&self) -> anyhow::Result<ProjectState> {
        if !self.path.exists() {
            return Ok(ProjectState::default());
        }
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read project state: {}", self.path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse project state: {}", self.path.display()))
    }

    /// Save atomically (tmp + rename).
    pub fn save(&self, state: &ProjectState) -> anyhow::Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Invalid project state path: {}", self.path.display()))?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;

        let bytes =
            serde_json::to_vec_pretty(state).context("Failed to serialize project state")?;
        let tmp_path = dir.join(format!("{}.{}.tmp", STATE_FILE, std::process::id()));

        // rename replaces an existing file in one step, so the previous state
        // stays readable until the new one is in place.
        let result = fs::write(&tmp_path, bytes)
            .with_context(|| format!("Failed to write tmp state: {}", tmp_path.display()))
            .and_then(|()| {
                fs::rename(&tmp_path, &self.path).with_context(|| {
                    format!("Failed to rename tmp state: {}", tmp_path.display())
                })
            });
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    pub fn markers(&self, profile: &str, skill_id: &str) -> anyhow::Result<Option<VersionMarkers>> {
        Ok(self.load()?.markers(profile, skill_id))
    }

    /// Replace the markers of one profile, leaving every other entry intact.
    pub fn commit(&self, profile: &str, markers: &VersionMarkers) -> anyhow::Result<()> {
        let mut state = self.load()?;
        state.set_markers(profile, markers);
        self.save(&state)
    }
}
