//! Shared core types threaded through every engine call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a skill on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Editable development stage.
    #[default]
    Development,
    /// Frozen copy submitted for certification.
    Certification,
    /// Published stage. Packages here cannot be overwritten by a deploy.
    Live,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Development => "development",
            Stage::Certification => "certification",
            Stage::Live => "live",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Stage::Live)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Stage::Development),
            "certification" => Ok(Stage::Certification),
            "live" => Ok(Stage::Live),
            other => anyhow::bail!("Unknown stage: {}", other),
        }
    }
}

/// Identifies the skill a deploy operates on.
///
/// Passed explicitly instead of read from ambient "current profile" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTarget {
    pub profile: String,
    pub skill_id: String,
    pub stage: Stage,
}

impl SkillTarget {
    pub fn new(profile: impl Into<String>, skill_id: impl Into<String>, stage: Stage) -> Self {
        Self {
            profile: profile.into(),
            skill_id: skill_id.into(),
            stage,
        }
    }
}
