//! TOML parser with helpful error messages

use super::schema::Settings;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse skillsync.toml with detailed error messages
pub fn parse_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    parse_settings_str(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))
}

/// Parse skillsync.toml content from string
pub fn parse_settings_str(content: &str) -> Result<Settings> {
    let settings: Settings =
        toml::from_str(content).map_err(|e| anyhow::anyhow!("TOML parsing error: {}", e))?;

    validate_settings(&settings)?;

    Ok(settings)
}

pub fn to_toml(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to serialize settings to TOML")
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.project.profile.trim().is_empty() {
        anyhow::bail!("project.profile must not be empty");
    }
    if settings.git.deployable_branches.is_empty() {
        anyhow::bail!("git.deployable_branches must name at least one branch");
    }

    if let Some(endpoint) = &settings.remote.endpoint {
        let parsed = url::Url::parse(endpoint)
            .with_context(|| format!("remote.endpoint is not a valid URL: {}", endpoint))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("remote.endpoint must use http or https: {}", endpoint);
        }
    }

    let poller = &settings.poller;
    if poller.max_attempts == 0 {
        anyhow::bail!("poller.max_attempts must be at least 1");
    }
    if poller.backoff_factor.is_nan() || poller.backoff_factor < 1.0 {
        anyhow::bail!(
            "poller.backoff_factor must be >= 1.0, got {}",
            poller.backoff_factor
        );
    }
    if poller.max_delay_ms < poller.initial_delay_ms {
        anyhow::bail!("poller.max_delay_ms must not be below poller.initial_delay_ms");
    }

    Ok(())
}
