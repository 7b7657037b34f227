//! JSON payloads of the remote service and their mapping onto
//! [`BuildStatusSnapshot`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::build::{BuildStatusSnapshot, SubStatus, SubStatusReport};

use super::RemoteError;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum WireStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl From<WireStatus> for SubStatus {
    fn from(status: WireStatus) -> Self {
        match status {
            WireStatus::InProgress => SubStatus::InProgress,
            WireStatus::Succeeded => SubStatus::Succeeded,
            WireStatus::Failed => SubStatus::Failed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
}

fn messages(errors: &[WireError]) -> Vec<String> {
    errors.iter().map(|e| e.message.clone()).collect()
}

// =============================================================================
// Import / export jobs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatusBody {
    status: WireStatus,
    #[serde(default)]
    errors: Vec<WireError>,
    #[serde(default)]
    skill: Option<JobSkill>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobSkill {
    #[serde(default)]
    e_tag: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    resources: Vec<JobResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResource {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    errors: Vec<WireError>,
}

/// Decode an import or export job status.
///
/// Job-level errors come first, then every resource's errors in order.
pub fn job_snapshot(body: &[u8]) -> Result<BuildStatusSnapshot, RemoteError> {
    let body: JobStatusBody = serde_json::from_slice(body)?;

    let mut errors = messages(&body.errors);
    let (e_tag, location) = match body.skill {
        Some(skill) => {
            for resource in &skill.resources {
                if !resource.errors.is_empty() {
                    tracing::debug!(
                        resource = resource.name.as_deref().unwrap_or("unknown"),
                        count = resource.errors.len(),
                        "resource reported errors"
                    );
                }
                errors.extend(messages(&resource.errors));
            }
            (skill.e_tag, skill.location)
        }
        None => (None, None),
    };

    Ok(BuildStatusSnapshot {
        job: SubStatusReport {
            status: body.status.into(),
            errors,
        },
        e_tag,
        location,
        ..Default::default()
    })
}

// =============================================================================
// Hosted skill build status
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkillStatusBody {
    #[serde(default)]
    manifest: Option<ResourceStatus>,
    #[serde(default)]
    interaction_model: BTreeMap<String, ResourceStatus>,
    #[serde(default)]
    hosted_skill_deployment: Option<ResourceStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceStatus {
    #[serde(default)]
    e_tag: Option<String>,
    #[serde(default)]
    last_update_request: Option<UpdateRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    status: WireStatus,
    #[serde(default)]
    errors: Vec<WireError>,
    #[serde(default)]
    deployment_details: Option<DeploymentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentDetails {
    #[serde(default)]
    commit_id: Option<String>,
}

fn report(resource: Option<&ResourceStatus>) -> SubStatusReport {
    match resource.and_then(|r| r.last_update_request.as_ref()) {
        Some(request) => SubStatusReport {
            status: request.status.into(),
            errors: messages(&request.errors),
        },
        None => SubStatusReport::default(),
    }
}

/// Decode the per-skill build status used for hosted deploys.
///
/// Interaction model statuses are reported per locale and merged.
pub fn skill_status_snapshot(body: &[u8]) -> Result<BuildStatusSnapshot, RemoteError> {
    let body: SkillStatusBody = serde_json::from_slice(body)?;

    let locales: Vec<SubStatusReport> = body
        .interaction_model
        .values()
        .map(|locale| report(Some(locale)))
        .collect();

    let commit_id = body
        .hosted_skill_deployment
        .as_ref()
        .and_then(|r| r.last_update_request.as_ref())
        .and_then(|req| req.deployment_details.as_ref())
        .and_then(|details| details.commit_id.clone());

    Ok(BuildStatusSnapshot {
        manifest: report(body.manifest.as_ref()),
        interaction_model: SubStatusReport::merge(&locales),
        hosted_deployment: report(body.hosted_skill_deployment.as_ref()),
        commit_id,
        e_tag: body.manifest.as_ref().and_then(|m| m.e_tag.clone()),
        ..Default::default()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadTarget {
    pub upload_url: String,
}
