//! Remote state client trait and the values it exchanges.
//!
//! `RemoteStateClient` is implemented over HTTP by [`super::HttpRemoteClient`].
//! The deploy engine only depends on the trait so it can be driven by mocks.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::build::BuildStatusSnapshot;
use crate::types::Stage;

use super::RemoteError;

pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// Current version of the remote skill package.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageStatus {
    pub e_tag: Option<String>,
    pub location: Option<String>,
}

/// Handle to an asynchronous backend operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobRef {
    /// Package import started by an upload.
    Import { id: String },
    /// Package export started by a refresh.
    Export { id: String },
    /// Build status of the skill itself. Status is keyed by skill; for a
    /// version-control push the commit id inside the status tells which push
    /// it belongs to. Also serves package-only builds.
    Hosted { skill_id: String, stage: Stage },
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobRef::Import { id } => write!(f, "import:{}", id),
            JobRef::Export { id } => write!(f, "export:{}", id),
            JobRef::Hosted { skill_id, stage } => write!(f, "hosted:{}@{}", skill_id, stage),
        }
    }
}

/// One certification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationSummary {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub skill_submission_timestamp: Option<String>,
}

/// One page of certification records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationPage {
    #[serde(default)]
    pub items: Vec<CertificationSummary>,
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Abstract client for the remote developer-console service.
pub trait RemoteStateClient: Send + Sync {
    fn get_package_status<'a>(
        &'a self,
        skill_id: &'a str,
        stage: Stage,
    ) -> RemoteFuture<'a, PackageStatus>;

    fn create_export_job<'a>(&'a self, skill_id: &'a str, stage: Stage)
    -> RemoteFuture<'a, JobRef>;

    /// Upload a packed skill package and start importing it.
    fn create_import_job<'a>(
        &'a self,
        skill_id: &'a str,
        stage: Stage,
        archive: Vec<u8>,
    ) -> RemoteFuture<'a, JobRef>;

    fn get_job_status<'a>(&'a self, job: &'a JobRef) -> RemoteFuture<'a, BuildStatusSnapshot>;

    fn get_certifications<'a>(
        &'a self,
        skill_id: &'a str,
        next_token: Option<&'a str>,
    ) -> RemoteFuture<'a, CertificationPage>;

    /// Fetch an exported package archive from its download location.
    fn download_package<'a>(&'a self, location: &'a str) -> RemoteFuture<'a, Vec<u8>>;
}
