//! `RemoteStateClient` over the developer-console REST API.

use reqwest::header::{ETAG, LOCATION};
use reqwest::{RequestBuilder, Response};
use url::Url;

use crate::build::BuildStatusSnapshot;
use crate::types::Stage;

use super::wire::{self, UploadTarget};
use super::{CertificationPage, JobRef, PackageStatus, RemoteError, RemoteFuture, RemoteStateClient};

const USER_AGENT: &str = concat!("skillsync/", env!("CARGO_PKG_VERSION"));

/// Resources requested from the skill status route for hosted deploys.
const HOSTED_RESOURCES: [&str; 3] = ["manifest", "interactionModel", "hostedSkillDeployment"];

/// HTTP client bound to one endpoint and one access token.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    http: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl HttpRemoteClient {
    pub fn new(endpoint: &str, token: impl Into<String>) -> Result<Self, RemoteError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RemoteError::Endpoint(format!("{}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(RemoteError::Endpoint(endpoint.to_string()));
        }

        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            endpoint,
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint URL with `segments` appended as escaped path segments.
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, RemoteError> {
        let response = send(self.authorized(self.http.get(url))).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn package_status(&self, skill_id: &str, stage: Stage) -> Result<PackageStatus, RemoteError> {
        let url = self.url(&["v1", "skills", skill_id, "stages", stage.as_str(), "manifest"])?;
        let response = send(self.authorized(self.http.get(url))).await?;
        let e_tag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(RemoteError::MissingHeader("ETag"))?;

        Ok(PackageStatus {
            e_tag: Some(e_tag),
            location: None,
        })
    }

    async fn export_job(&self, skill_id: &str, stage: Stage) -> Result<JobRef, RemoteError> {
        let url = self.url(&["v1", "skills", skill_id, "stages", stage.as_str(), "exports"])?;
        let response = send(self.authorized(self.http.post(url))).await?;
        let id = job_id(&response)?;
        tracing::debug!(skill_id, %stage, job = %id, "export job created");
        Ok(JobRef::Export { id })
    }

    async fn import_job(
        &self,
        skill_id: &str,
        stage: Stage,
        archive: Vec<u8>,
    ) -> Result<JobRef, RemoteError> {
        let url = self.url(&["v1", "skills", "uploads"])?;
        let response = send(self.authorized(self.http.post(url))).await?;
        let target: UploadTarget = serde_json::from_slice(&response.bytes().await?)?;

        // Upload URLs are pre-signed; they must not carry the access token.
        tracing::debug!(skill_id, bytes = archive.len(), "uploading package");
        send(self.http.put(&target.upload_url).body(archive)).await?;

        let url = self.url(&["v1", "skills", skill_id, "stages", stage.as_str(), "imports"])?;
        let body = serde_json::json!({ "location": target.upload_url });
        let response = send(self.authorized(self.http.post(url).json(&body))).await?;
        let id = job_id(&response)?;
        tracing::debug!(skill_id, %stage, job = %id, "import job created");
        Ok(JobRef::Import { id })
    }

    async fn job_status(&self, job: &JobRef) -> Result<BuildStatusSnapshot, RemoteError> {
        match job {
            JobRef::Import { id } => {
                let body = self.get_bytes(self.url(&["v1", "skills", "imports", id])?).await?;
                wire::job_snapshot(&body)
            }
            JobRef::Export { id } => {
                let body = self.get_bytes(self.url(&["v1", "skills", "exports", id])?).await?;
                wire::job_snapshot(&body)
            }
            JobRef::Hosted { skill_id, .. } => {
                let mut url = self.url(&["v1", "skills", skill_id, "status"])?;
                {
                    let mut query = url.query_pairs_mut();
                    for resource in HOSTED_RESOURCES {
                        query.append_pair("resource", resource);
                    }
                }
                let body = self.get_bytes(url).await?;
                wire::skill_status_snapshot(&body)
            }
        }
    }

    async fn certifications(
        &self,
        skill_id: &str,
        next_token: Option<&str>,
    ) -> Result<CertificationPage, RemoteError> {
        let mut url = self.url(&["v1", "skills", skill_id, "certifications"])?;
        if let Some(token) = next_token {
            url.query_pairs_mut().append_pair("nextToken", token);
        }
        let body = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn download(&self, location: &str) -> Result<Vec<u8>, RemoteError> {
        let response = send(self.http.get(location)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl RemoteStateClient for HttpRemoteClient {
    fn get_package_status<'a>(
        &'a self,
        skill_id: &'a str,
        stage: Stage,
    ) -> RemoteFuture<'a, PackageStatus> {
        Box::pin(self.package_status(skill_id, stage))
    }

    fn create_export_job<'a>(&'a self, skill_id: &'a str, stage: Stage) -> RemoteFuture<'a, JobRef> {
        Box::pin(self.export_job(skill_id, stage))
    }

    fn create_import_job<'a>(
        &'a self,
        skill_id: &'a str,
        stage: Stage,
        archive: Vec<u8>,
    ) -> RemoteFuture<'a, JobRef> {
        Box::pin(self.import_job(skill_id, stage, archive))
    }

    fn get_job_status<'a>(&'a self, job: &'a JobRef) -> RemoteFuture<'a, BuildStatusSnapshot> {
        Box::pin(self.job_status(job))
    }

    fn get_certifications<'a>(
        &'a self,
        skill_id: &'a str,
        next_token: Option<&'a str>,
    ) -> RemoteFuture<'a, CertificationPage> {
        Box::pin(self.certifications(skill_id, next_token))
    }

    fn download_package<'a>(&'a self, location: &'a str) -> RemoteFuture<'a, Vec<u8>> {
        Box::pin(self.download(location))
    }
}

/// Send a request, turning non-2xx responses into [`RemoteError::Status`].
async fn send(request: RequestBuilder) -> Result<Response, RemoteError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

fn job_id(response: &Response) -> Result<String, RemoteError> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(RemoteError::MissingHeader("Location"))?;
    id_from_location(location)
        .ok_or_else(|| RemoteError::Other(format!("no job id in Location header: {}", location)))
}

/// Last non-empty path segment of a job `Location` header.
fn id_from_location(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
