//! Remote developer-console service: the client seam and its HTTP
//! implementation.

mod certifications;
mod client;
mod error;
mod http;
pub mod wire;

pub use certifications::collect_certifications;
pub use client::{
    CertificationPage, CertificationSummary, JobRef, PackageStatus, RemoteFuture,
    RemoteStateClient,
};
pub use error::RemoteError;
pub use http::HttpRemoteClient;
