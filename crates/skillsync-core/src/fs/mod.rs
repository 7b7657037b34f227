//! Filesystem primitives: package digest and zip packaging.
//!
//! The deploy engine only sees the [`DigestService`] and [`Packager`] seams;
//! [`TreeDigest`] and [`ZipPackager`] are the on-disk implementations.

pub mod archive;
pub mod tree_hash;

use std::path::Path;

pub use archive::{pack_dir, unpack_into};
pub use tree_hash::hash_tree;

/// Computes a deterministic content digest for a directory tree.
pub trait DigestService: Send + Sync {
    fn hash(&self, path: &Path) -> anyhow::Result<String>;
}

/// Packs a package directory into an uploadable archive and back.
pub trait Packager: Send + Sync {
    fn pack(&self, path: &Path) -> anyhow::Result<Vec<u8>>;

    fn unpack(&self, archive: &[u8], dest: &Path) -> anyhow::Result<()>;
}

/// blake3 tree digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeDigest;

impl DigestService for TreeDigest {
    fn hash(&self, path: &Path) -> anyhow::Result<String> {
        hash_tree(path)
    }
}

/// Zip archive packager.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackager;

impl Packager for ZipPackager {
    fn pack(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        pack_dir(path)
    }

    fn unpack(&self, archive: &[u8], dest: &Path) -> anyhow::Result<()> {
        unpack_into(archive, dest)
    }
}
