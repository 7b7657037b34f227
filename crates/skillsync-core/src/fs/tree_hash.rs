//! Deterministic content digest of a skill package directory.
//!
//! Used as a staleness proxy for skills that are not tracked by version
//! control: the digest recorded at the last successful deploy is compared
//! against a fresh digest of the package directory.

use anyhow::Context;
use std::fs;
use std::path::Path;

/// Entries never included in the digest.
///
/// VCS metadata and OS droppings change without the package changing.
pub const IGNORED_ENTRIES: &[&str] = &[".git", ".DS_Store", "Thumbs.db"];

/// Compute the digest of a directory tree.
///
/// # Algorithm
/// - Recursive traversal, entries sorted by name at each level
/// - Directories contribute `relative_path || 0xFF`
/// - Files contribute `relative_path || 0x00 || content`
/// - Output: blake3 hex string (64 chars)
///
/// Entries listed in [`IGNORED_ENTRIES`] are skipped. Symlinks are rejected
/// because the packager would not follow them either.
///
/// # Example
/// ```no_run
/// use skillsync_core::fs::tree_hash::hash_tree;
/// use std::path::Path;
///
/// let digest = hash_tree(Path::new("skill-package"))?;
/// assert_eq!(digest.len(), 64);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn hash_tree(path: &Path) -> anyhow::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hash_dir_recursive(&mut hasher, path, "")?;
    Ok(hasher.finalize().to_hex().to_string())
}

pub(crate) fn is_ignored(name: &str) -> bool {
    IGNORED_ENTRIES.contains(&name)
}

fn hash_dir_recursive(hasher: &mut blake3::Hasher, dir: &Path, base: &str) -> anyhow::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read directory entries: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_ignored(&name) {
            continue;
        }
        let rel_path = if base.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", base, name)
        };

        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat file: {}", entry.path().display()))?;

        if ty.is_dir() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0xFF]);
            hash_dir_recursive(hasher, &entry.path(), &rel_path)?;
        } else if ty.is_file() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0x00]);
            let content = fs::read(entry.path())
                .with_context(|| format!("Failed to read file: {}", entry.path().display()))?;
            hasher.update(&content);
        } else if ty.is_symlink() {
            anyhow::bail!("Symlinks are not supported: {}", entry.path().display());
        } else {
            anyhow::bail!(
                "Unsupported filesystem entry type: {}",
                entry.path().display()
            );
        }
    }

    Ok(())
}
