//! Zip packing and unpacking of skill package directories.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::tree_hash::is_ignored;

/// Pack a directory into an in-memory zip archive.
///
/// Entry names are relative to `dir` and use `/` separators. Entries are
/// added in sorted order so identical trees produce identical archives.
pub fn pack_dir(dir: &Path) -> anyhow::Result<Vec<u8>> {
    if !dir.is_dir() {
        anyhow::bail!("Package directory not found: {}", dir.display());
    }

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        add_dir_recursive(&mut zip, options, dir, "")?;
        zip.finish().context("Failed to finish package archive")?;
    }
    Ok(buf.into_inner())
}

fn add_dir_recursive<W: Write + std::io::Seek>(
    zip: &mut zip::ZipWriter<W>,
    options: zip::write::SimpleFileOptions,
    dir: &Path,
    base: &str,
) -> anyhow::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
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
        let rel = if base.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", base, name)
        };
        let path = entry.path();

        if path.is_dir() {
            zip.add_directory(format!("{}/", rel), options)
                .with_context(|| format!("Failed to add directory to archive: {}", rel))?;
            add_dir_recursive(zip, options, &path, &rel)?;
        } else {
            let content = std::fs::read(&path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            zip.start_file(rel.as_str(), options)
                .with_context(|| format!("Failed to add file to archive: {}", rel))?;
            zip.write_all(&content)
                .with_context(|| format!("Failed to write archive entry: {}", rel))?;
        }
    }
    Ok(())
}

/// Extract a zip archive into `dest`, replacing its previous contents.
///
/// Entries are written to a staging directory next to `dest`, which takes
/// the place of `dest` only once every entry has been extracted. A failure
/// leaves `dest` as it was. Entries whose names escape `dest` are skipped.
pub fn unpack_into(data: &[u8], dest: &Path) -> anyhow::Result<()> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).context("Failed to read package as zip archive")?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {}", parent.display()))?;
    }
    let staging = sibling(dest, "unpack")?;
    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear staging directory: {}", staging.display()))?;
    }
    if let Err(err) = extract_all(&mut archive, &staging) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(err);
    }

    if let Err(err) = swap_in(&staging, dest) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(err);
    }
    Ok(())
}

/// Hidden path in the same directory as `dest`, so renames stay on one
/// filesystem.
fn sibling(dest: &Path, tag: &str) -> anyhow::Result<PathBuf> {
    let name = dest
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid package directory: {}", dest.display()))?;
    Ok(dest.with_file_name(format!(
        ".{}.{}-{}",
        name.to_string_lossy(),
        tag,
        std::process::id()
    )))
}

fn extract_all(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, dest: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create package directory: {}", dest.display()))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("Failed to read zip entry {}", i))?;

        let Some(outpath) = file.enclosed_name().map(|p| dest.join(p)) else {
            continue;
        };

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)
                .with_context(|| format!("Failed to create directory: {}", outpath.display()))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read zip entry: {}", file.name()))?;
        std::fs::write(&outpath, &buffer)
            .with_context(|| format!("Failed to write file: {}", outpath.display()))?;
    }
    Ok(())
}

/// Move `staging` to `dest`, keeping the old `dest` aside until the move
/// has succeeded.
fn swap_in(staging: &Path, dest: &Path) -> anyhow::Result<()> {
    if !dest.exists() {
        return std::fs::rename(staging, dest)
            .with_context(|| format!("Failed to move package into place: {}", dest.display()));
    }

    let backup = sibling(dest, "previous")?;
    if backup.exists() {
        std::fs::remove_dir_all(&backup)
            .with_context(|| format!("Failed to clear backup directory: {}", backup.display()))?;
    }
    std::fs::rename(dest, &backup)
        .with_context(|| format!("Failed to move aside package directory: {}", dest.display()))?;
    if let Err(err) = std::fs::rename(staging, dest) {
        let _ = std::fs::rename(&backup, dest);
        return Err(err)
            .with_context(|| format!("Failed to move package into place: {}", dest.display()));
    }
    std::fs::remove_dir_all(&backup)
        .with_context(|| format!("Failed to remove previous package: {}", backup.display()))
}
