//! Stages a group's directories into its working folder and compresses the
//! whole folder into a single tar.gz artifact.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use log::{info, warn};
use tar::Builder;
use walkdir::WalkDir;

use crate::config::groups::BackupGroup;

/// Stages every usable directory of a group into its working folder. A path
/// that is missing, or that exists but is not a directory, is logged and
/// skipped; the group proceeds with whatever remains.
pub fn stage_group_directories(group: &BackupGroup, staging_root: &Path) -> Result<()> {
    for dir in &group.directories {
        if !dir.exists() {
            warn!(
                "group '{}': directory {} does not exist, skipping",
                group.identifier,
                dir.display()
            );
            continue;
        }
        if !dir.is_dir() {
            warn!(
                "group '{}': {} is not a directory, skipping",
                group.identifier,
                dir.display()
            );
            continue;
        }
        stage_directory(dir, staging_root)?;
    }
    Ok(())
}

/// Recursively copies `source` into `staging_root/<basename of source>`,
/// preserving file permissions and recreating symlinks.
pub fn stage_directory(source: &Path, staging_root: &Path) -> Result<PathBuf> {
    let base = source
        .file_name()
        .with_context(|| format!("directory path {} has no base name", source.display()))?;
    let dest_root = staging_root.join(base);
    if dest_root.exists() {
        // Two directories in one group sharing a base name land in the same
        // staging folder; colliding file names overwrite.
        warn!(
            "staging folder {} already exists, merging contents",
            dest_root.display()
        );
    }
    info!("staging {} into {}", source.display(), dest_root.display());

    for entry in WalkDir::new(source).follow_links(false) {
        let entry =
            entry.with_context(|| format!("failed to walk directory {}", source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("failed to relativize {}", entry.path().display()))?;
        let dest = dest_root.join(rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("failed to create {}", dest.display()))?;
            let metadata = entry
                .metadata()
                .with_context(|| format!("failed to stat {}", entry.path().display()))?;
            fs::set_permissions(&dest, metadata.permissions())
                .with_context(|| format!("failed to set permissions on {}", dest.display()))?;
        } else if file_type.is_file() {
            // fs::copy carries the source permissions over.
            fs::copy(entry.path(), &dest).with_context(|| {
                format!("failed to copy {} to {}", entry.path().display(), dest.display())
            })?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())
                .with_context(|| format!("failed to read link {}", entry.path().display()))?;
            std::os::unix::fs::symlink(&target, &dest).with_context(|| {
                format!("failed to recreate symlink {}", dest.display())
            })?;
        }
    }

    Ok(dest_root)
}

/// Creates a gzip-compressed tar archive of everything under `source_dir`.
/// Entry paths inside the archive are relative to `source_dir`.
pub fn create_tar_gz_archive(source_dir: &Path, archive_dest: &Path) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        anyhow::bail!(
            "source for archival is not a directory: {}",
            source_dir.display()
        );
    }
    info!(
        "archiving {} to {}",
        source_dir.display(),
        archive_dest.display()
    );

    let archive_file = File::create(archive_dest)
        .with_context(|| format!("failed to create archive file {}", archive_dest.display()))?;
    let encoder = GzEncoder::new(archive_file, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);

    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry =
            entry.with_context(|| format!("failed to walk {}", source_dir.display()))?;
        let path = entry.path();
        let name = path
            .strip_prefix(source_dir)
            .with_context(|| format!("failed to relativize {}", path.display()))?;
        if name.as_os_str().is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            builder
                .append_dir(name, path)
                .with_context(|| format!("failed to append directory {}", path.display()))?;
        } else {
            builder
                .append_path_with_name(path, name)
                .with_context(|| format!("failed to append {}", path.display()))?;
        }
    }

    builder
        .into_inner()
        .context("failed to finalize tar stream")?
        .finish()
        .context("failed to finish gzip stream")?;

    Ok(archive_dest.to_path_buf())
}
