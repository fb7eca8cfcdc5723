//! Thin client around the rclone binary: one copy call per archive upload,
//! one delete call per cleanup target. Every invocation points rclone at the
//! run's rendered transport config.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use log::{debug, info};
use which::which;

use super::transport::TransportConfig;

/// Baseline upload tuning, always passed before any user-supplied flags.
const BASELINE_UPLOAD_FLAGS: &[&str] = &[
    "--s3-upload-concurrency",
    "4",
    "--s3-chunk-size",
    "16M",
    "--s3-no-check-bucket",
];

pub fn find_rclone() -> Result<PathBuf> {
    which("rclone").context(
        "rclone executable not found in PATH. Install rclone to enable S3 transfers.",
    )
}

/// Copies one local archive to its remote destination. Extra user flags are
/// appended verbatim after the baseline flag set.
pub fn upload_archive(
    rclone: &Path,
    transport: &TransportConfig,
    archive: &Path,
    remote_dest: &str,
    extra_flags: &[String],
) -> Result<()> {
    info!("uploading {} to {}", archive.display(), remote_dest);
    let args = upload_args(transport.config_path(), archive, remote_dest, extra_flags);
    run_rclone(rclone, &args)
}

/// Deletes objects under one group's remote folder that are older than
/// `min_age_days`. With `dry_run` rclone only reports what it would remove.
pub fn delete_aged(
    rclone: &Path,
    transport: &TransportConfig,
    remote_dir: &str,
    min_age_days: u32,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        info!("[dry run] selecting objects older than {min_age_days}d under {remote_dir}/");
    } else {
        info!("deleting objects older than {min_age_days}d under {remote_dir}/");
    }
    let args = delete_args(transport.config_path(), remote_dir, min_age_days, dry_run);
    run_rclone(rclone, &args)
}

fn upload_args(
    config_path: &Path,
    archive: &Path,
    remote_dest: &str,
    extra_flags: &[String],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--config".into(),
        config_path.into(),
        "copyto".into(),
        archive.into(),
        remote_dest.into(),
    ];
    args.extend(BASELINE_UPLOAD_FLAGS.iter().map(OsString::from));
    args.extend(extra_flags.iter().map(OsString::from));
    args
}

fn delete_args(
    config_path: &Path,
    remote_dir: &str,
    min_age_days: u32,
    dry_run: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--config".into(),
        config_path.into(),
        "delete".into(),
        format!("{remote_dir}/").into(),
        "--min-age".into(),
        format!("{min_age_days}d").into(),
    ];
    if dry_run {
        args.push("--dry-run".into());
    }
    args
}

fn run_rclone(rclone: &Path, args: &[OsString]) -> Result<()> {
    debug!("running {} {:?}", rclone.display(), args);
    let output = Command::new(rclone)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute {}", rclone.display()))?;

    if !output.status.success() {
        anyhow::bail!(
            "rclone exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
