//! Backup orchestration: each group runs through staging, dumping, archiving
//! and upload; the shared group loop keeps failures isolated per group.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use super::{archive, db_dump};
use crate::config::AppConfig;
use crate::config::groups::BackupGroup;
use crate::orchestrate::run_groups;
use crate::storage::rclone;
use crate::storage::transport::TransportConfig;

/// UTC instant with no colons, safe in file and object names.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H%M%SZ";

pub fn perform_backup_orchestration(config: &AppConfig) -> Result<()> {
    // Rendered once, shared read-only by every group, removed on drop.
    let transport = TransportConfig::render(&config.storage)?;
    let rclone_exe = rclone::find_rclone()?;
    let dump_exe = db_dump::find_dump_executable(config.driver)?;

    run_groups("backup", &config.groups, |group| {
        process_group(config, &transport, &rclone_exe, &dump_exe, group)
    })
}

/// Runs one group through staging, dumping, archiving and upload. The working
/// folder and the archive live in temp directories owned by this call, so
/// both are removed on success and on every failure path.
fn process_group(
    config: &AppConfig,
    transport: &TransportConfig,
    rclone_exe: &Path,
    dump_exe: &Path,
    group: &BackupGroup,
) -> Result<()> {
    // Taken once at the start of the group; names the archive.
    let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();

    let workdir = tempfile::Builder::new()
        .prefix(&format!("{}_", group.identifier))
        .tempdir()
        .context("failed to create group working folder")?;

    archive::stage_group_directories(group, workdir.path())?;

    for db in &group.databases {
        db_dump::dump_database(config.driver, dump_exe, db, workdir.path())?;
    }

    let archive_dir =
        tempfile::tempdir().context("failed to create archive output folder")?;
    let file_name = archive_file_name(&group.identifier, &timestamp);
    let archive_path = archive_dir.path().join(&file_name);
    archive::create_tar_gz_archive(workdir.path(), &archive_path)?;

    let remote_dest = transport.remote_object(&group.identifier, &file_name);
    rclone::upload_archive(
        rclone_exe,
        transport,
        &archive_path,
        &remote_dest,
        &config.extra_transport_flags,
    )
}

fn archive_file_name(identifier: &str, timestamp: &str) -> String {
    format!("{identifier}_backup_{timestamp}.tar.gz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn archive_name_embeds_identifier_and_timestamp() {
        assert_eq!(
            archive_file_name("appdb", "2024-05-01T120000Z"),
            "appdb_backup_2024-05-01T120000Z.tar.gz"
        );
    }

    #[test]
    fn timestamp_format_is_filesystem_safe() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap();
        let formatted = instant.format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(formatted, "2024-05-01T123456Z");
        assert!(!formatted.contains(':'));
    }
}
