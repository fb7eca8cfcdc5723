//! Retention cleanup: re-derives each group's identifier through the same
//! parser the backup flow used and deletes aged archives under the matching
//! remote folder. No other state is shared with the backup run.

use anyhow::Result;
use log::info;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::orchestrate::run_groups;
use crate::storage::rclone;
use crate::storage::transport::TransportConfig;

pub fn perform_cleanup_orchestration(config: &AppConfig) -> Result<()> {
    let days = config
        .retention_days
        .ok_or_else(|| AppError::Config("NUMBER_OF_DAYS must be set for cleanup".to_string()))?;

    let transport = TransportConfig::render(&config.storage)?;
    let rclone_exe = rclone::find_rclone()?;

    if config.dry_run {
        info!("dry run: no objects will be deleted");
    }

    run_groups("cleanup", &config.groups, |group| {
        let remote_dir = transport.remote_dir(&group.identifier);
        rclone::delete_aged(&rclone_exe, &transport, &remote_dir, days, config.dry_run)
    })
}
