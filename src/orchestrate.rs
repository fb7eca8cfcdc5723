//! Shared group-loop discipline for both flows: strictly sequential, in
//! configuration order, with per-group failure isolation. One bad group is
//! logged and skipped; the run still reports failure at the end so the
//! scheduler sees a non-zero exit.

use anyhow::Result;
use log::{error, info};

use crate::config::groups::BackupGroup;
use crate::errors::AppError;

/// Runs `per_group` over every group. Errors are recorded under the group's
/// identifier and never stop the loop; the result is `RunSummary` iff any
/// group failed, after all groups have been attempted.
pub fn run_groups<F>(task: &str, groups: &[BackupGroup], mut per_group: F) -> Result<()>
where
    F: FnMut(&BackupGroup) -> Result<()>,
{
    let total = groups.len();
    let mut failed = 0usize;
    for group in groups {
        info!("{task}: processing group '{}'", group.identifier);
        match per_group(group) {
            Ok(()) => info!("{task}: group '{}' done", group.identifier),
            Err(e) => {
                let err = AppError::Group {
                    identifier: group.identifier.clone(),
                    reason: format!("{e:#}"),
                };
                error!("{err}");
                failed += 1;
            }
        }
    }

    info!("{task} summary: {total} group(s), {failed} failed");
    if failed > 0 {
        return Err(AppError::RunSummary { total, failed }.into());
    }
    Ok(())
}
